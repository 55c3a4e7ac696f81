//! Approve-then-act sequencing against the in-memory chain.

use alloy::primitives::U256;
use std::time::Duration;

use kasplex_dapp::config::ApprovalPolicy;
use kasplex_dapp::contracts::ContractCall;
use kasplex_dapp::reads::ReadKey;
use kasplex_dapp::sequencer::{ApprovalRequirement, SequenceError, SequenceRequest, SequenceStage};

mod common;
use common::{fast_sequencer_config, tokens, Event, Harness};

fn swap_like_request(h: &Harness, amount: U256) -> SequenceRequest {
    let dex = h.config.contracts.dex;
    let token = h.token(0);
    SequenceRequest {
        flow: "swap",
        approvals: vec![ApprovalRequirement {
            token,
            spender: dex,
            amount,
        }],
        action: ContractCall::claim(dex),
        invalidates: vec![
            ReadKey::TokenBalance {
                token,
                owner: h.owner,
            },
            ReadKey::Allowance {
                token,
                owner: h.owner,
                spender: dex,
            },
        ],
    }
}

fn position(events: &[Event], wanted: &Event) -> usize {
    events
        .iter()
        .position(|e| e == wanted)
        .unwrap_or_else(|| panic!("{:?} not in {:?}", wanted, events))
}

#[tokio::test]
async fn test_sufficient_allowance_skips_approval() {
    let h = Harness::new();
    let dex = h.config.contracts.dex;
    h.chain.set_allowance(h.token(0), h.owner, dex, tokens(100));
    h.set_balance(h.token(0), h.owner, tokens(50));

    let outcome = h.sequencer().run(swap_like_request(&h, tokens(10))).await.unwrap();

    assert!(outcome.approval_txs.is_empty());
    assert_eq!(h.chain.submitted(), vec!["claim"]);
    assert_eq!(outcome.flow, "swap");
}

#[tokio::test]
async fn test_short_allowance_approves_before_action() {
    let h = Harness::new();
    h.set_balance(h.token(0), h.owner, tokens(50));

    let sequencer = h.sequencer();
    let outcome = sequencer.run(swap_like_request(&h, tokens(10))).await.unwrap();

    assert_eq!(h.chain.submitted(), vec!["approve", "claim"]);
    assert_eq!(outcome.approval_txs.len(), 1);
    assert_ne!(outcome.approval_txs[0], outcome.action_tx);

    let events = h.chain.events();
    let approval_receipt = position(&events, &Event::Receipt("approve"));
    let action_submit = position(&events, &Event::Submit("claim"));
    assert!(
        approval_receipt < action_submit,
        "action submitted before approval receipt: {:?}",
        events
    );
    assert_eq!(sequencer.stage(), SequenceStage::Idle);
}

#[tokio::test]
async fn test_unlimited_policy_approves_max() {
    let h = Harness::new();
    let dex = h.config.contracts.dex;
    h.set_balance(h.token(0), h.owner, tokens(50));

    h.sequencer().run(swap_like_request(&h, tokens(10))).await.unwrap();

    assert_eq!(h.chain.allowance(h.token(0), h.owner, dex), U256::MAX);
}

#[tokio::test]
async fn test_exact_policy_approves_required_amount() {
    let h = Harness::new();
    let dex = h.config.contracts.dex;
    h.set_balance(h.token(0), h.owner, tokens(50));

    let mut config = fast_sequencer_config();
    config.approval_policy = ApprovalPolicy::Exact;
    h.sequencer_with(config)
        .run(swap_like_request(&h, tokens(10)))
        .await
        .unwrap();

    assert_eq!(h.chain.allowance(h.token(0), h.owner, dex), tokens(10));
}

#[tokio::test]
async fn test_only_short_allowances_are_approved() {
    let h = Harness::new();
    let dex = h.config.contracts.dex;
    let (first, second) = (h.token(0), h.token(1));
    h.chain.set_allowance(first, h.owner, dex, tokens(5));

    let request = SequenceRequest {
        flow: "add_liquidity",
        approvals: vec![
            ApprovalRequirement {
                token: first,
                spender: dex,
                amount: tokens(5),
            },
            ApprovalRequirement {
                token: second,
                spender: dex,
                amount: tokens(7),
            },
        ],
        action: ContractCall::claim(dex),
        invalidates: vec![],
    };
    let outcome = h.sequencer().run(request).await.unwrap();

    let calls = h.chain.submitted_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].function, "approve");
    assert_eq!(calls[0].target, second);
    assert_eq!(outcome.approval_txs.len(), 1);
}

#[tokio::test]
async fn test_dependent_reads_reissued_after_success() {
    let h = Harness::new();
    h.set_balance(h.token(0), h.owner, tokens(50));
    let request = swap_like_request(&h, tokens(10));
    let dependents = request.invalidates.clone();

    let outcome = h.sequencer().run(request).await.unwrap();

    let events = h.chain.events();
    let action_receipt = position(&events, &Event::Receipt("claim"));
    for key in &dependents {
        assert!(
            events[action_receipt..].contains(&Event::Read(key.clone())),
            "{:?} not re-read after the action",
            key
        );
    }
    assert_eq!(outcome.refreshed_reads, dependents.len());

    let balance = h.ctx.reads.cached(&dependents[0]).unwrap();
    assert_eq!(balance.as_amount(), Some(tokens(50)));
}

#[tokio::test]
async fn test_failed_dependent_read_is_left_empty() {
    let h = Harness::new();
    // Balance read is not scripted, so it fails during the refresh.
    let request = swap_like_request(&h, tokens(10));
    let balance_key = request.invalidates[0].clone();

    let outcome = h.sequencer().run(request).await.unwrap();

    assert_eq!(outcome.refreshed_reads, 1);
    assert!(h.ctx.reads.cached(&balance_key).is_none());
}

#[tokio::test]
async fn test_approval_submission_error_resets_without_action() {
    let h = Harness::new();
    h.chain.fail_submit("approve");

    let sequencer = h.sequencer();
    let err = sequencer
        .run(swap_like_request(&h, tokens(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, SequenceError::Submission { function: "approve", .. }));
    assert_eq!(sequencer.stage(), SequenceStage::Idle);
    assert!(!sequencer.is_processing());
    assert!(h.chain.submitted().is_empty());
    assert!(!h.chain.events().contains(&Event::Submit("claim")));
}

#[tokio::test]
async fn test_approval_revert_resets_without_action() {
    let h = Harness::new();
    h.chain.revert("approve");

    let sequencer = h.sequencer();
    let err = sequencer
        .run(swap_like_request(&h, tokens(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, SequenceError::Reverted { function: "approve", .. }));
    assert_eq!(h.chain.submitted(), vec!["approve"]);
    assert_eq!(sequencer.stage(), SequenceStage::Idle);
}

#[tokio::test]
async fn test_action_receipt_error_resets() {
    let h = Harness::new();
    h.chain
        .set_allowance(h.token(0), h.owner, h.config.contracts.dex, U256::MAX);
    h.chain.fail_receipt("claim");

    let sequencer = h.sequencer();
    let err = sequencer
        .run(swap_like_request(&h, tokens(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, SequenceError::Receipt { function: "claim", .. }));
    assert_eq!(sequencer.stage(), SequenceStage::Idle);
    assert_eq!(h.chain.submitted(), vec!["claim"]);
}

#[tokio::test]
async fn test_sequencer_usable_after_failure() {
    let h = Harness::new();
    h.chain.fail_submit("approve");
    let sequencer = h.sequencer();
    assert!(sequencer.run(swap_like_request(&h, tokens(10))).await.is_err());

    h.chain
        .set_allowance(h.token(0), h.owner, h.config.contracts.dex, U256::MAX);
    let outcome = sequencer.run(swap_like_request(&h, tokens(10))).await.unwrap();
    assert!(outcome.approval_txs.is_empty());
}

#[tokio::test]
async fn test_allowance_read_error_counts_as_zero() {
    let h = Harness::new();
    h.chain.fail_reads("allowance");

    let outcome = h.sequencer().run(swap_like_request(&h, tokens(10))).await.unwrap();

    assert_eq!(outcome.approval_txs.len(), 1);
    assert_eq!(h.chain.submitted(), vec!["approve", "claim"]);
}

#[tokio::test]
async fn test_waits_for_lagging_allowance() {
    let h = Harness::new();
    h.chain.allowance_lag(30);

    h.sequencer().run(swap_like_request(&h, tokens(10))).await.unwrap();

    let events = h.chain.events();
    let approval_receipt = position(&events, &Event::Receipt("approve"));
    let action_submit = position(&events, &Event::Submit("claim"));
    let polls = events[approval_receipt..action_submit]
        .iter()
        .filter(|e| matches!(e, Event::Read(ReadKey::Allowance { .. })))
        .count();
    assert!(polls >= 2, "expected repeated allowance polls, got {:?}", events);
}

#[tokio::test]
async fn test_proceeds_after_allowance_poll_timeout() {
    let h = Harness::new();
    h.chain.ignore_approvals();

    let mut config = fast_sequencer_config();
    config.allowance_poll_timeout_ms = 20;
    let outcome = h
        .sequencer_with(config)
        .run(swap_like_request(&h, tokens(10)))
        .await
        .unwrap();

    assert_eq!(h.chain.submitted(), vec!["approve", "claim"]);
    assert_eq!(outcome.approval_txs.len(), 1);
}

#[tokio::test]
async fn test_not_connected_submits_nothing() {
    let h = Harness::new();
    h.session.disconnect();

    let sequencer = h.sequencer();
    let err = sequencer
        .run(swap_like_request(&h, tokens(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, SequenceError::NotConnected));
    assert!(h.chain.events().is_empty());
    assert_eq!(sequencer.stage(), SequenceStage::Idle);
}

#[tokio::test]
async fn test_second_run_rejected_while_processing() {
    let h = Harness::new();
    let gate = h.chain.gate_receipts();
    let sequencer = h.sequencer();
    let mut stages = sequencer.subscribe();

    let running = sequencer.clone();
    let request = swap_like_request(&h, tokens(10));
    let first = tokio::spawn(async move { running.run(request).await });

    stages
        .wait_for(|s| *s == SequenceStage::Approving)
        .await
        .unwrap();
    assert!(sequencer.is_processing());

    let err = sequencer
        .run(swap_like_request(&h, tokens(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, SequenceError::Busy));

    // approve receipt, then action receipt
    gate.notify_one();
    stages.wait_for(|s| *s == SequenceStage::Acting).await.unwrap();
    gate.notify_one();

    let outcome = tokio::time::timeout(Duration::from_secs(5), first)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome.approval_txs.len(), 1);
    assert_eq!(h.chain.submitted(), vec!["approve", "claim"]);
}

#[tokio::test]
async fn test_success_held_until_reset_delay() {
    let h = Harness::new();
    h.chain
        .set_allowance(h.token(0), h.owner, h.config.contracts.dex, U256::MAX);

    let mut config = fast_sequencer_config();
    config.success_reset_ms = 100;
    let sequencer = h.sequencer_with(config);
    let mut stages = sequencer.subscribe();

    let running = sequencer.clone();
    let request = swap_like_request(&h, tokens(10));
    let task = tokio::spawn(async move { running.run(request).await });

    stages
        .wait_for(|s| *s == SequenceStage::Success)
        .await
        .unwrap();
    assert!(!sequencer.is_processing());

    task.await.unwrap().unwrap();
    assert_eq!(sequencer.stage(), SequenceStage::Idle);
}

#[tokio::test]
async fn test_zero_approval_request_goes_straight_to_action() {
    let h = Harness::new();
    let request = SequenceRequest {
        flow: "claim",
        approvals: vec![],
        action: ContractCall::claim(h.config.contracts.faucet),
        invalidates: vec![ReadKey::LastClaim(h.owner)],
    };

    let outcome = h.sequencer().run(request).await.unwrap();

    assert_eq!(h.chain.submitted(), vec!["claim"]);
    assert!(!h
        .chain
        .events()
        .iter()
        .any(|e| matches!(e, Event::Read(ReadKey::Allowance { .. }))));
    assert!(outcome.approval_txs.is_empty());
    assert_eq!(outcome.block_number, 1);
}

#[tokio::test]
async fn test_old_reset_does_not_clobber_newer_run() {
    let h = Harness::new();
    h.chain
        .set_allowance(h.token(0), h.owner, h.config.contracts.dex, U256::MAX);

    let mut config = fast_sequencer_config();
    config.success_reset_ms = 200;
    let sequencer = h.sequencer_with(config);
    let mut stages = sequencer.subscribe();

    let first_handle = sequencer.clone();
    let first_request = swap_like_request(&h, tokens(10));
    let first = tokio::spawn(async move { first_handle.run(first_request).await });
    stages
        .wait_for(|s| *s == SequenceStage::Success)
        .await
        .unwrap();

    // Second run starts during the first run's success hold and parks on its receipt.
    let gate = h.chain.gate_receipts();
    let second_handle = sequencer.clone();
    let second_request = swap_like_request(&h, tokens(10));
    let second = tokio::spawn(async move { second_handle.run(second_request).await });
    stages
        .wait_for(|s| *s == SequenceStage::Acting)
        .await
        .unwrap();

    first.await.unwrap().unwrap();
    assert_eq!(sequencer.stage(), SequenceStage::Acting);
    assert!(sequencer.is_processing());

    gate.notify_one();
    tokio::time::timeout(Duration::from_secs(5), second)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(sequencer.stage(), SequenceStage::Idle);
    assert_eq!(h.chain.submitted(), vec!["claim", "claim"]);
}

#[tokio::test]
async fn test_cancelled_run_returns_to_idle() {
    let h = Harness::new();
    let _gate = h.chain.gate_receipts();
    let sequencer = h.sequencer();

    let result = tokio::time::timeout(
        Duration::from_millis(50),
        sequencer.run(swap_like_request(&h, tokens(10))),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(h.chain.submitted(), vec!["approve"]);
    assert_eq!(sequencer.stage(), SequenceStage::Idle);
    assert!(!sequencer.is_processing());
}
