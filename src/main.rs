//! kasplex-dapp command line client.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use kasplex_dapp::config::loader::load_or_default;
use kasplex_dapp::display::{
    explorer_tx_url, format_amount, format_fixed, format_usd, parse_amount, short_address,
};
use kasplex_dapp::flows::{faucet, liquidity, nft, pools, portfolio, swap, FlowContext};
use kasplex_dapp::lifecycle::signals::shutdown_on_ctrl_c;
use kasplex_dapp::market::{Pair, TokenSlot};
use kasplex_dapp::observability::{logging, metrics};
use kasplex_dapp::reads::{PollRound, Poller, ReadKey, ReadValue};
use kasplex_dapp::session::SessionStatus;
use kasplex_dapp::{App, SequenceOutcome, SequenceRequest, Shutdown};

#[derive(Parser)]
#[command(name = "kasplex-dapp")]
#[command(about = "Swap, provide liquidity, trade NFTs and claim faucet tokens on Kasplex testnet", long_about = None)]
struct Cli {
    /// TOML config file; built-in testnet defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chain, RPC and wallet status
    Status,
    /// Token balances, shares and NFT count of the connected wallet
    Balances,
    /// Reserves, price ratio and TVL of every pool
    Pools,
    /// Price a swap without sending anything
    Quote {
        /// Token to sell (symbol or address)
        from: String,
        /// Token to buy (symbol or address)
        to: String,
        /// Amount to sell, in whole tokens
        amount: String,
    },
    /// Swap tokens, approving the DEX first if needed
    Swap {
        from: String,
        to: String,
        amount: String,
        /// Override the configured slippage tolerance (basis points)
        #[arg(long)]
        slippage_bps: Option<u32>,
    },
    /// Add liquidity to a pool (1 = A/B, 2 = A/C, 3 = B/C)
    AddLiquidity {
        pair: u8,
        amount1: String,
        amount2: String,
    },
    /// Faucet cooldown and reserves
    Faucet,
    /// Claim faucet tokens
    Claim,
    /// Active NFT listings
    Listings,
    /// Buy a listed NFT
    BuyNft {
        token_id: u64,
        /// Payment token (symbol or address)
        #[arg(long, default_value = "PLAT")]
        pay_with: String,
    },
    /// List an owned NFT for sale
    ListNft {
        token_id: u64,
        /// Price in token A, in whole tokens
        price: String,
    },
    /// Poll balances and reserves until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability.log_level);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = App::bootstrap(config, true).await?;
    let ctx = &app.flows;

    match cli.command {
        Commands::Status => {
            let status = StatusReport {
                session: app.session.status(),
                chain_id: app.client.get_chain_id().await.ok().map(|c| c.0),
                expected_chain_id: app.config.network.chain_id,
                block_number: app.client.get_block_number().await.ok(),
                rpc_healthy: app.client.is_healthy().await,
                rpc_url: app.config.network.rpc_url.clone(),
            };
            emit(cli.json, &status, |s| {
                let wallet = match s.session {
                    SessionStatus::Connected(address) => short_address(address),
                    SessionStatus::Disconnected => "not connected".to_string(),
                };
                println!("RPC:      {} ({})", s.rpc_url, if s.rpc_healthy { "healthy" } else { "unreachable" });
                println!("Chain:    {:?} (expected {})", s.chain_id, s.expected_chain_id);
                println!("Block:    {:?}", s.block_number);
                println!("Wallet:   {}", wallet);
            })?;
        }
        Commands::Balances => {
            let p = portfolio::fetch_portfolio(ctx).await?;
            emit(cli.json, &p, |p| {
                println!("Wallet {}", short_address(p.owner));
                for h in &p.holdings {
                    println!(
                        "  {:<5} {:>20}  ${:>16}  {:>6.2}%",
                        h.token.symbol,
                        format_amount(h.balance, 2),
                        format_amount(h.usd_value, 2),
                        h.percent
                    );
                }
                println!("  Total {:>20}  ${:>16}", format_amount(p.total, 2), format_amount(p.total_usd, 2));
                println!("  NFTs  {}", p.nft_count);
            })?;
        }
        Commands::Pools => {
            let stats = pools::fetch_pools(ctx).await;
            emit(cli.json, &stats, |stats| {
                for s in stats {
                    println!(
                        "{}/{}: {} / {}  ratio {}  share {:.1}% / {:.1}%  TVL ${}",
                        s.symbol0,
                        s.symbol1,
                        format_amount(s.reserve0, 2),
                        format_amount(s.reserve1, 2),
                        s.price_ratio.as_deref().unwrap_or("-"),
                        s.share0_pct,
                        s.share1_pct,
                        format_amount(s.tvl_usd, 2)
                    );
                }
            })?;
        }
        Commands::Quote { from, to, amount } => {
            let (token_in, token_out) = resolve_pair(ctx, &from, &to)?;
            let q = swap::quote(ctx, token_in, token_out, parse_amount(&amount)?).await?;
            emit(cli.json, &q, print_quote)?;
        }
        Commands::Swap {
            from,
            to,
            amount,
            slippage_bps,
        } => {
            let (token_in, token_out) = resolve_pair(ctx, &from, &to)?;
            let mut q = swap::quote(ctx, token_in, token_out, parse_amount(&amount)?).await?;
            if let Some(bps) = slippage_bps {
                q = q.with_slippage(bps);
            }
            if !cli.json {
                print_quote(&q);
            }
            let request = swap::prepare_swap(ctx, &q).await?;
            execute(&app, request, cli.json).await?;
        }
        Commands::AddLiquidity {
            pair,
            amount1,
            amount2,
        } => {
            let pair = Pair::from_id(pair)?;
            let request = liquidity::prepare_add_liquidity(
                ctx,
                pair,
                parse_amount(&amount1)?,
                parse_amount(&amount2)?,
            )
            .await?;
            execute(&app, request, cli.json).await?;
        }
        Commands::Faucet => {
            let status = faucet::fetch_status(ctx, faucet::unix_now()).await?;
            emit(cli.json, &status, |s| {
                if s.can_claim {
                    println!("Ready to claim");
                } else {
                    println!("Next claim in {}", s.cooldown);
                }
                if let Some(amount) = s.claim_amount {
                    println!("Claim amount: {}", format_amount(amount, 2));
                }
                for (symbol, balance) in &s.reserves {
                    let shown = balance.map(|b| format_fixed(b, 0)).unwrap_or_else(|| "-".into());
                    println!("  Faucet {:<5} {}", symbol, shown);
                }
            })?;
        }
        Commands::Claim => {
            let request = faucet::prepare_claim(ctx, faucet::unix_now()).await?;
            execute(&app, request, cli.json).await?;
        }
        Commands::Listings => {
            let listings = nft::scan_listings(ctx).await;
            emit(cli.json, &listings, |listings| {
                if listings.is_empty() {
                    println!("No active listings");
                }
                for l in listings {
                    println!(
                        "#{:<4} {:>14} {}  seller {}",
                        l.token_id,
                        format_fixed(l.price, 4),
                        ctx.registry.get(TokenSlot::A).symbol,
                        short_address(l.seller)
                    );
                }
            })?;
        }
        Commands::BuyNft { token_id, pay_with } => {
            let slot = ctx.registry.lookup(&pay_with)?.slot;
            let request = nft::prepare_buy(ctx, token_id, slot).await?;
            execute(&app, request, cli.json).await?;
        }
        Commands::ListNft { token_id, price } => {
            let request = nft::prepare_list(ctx, token_id, parse_amount(&price)?)?;
            execute(&app, request, cli.json).await?;
        }
        Commands::Watch => watch(&app, cli.json).await?,
    }

    Ok(())
}

#[derive(Serialize)]
struct StatusReport {
    session: SessionStatus,
    chain_id: Option<u64>,
    expected_chain_id: u64,
    block_number: Option<u64>,
    rpc_healthy: bool,
    rpc_url: String,
}

fn emit<T: Serialize>(
    json: bool,
    value: &T,
    human: impl FnOnce(&T),
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human(value);
    }
    Ok(())
}

fn resolve_pair(
    ctx: &FlowContext,
    from: &str,
    to: &str,
) -> Result<(TokenSlot, TokenSlot), Box<dyn std::error::Error>> {
    Ok((ctx.registry.lookup(from)?.slot, ctx.registry.lookup(to)?.slot))
}

fn print_quote(q: &swap::SwapQuote) {
    println!("Pair:          {} (id {})", q.pair.label(), q.pair.id());
    println!("You pay:       {}", format_fixed(q.amount_in, 6));
    println!("You receive:   {}", format_fixed(q.amount_out, 6));
    println!("Minimum out:   {} ({} bps slippage)", format_fixed(q.min_amount_out, 6), q.slippage_bps);
    if q.price_impact_pct < 0.01 {
        println!("Price impact:  < 0.01%");
    } else {
        println!("Price impact:  {:.2}%", q.price_impact_pct);
    }
    println!("Rate:          {}", q.exchange_rate.as_deref().unwrap_or("-"));
    println!("Value:         ${}", format_usd(q.amount_in));
}

/// Run one sequence, echoing stage changes to stderr.
async fn execute(
    app: &App,
    request: SequenceRequest,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // The process exits after one sequence; skip the idle reset delay.
    let sequencer = app.sequencer(|c| c.success_reset_ms = 0);

    let mut stages = sequencer.subscribe();
    let progress = tokio::spawn(async move {
        while stages.changed().await.is_ok() {
            let stage = *stages.borrow_and_update();
            eprintln!("[{}]", stage);
        }
    });

    let result = sequencer.run(request).await;
    drop(sequencer);
    progress.abort();

    let outcome: SequenceOutcome = result?;
    let explorer = &app.config.network.explorer_url;
    emit(json, &outcome, |o| {
        for tx in &o.approval_txs {
            println!("Approval: {}", explorer_tx_url(explorer, *tx));
        }
        println!("{}: {}", o.flow, explorer_tx_url(explorer, o.action_tx));
        println!("Confirmed in block {}", o.block_number);
    })
}

async fn watch(app: &App, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<PollRound>();
    let polling = &app.config.polling;

    let mut balance_keys = Vec::new();
    if let Some(owner) = app.session.address() {
        balance_keys.push(ReadKey::NativeBalance(owner));
        for token in app.flows.registry.all() {
            balance_keys.push(ReadKey::TokenBalance {
                token: token.address,
                owner,
            });
        }
        balance_keys.push(ReadKey::NftBalance(owner));
    }
    let reserve_keys: Vec<ReadKey> = Pair::ALL.into_iter().map(ReadKey::Reserves).collect();

    let balances = Poller::new(
        "balances",
        app.reads.clone(),
        balance_keys,
        Duration::from_millis(polling.balance_interval_ms),
    )
    .with_updates(tx.clone());
    let reserves = Poller::new(
        "reserves",
        app.reads.clone(),
        reserve_keys,
        Duration::from_millis(polling.reserves_interval_ms),
    )
    .with_updates(tx);

    let balance_task = tokio::spawn(balances.run(shutdown.subscribe()));
    let reserve_task = tokio::spawn(reserves.run(shutdown.subscribe()));
    tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));

    while let Some(round) = rx.recv().await {
        if json {
            println!("{}", serde_json::to_string(&round)?);
            continue;
        }
        for (key, value) in &round {
            println!("{:<16} {}", key.kind(), describe(value.as_ref()));
        }
    }

    let _ = tokio::join!(balance_task, reserve_task);
    tracing::info!("Watch stopped");
    Ok(())
}

fn describe(value: Option<&ReadValue>) -> String {
    match value {
        None => "no data yet".to_string(),
        Some(ReadValue::Amount(v)) => format_amount(*v, 4),
        Some(ReadValue::Reserves { reserve0, reserve1 }) => {
            format!("{} / {}", format_amount(*reserve0, 2), format_amount(*reserve1, 2))
        }
        Some(ReadValue::Listing(l)) => format!(
            "{} {}",
            format_fixed(l.price, 4),
            if l.active { "active" } else { "inactive" }
        ),
        Some(ReadValue::Address(a)) => short_address(*a),
    }
}
