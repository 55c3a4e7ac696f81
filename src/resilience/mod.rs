//! Resilience helpers.
//!
//! Only read polling retries. Transaction submissions are never retried:
//! a failed sequence returns to idle and the user decides what to do next.

pub mod backoff;
