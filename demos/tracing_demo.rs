//! Demonstrates the cancellation events emitted with the `tracing` feature
//!
//! Run with: cargo run --example tracing_demo --features tracing

use std::time::Duration;
use tokio::task::LocalSet;
use undertow::{AsyncTask, FallibleAsyncTask, Outcome, TokioScheduler};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set up tracing subscriber
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let local = LocalSet::new();
    local.run_until(run()).await;
}

async fn run() {
    tracing::info!("Starting tracing demo");

    // A pipeline whose source timer is cancelled from the end of the chain
    let slow = AsyncTask::after(&TokioScheduler, Duration::from_secs(60), 1);
    let pipeline = slow.map(|x| x + 1).map(|x| x * 10);
    pipeline.cancel();
    tracing::info!(source = ?slow.status(), "pipeline cancelled");

    // An aggregate that is cancelled when one member is
    let first = AsyncTask::after(&TokioScheduler, Duration::from_millis(10), "a");
    let second = AsyncTask::after(&TokioScheduler, Duration::from_secs(60), "b");
    let both = AsyncTask::all(vec![first, second.clone()]);
    second.cancel();
    let settled = both.await;
    tracing::info!(aggregate = ?settled, "aggregate settled");

    // A fallible chain that settles normally
    let parsed = FallibleAsyncTask::<String, String>::of_success("42".to_string())
        .and_then(|raw| Outcome::from_result(raw.parse::<i32>().map_err(|e| e.to_string())));
    match parsed.await.into_option() {
        Some(Outcome::Success(n)) => tracing::info!("parsed {}", n),
        Some(Outcome::Failure(e)) => tracing::error!("parse failed: {}", e),
        None => tracing::warn!("parse cancelled"),
    }
}
