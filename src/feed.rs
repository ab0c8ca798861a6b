//! Batching of newline-delimited JSON metrics
//!
//! Each non-blank line is one [`Metric`]. Lines that do not parse are logged
//! and skipped. Metrics are handed to the [`Dispatcher`] in batches of
//! `batch_size`, with a final partial batch at end of input.

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error};

use crate::Metric;
use crate::dispatcher::Dispatcher;

/// Read metrics until end of input and forward them in batches.
///
/// Fails if reading fails or if any metric could not be delivered. Delivery
/// failures do not stop the feed.
pub async fn forward(
    reader: impl AsyncBufRead + Unpin,
    dispatcher: &Dispatcher,
    batch_size: usize,
) -> anyhow::Result<()> {
    let batch_size = batch_size.max(1);
    let mut lines = reader.lines();
    let mut batch = Vec::new();
    let mut failed = 0;

    while let Some(line) = lines.next_line().await.context("failed to read metrics")? {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Metric>(&line) {
            Ok(metric) => batch.push(metric),
            Err(e) => {
                error!("skipping malformed metric: {e}");
                continue;
            }
        }

        if batch.len() >= batch_size {
            failed += flush(dispatcher, &mut batch).await;
        }
    }

    failed += flush(dispatcher, &mut batch).await;

    if failed > 0 {
        anyhow::bail!("{failed} metrics could not be delivered");
    }
    Ok(())
}

/// Send the batch and return the number of metrics that failed.
async fn flush(dispatcher: &Dispatcher, batch: &mut Vec<Metric>) -> usize {
    let metrics = std::mem::take(batch);
    debug!("flushing {} metrics", metrics.len());

    match dispatcher.write(&metrics).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{e}");
            e.failures.len()
        }
    }
}
