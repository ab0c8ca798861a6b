//! Concurrency tests for batches processed in parallel
//!
//! These tests verify that:
//! - Concurrent batches never create the same service twice
//! - Batches for different services all get delivered

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use icinga_bridge::ServiceIdentity;
use icinga_bridge::client::memory::MemoryApi;
use icinga_bridge::dispatcher::Dispatcher;

use crate::helpers::*;

#[tokio::test]
async fn test_concurrent_batches_create_once() {
    let api = Arc::new(MemoryApi::new().with_latency(Duration::from_millis(10)));
    let dispatcher = Dispatcher::new(api.clone(), "hostalive");
    let metrics = vec![create_test_metric("web1", "cpu", "usage", 42)];

    let results = join_all((0..10).map(|_| dispatcher.process(&metrics))).await;

    for result in results {
        assert!(result.is_ok(), "batch failed: {result:?}");
    }
    assert_eq!(api.calls().creates, 1);
    assert_eq!(api.results().len(), 10);
}

#[tokio::test]
async fn test_concurrent_batches_on_spawned_tasks() {
    let api = Arc::new(MemoryApi::new().with_latency(Duration::from_millis(5)));
    let dispatcher = Dispatcher::new(api.clone(), "hostalive");

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            // five hosts, every host seen by four tasks
            let host = format!("web{}", i % 5);
            tokio::spawn(async move {
                let metrics = vec![
                    create_test_metric(&host, "cpu", "usage", i),
                    create_test_metric(&host, "mem", "used", i * 10),
                ];
                dispatcher.process(&metrics).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(api.calls().creates, 10);
    assert_eq!(api.service_count(), 10);
    assert_eq!(api.results().len(), 40);
    assert!(api.service(&ServiceIdentity::new("web3", "mem")).is_some());
}
