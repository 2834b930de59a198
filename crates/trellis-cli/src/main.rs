use std::error::Error;
use std::sync::Arc;

use serde::Serialize;
use tokio::time::{Duration, sleep};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use trellis_core::app::{FailureCounts, ServiceBuilder, ServiceConfig, ServiceError};
use trellis_core::domain::{Context, FullReplace, NewRecord, PageRequest, SparsePatch};
use trellis_core::impls::{
    InMemoryEventSink, InMemoryRecordCache, InMemoryRecordStore, MemoryObserver,
};

/// 実行結果のまとめ（最後に JSON で出力）
#[derive(Debug, Serialize)]
struct Summary {
    created: usize,
    listed: usize,
    events: Vec<String>,
    failures: FailureCounts,
    deleted_lookup_status: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // (A) ログ：RUST_LOG が無ければ info
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // (B) ポートを用意してサービスを組み立てる
    let config = ServiceConfig::from_env()?;
    tracing::info!(?config, "loaded config");

    let events = Arc::new(InMemoryEventSink::default());
    let observer = Arc::new(MemoryObserver::new());
    let service = ServiceBuilder::new()
        .store(Arc::new(InMemoryRecordStore::default()))
        .cache(Arc::new(InMemoryRecordCache::default()))
        .events(events.clone())
        .observer(observer.clone())
        .config(config)
        .build()?;

    // (C) イベント購読（別タスクで表示）
    let mut feed = events.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(envelope) = feed.recv().await {
            println!(
                "event: {} {} at {}",
                envelope.event.name(),
                envelope.event.record_id(),
                envelope.occurred_at
            );
        }
    });

    // (D) ライフサイクル：create → get → patch → replace → list → delete
    let ctx = Context::background().with_timeout(Duration::from_secs(5));

    let mut ids = Vec::new();
    for (label, value) in [("alpha", 1), ("beta", 2), ("gamma", 3)] {
        let record = service
            .create(&ctx, NewRecord::new(label, value, 1.0).with_tags(["demo"]))
            .await?;
        println!("created: {} ({})", record.id, record.label);
        ids.push(record.id);
    }

    let first = service.get_by_id(&ctx, ids[0]).await?;
    println!("fetched: {}", serde_json::to_string(&first)?);

    let patched = service
        .update(&ctx, ids[0], &SparsePatch::new(ids[0]).label("alpha-2"))
        .await?;
    println!("patched: label={} value={}", patched.label, patched.value);

    let replace = FullReplace {
        id: ids[1],
        label: "beta-2".into(),
        value: 20,
        weight: 0.5,
        tags: vec![],
    };
    let replaced = service.update(&ctx, ids[1], &replace).await?;
    println!("replaced: {}", serde_json::to_string(&replaced)?);

    let listed = service.list(&ctx, PageRequest::first()).await?;
    for record in &listed {
        println!("listed: {} {} {}", record.id, record.label, record.value);
    }

    service.delete_by_id(&ctx, ids[2]).await?;
    let deleted_lookup_status = match service.get_by_id(&ctx, ids[2]).await {
        Err(e @ ServiceError::NotFound(_)) => {
            println!("after delete: {e}");
            e.kind().http_status()
        }
        Err(e) => return Err(e.into()),
        Ok(record) => {
            tracing::warn!(record_id = %record.id, "deleted record still readable");
            200
        }
    };

    // (E) 購読側が追いつくまで少し待つ
    sleep(Duration::from_millis(50)).await;
    printer.abort();

    let summary = Summary {
        created: ids.len(),
        listed: listed.len(),
        events: events
            .published()
            .await
            .iter()
            .map(|env| env.event.name().to_string())
            .collect(),
        failures: observer.counts(),
        deleted_lookup_status,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
