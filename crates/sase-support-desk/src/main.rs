//! Support Desk Dashboard - headless runner
//!
//! Seeds an in-memory backend with sample data and logs every dashboard
//! refresh. Useful for exercising the refresh loop without a browser.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sase_support_desk::infrastructure::{InMemoryDataSource, SystemClock, TracingChartSink, TracingView};
use sase_support_desk::{CaseActionService, CaseActions, CaseStatus, Collection, DashboardConfig, RefreshCoordinator};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Support Desk Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::var("SUPPORT_DESK_CONFIG") {
        Ok(path) => DashboardConfig::load(&path).unwrap_or_else(|e| {
            tracing::warn!("{}, using defaults", e);
            DashboardConfig::default()
        }),
        Err(_) => DashboardConfig::default(),
    };

    let source = Arc::new(InMemoryDataSource::new());
    seed(&source).await;

    let clock = Arc::new(SystemClock);
    let coordinator = Arc::new(RefreshCoordinator::new(
        source.clone(),
        Arc::new(TracingView),
        Arc::new(TracingChartSink::new()),
        clock.clone(),
        config,
    ));
    let (triggers, rx) = coordinator.trigger_channel();
    let runner = tokio::spawn(coordinator.clone().run(rx));

    // Simulated agent activity so the change feed has something to report
    let actions = CaseActionService::new(source.clone(), clock);
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        if let Err(e) = actions.transition("case-1003", CaseStatus::InProgress).await {
            tracing::warn!("Demo transition failed: {}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    drop(triggers);
    runner.await??;
    Ok(())
}

async fn seed(source: &InMemoryDataSource) {
    let now = Utc::now();
    let agents = [
        json!({ "id": "agent-1", "name": "Ada Park", "status": "available", "handles_vip": true, "expertise": ["billing", "api"] }),
        json!({ "id": "agent-2", "name": "Jordan Blake", "status": "busy", "handles_escalations": true, "max_concurrent_cases": 6 }),
        json!({ "id": "agent-3", "name": "Sam Ortiz", "status": "offline" }),
    ];
    for agent in agents {
        source.insert(Collection::Agents, agent).await;
    }

    let cases = [
        ("case-1001", "vip", "new", 5, None, Some("agent-1")),
        ("case-1002", "urgent", "resolved", 30, Some(2), Some("agent-1")),
        ("case-1003", "normal", "assigned", 12, None, Some("agent-2")),
        ("case-1004", "low", "closed", 72, Some(20), Some("agent-2")),
        ("case-1005", "normal", "new", 1, None, None),
        ("case-1006", "critical", "escalated", 40, None, Some("agent-2")),
    ];
    for (i, (id, priority, status, age_hours, resolved_hours_ago, agent)) in cases.into_iter().enumerate() {
        let created = now - Duration::hours(age_hours);
        let resolved_at = resolved_hours_ago.map(|h: i64| (now - Duration::hours(h)).to_rfc3339());
        source.insert(Collection::Cases, json!({
            "id": id,
            "case_number": format!("CS-{}", 1001 + i),
            "priority": priority,
            "status": status,
            "created_at": created.to_rfc3339(),
            "resolved_at": resolved_at,
            "response_time_minutes": 15 + 10 * i,
            "agent_id": agent,
            "metadata": { "subject": format!("Sample request {}", i + 1) }
        })).await;
    }
    source.insert(Collection::EmailThreads, json!({
        "id": "thread-1", "case_id": "case-1001", "direction": "inbound",
        "sender": "customer@example.com", "sent_at": (now - Duration::hours(5)).to_rfc3339()
    })).await;
}
