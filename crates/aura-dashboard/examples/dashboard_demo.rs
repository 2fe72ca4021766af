//! Dashboard 演示
//!
//! 连接真实后端（默认 http://localhost:5000/api，可用 AURA_API_URL / AURA_ORIGIN 覆盖），
//! 挂载后快速连续选择前几个实体，最后取消选择。
//!
//! ```bash
//! RUST_LOG=info AURA_API_URL=http://127.0.0.1:5000/api cargo run --example dashboard_demo
//! ```

use aura_dashboard::view::{alert_subtitle, timeline_caption};
use aura_dashboard::{Dashboard, DashboardConfig, DashboardEvent, ViewState};
use chrono::Utc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Aura Dashboard 演示 ===\n");

    let config = DashboardConfig::from_env();
    println!("1️⃣ API 基础路径: {}\n", config.resolved_base_url()?);
    let dashboard = Dashboard::new(config)?;

    let mut events = dashboard.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let DashboardEvent::SyncStateChanged {
                resource,
                status,
                item_count,
                ..
            } = event
            {
                info!("📣 {} -> {} ({} 条)", resource, status, item_count);
            }
        }
    });

    // 2. 挂载：实体列表与告警并发拉取
    dashboard.mount().await;
    let snapshot = dashboard.snapshot();
    println!("2️⃣ 挂载完成");
    print_view("   Entities", &snapshot.entity_view);
    print_view("   Alerts", &snapshot.alert_view);

    let now = Utc::now();
    for alert in &snapshot.alerts.data {
        println!("   [{}] {} - {}", alert.severity, alert.message, alert_subtitle(alert, &now));
    }

    // 3. 快速连续选择，最终只显示最后一个实体的时间线
    let ids: Vec<_> = snapshot.entities.data.iter().take(3).map(|e| e.id).collect();
    println!("\n3️⃣ 连续选择: {:?}", ids);
    for id in &ids {
        dashboard.select(*id);
    }

    match dashboard.selected_entity() {
        Some(entity) => {
            let timeline = dashboard.timeline().wait_settled().await;
            println!("   {} 的时间线:", entity.display_label());
            print_view("   Timeline", &dashboard.snapshot().timeline_view);
            for event in &timeline.data {
                println!("   - {} ({})", event.description, event.source_type);
                println!("     {}", timeline_caption(event));
            }
        }
        None => warn!("⚠️ 没有可选择的实体"),
    }

    // 4. 取消选择
    dashboard.clear_selection();
    println!("\n4️⃣ 取消选择");
    print_view("   Timeline", &dashboard.snapshot().timeline_view);

    Ok(())
}

fn print_view(title: &str, view: &ViewState) {
    match view {
        ViewState::Populated(count) => println!("{}: {} item(s)", title, count),
        other => println!("{}: {}", title, other.notice().unwrap_or_default()),
    }
}
