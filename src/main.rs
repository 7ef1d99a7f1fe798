use actix::prelude::*;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_fulfillment::actors::{Connect, InboxSession, NotificationRouter, TakeReceived};
use order_fulfillment::config::AppConfig;
use order_fulfillment::domain::identity::IdentityService;
use order_fulfillment::domain::order::{OrderCommandHandler, OrderQueries};
use order_fulfillment::metrics::{self, Metrics};
use order_fulfillment::models::{Principal, Role};
use order_fulfillment::store::{InMemoryOrderStore, InMemoryUserDirectory, OrderStore, UserDirectory};

#[actix::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // RUST_LOG wins over LOG_FILTER when both are set
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .init();

    tracing::info!("🚀 Starting order fulfillment workflow");

    // === 1. Initialize Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    if config.metrics_enabled {
        let server_metrics = metrics.clone();
        let host = config.metrics_host.clone();
        let port = config.metrics_port;
        std::thread::spawn(move || {
            let system = actix_web::rt::System::new();
            if let Err(e) = system.block_on(metrics::start_metrics_server(server_metrics, host, port)) {
                tracing::error!(error = %e, "Metrics server error");
            }
        });
    }

    // === 2. Stores and router ===
    let orders: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
    let users: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new());
    let router = NotificationRouter::with_metrics(metrics.clone()).start();

    let identity = IdentityService::new(users.clone());
    let handler = OrderCommandHandler::new(orders.clone(), users.clone(), router.clone()).with_metrics(metrics.clone());
    let queries = OrderQueries::new(orders, users);

    // === 3. Sync the demo identities ===
    identity
        .sync_user("auth|admin", "Ada Admin", "ada@example.com", Some(Role::Admin))
        .await?;
    identity
        .sync_user("auth|buyer", "Bea Buyer", "bea@example.com", None)
        .await?;
    identity
        .sync_user("auth|seller", "Sam Seller", "sam@example.com", Some(Role::Seller))
        .await?;

    let admin = identity.resolve("auth|admin").await?;
    let buyer = identity.resolve("auth|buyer").await?;
    let seller = identity.resolve("auth|seller").await?;

    // === 4. Connect one session per identity ===
    let admin_inbox = connect(&router, &admin).await?;
    let buyer_inbox = connect(&router, &buyer).await?;
    let seller_inbox = connect(&router, &seller).await?;

    // === 5. Demonstrate the full order lifecycle ===
    tracing::info!("📝 Demonstrating order lifecycle");

    let order = handler
        .create_order(&buyer, vec!["Laptop".to_string(), "Mouse".to_string()])
        .await?;

    if let Err(e) = handler.create_order(&buyer, vec!["Monitor".to_string()]).await {
        tracing::info!(error = %e, "Second active order rejected as expected");
    }

    handler.associate_buyer(&admin, order.id, buyer.user_id).await?;
    handler.assign_seller(&admin, order.id, seller.user_id).await?;

    loop {
        match handler.advance_stage(&seller, order.id).await {
            Ok(updated) => tracing::info!(order_id = %updated.id, stage = %updated.stage, "🚚 Stage advanced"),
            Err(e) => {
                tracing::info!(error = %e, "Advance stopped");
                break;
            }
        }
    }

    let stats = queries.stats(&admin).await?;
    tracing::info!(stats = %serde_json::to_string(&stats)?, "📈 Order stats");

    let history = queries.order_history(&buyer).await?;
    tracing::info!(delivered = history.len(), "Buyer order history");

    for (name, inbox) in [("admin", admin_inbox), ("buyer", buyer_inbox), ("seller", seller_inbox)] {
        let received = inbox.send(TakeReceived).await?;
        tracing::info!(session = name, received = received.len(), "Notifications received");
    }

    tracing::info!("🎉 Demo complete!");

    if config.metrics_enabled {
        tracing::info!("⏳ Serving metrics, press Ctrl+C to exit");
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

async fn connect(router: &Addr<NotificationRouter>, principal: &Principal) -> anyhow::Result<Addr<InboxSession>> {
    let inbox = InboxSession::new(principal.clone()).start();
    let session_id = router
        .send(Connect {
            principal: principal.clone(),
            recipient: inbox.clone().recipient(),
        })
        .await?;
    tracing::debug!(session_id = %session_id, user = %principal.name, "Session connected");
    Ok(inbox)
}
