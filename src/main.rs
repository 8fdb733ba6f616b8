use std::sync::Arc;

use food_market::clock::SystemClock;
use food_market::config::Config;
use food_market::db::{create_pool, run_migrations, PgListingStore, PgProfileStore};
use food_market::middleware::AuthLayer;
use food_market::rate_limit::SubmissionLimiter;
use food_market::routes::{router, AppState};
use food_market::services::{JwtIdentity, MarketplaceService};

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "food_market=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting food-market server...");
    tracing::info!("Connecting to database...");

    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection established");

    if config.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let limiter = SubmissionLimiter::new(
        config.submission_rate_limit,
        config.submission_rate_window,
        Arc::new(SystemClock),
    );
    match &limiter {
        Some(l) => tracing::info!("Submission throttling enabled: {:?}", l),
        None => tracing::info!("Submission throttling disabled"),
    }

    let marketplace = MarketplaceService::new(Arc::new(PgListingStore::new(pool.clone())), limiter);
    let auth = AuthLayer::new(
        Arc::new(JwtIdentity::new(
            &config.jwt_secret,
            config.jwt_audience.as_deref(),
        )),
        Arc::new(PgProfileStore::new(pool.clone())),
    );
    let app = router(
        AppState {
            marketplace: Arc::new(marketplace),
        },
        auth,
    );

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received terminate signal, shutting down"),
    }
}
