use std::net::SocketAddr;
use std::sync::Arc;

use email_gateway::config;
use email_gateway::rate_limit::{self, RateLimiter};
use email_gateway::sender::{EmailSender, MockSender, SmtpSender};
use email_gateway::service::EmailService;
use email_gateway::state::{AppState, Stats};

#[tokio::main]
async fn main() {
    // Optional .env seed, then log setup
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    // Load config
    let cfg = config::load_config();

    // Pick the delivery backend once, from config validity
    let sender: Box<dyn EmailSender> = if cfg.smtp.is_valid() {
        tracing::info!(
            "SMTP configured, relaying through {}:{}",
            cfg.smtp.host,
            cfg.smtp.port
        );
        Box::new(
            SmtpSender::new(cfg.smtp.clone(), cfg.smtp_timeout)
                .expect("failed to initialize SMTP transport"),
        )
    } else {
        tracing::warn!("SMTP configuration missing, falling back to mock email delivery");
        Box::new(MockSender)
    };

    // Setup shared state
    let stats = Arc::new(Stats::new());
    let limiter = Arc::new(RateLimiter::new(rate_limit::COOLDOWN));
    let service = Arc::new(EmailService::new(sender, stats.clone()));
    let state = AppState {
        config: Arc::new(cfg.clone()),
        service,
        stats,
        limiter: limiter.clone(),
    };

    rate_limit::spawn_sweeper(limiter);

    let router = email_gateway::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port))
        .await
        .expect("Failed to bind to address");
    let addr = listener.local_addr().unwrap();

    tracing::info!("Email gateway starting, listening on {}", addr);
    tracing::info!("Health check available at http://localhost:{}/health", cfg.port);
    tracing::info!("Stats available at http://localhost:{}/stats", cfg.port);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
