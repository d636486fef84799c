//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use water_abstraction_ui::config::AppState;
use water_abstraction_ui::routes::router;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    // If configuration is broken the application must not start.
    let app_state = AppState::new().expect("failed to initialise application state");
    let addr = format!("0.0.0.0:{}", app_state.config.port);
    let app = router(app_state);

    let listener = TcpListener::bind(&addr)
        .await
        .expect("failed to bind TCP listener");
    tracing::info!("🚀 server listening on {addr}");
    axum::serve(listener, app).await.expect("axum server error");
}
