use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use bae_shop_server::config::Config;
use bae_shop_server::routes::create_routes;
use bae_shop_server::state::AppState;
use bae_shop_server::utils::cleanup::spawn_cleanup_task;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("Failed to load configuration");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let port = config.port;
    let hold = config.reservation_valid_for;
    let every = config.cleanup_every;

    let state = AppState::new(pool.clone(), config).expect("Failed to build application state");

    // Releases expired holds for as long as the server runs
    spawn_cleanup_task(pool, hold, every);

    let app: Router = create_routes(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
