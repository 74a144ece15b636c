// src/main.rs

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dotenvy::dotenv;
use grammar_tutor::clock::{Clock, SystemClock};
use grammar_tutor::config::Config;
use grammar_tutor::routes;
use grammar_tutor::services::completion;
use grammar_tutor::state::AppState;
use grammar_tutor::streak::{WeeklyProgress, week_start};
use grammar_tutor::utils::hash::hash_password;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .expect("DATABASE_URL must be a valid SQLite connection string")
        .create_if_missing(true)
        .foreign_keys(true);

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(connect_options.clone())
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to open database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Seed Admin User
    if let Err(e) = seed_admin_user(&pool, &config, clock.as_ref()).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let completion = completion::from_config(&config);
    if config.practice_service_url.is_none() {
        tracing::warn!("PRACTICE_SERVICE_URL not set, practice proxy endpoints will return 503");
    }

    let port = config.server_port;
    let state = AppState::new(pool, config, clock, completion);

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}

async fn seed_admin_user(
    pool: &SqlitePool,
    config: &Config,
    clock: &dyn Clock,
) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        let user_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        if user_exists.is_none() {
            tracing::info!("Seeding admin user: {}", username);
            let hashed_password = hash_password(password)?;

            sqlx::query(
                r#"
                INSERT INTO users (username, password, role, week_start_date, weekly_progress, created_at)
                VALUES (?, ?, 'admin', ?, ?, ?)
                "#,
            )
            .bind(username)
            .bind(hashed_password)
            .bind(week_start(clock.today()))
            .bind(WeeklyProgress::idle().to_json())
            .bind(Utc::now())
            .execute(pool)
            .await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
