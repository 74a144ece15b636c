// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Default Azure OpenAI REST API version used when none is configured.
pub const DEFAULT_OPENAI_API_VERSION: &str = "2024-12-01-preview";

/// Connection settings for the hosted chat-completion deployment.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub server_port: u16,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,

    /// `None` when the language model is not configured.
    pub openai: Option<OpenAiConfig>,

    /// Base URL of the external practice generator/corrector.
    pub practice_service_url: Option<String>,

    /// Upper bound on generator calls for one missing daily challenge.
    pub challenge_generation_attempts: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let openai = match (
            non_empty("AZURE_OPENAI_ENDPOINT"),
            non_empty("AZURE_OPENAI_KEY"),
            non_empty("AZURE_OPENAI_DEPLOYMENT"),
        ) {
            (Some(endpoint), Some(api_key), Some(deployment)) => Some(OpenAiConfig {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                api_key,
                deployment,
                api_version: non_empty("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_OPENAI_API_VERSION.to_string()),
            }),
            _ => None,
        };

        let challenge_generation_attempts = env::var("CHALLENGE_GENERATION_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(2)
            .max(1);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            server_port,
            admin_username: non_empty("ADMIN_USERNAME"),
            admin_password: non_empty("ADMIN_PASSWORD"),
            openai,
            practice_service_url: non_empty("PRACTICE_SERVICE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            challenge_generation_attempts,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
