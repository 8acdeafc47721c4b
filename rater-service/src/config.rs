use dotenvy::dotenv;
use std::env;

use crate::error::{AppError, AppResult};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind the HTTP server to
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// HS256 secret used to validate access tokens
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::Config("PORT must be a valid port number".to_string()))?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Config("JWT_SECRET must be set".to_string()))?;

        Ok(Self {
            host,
            port,
            jwt_secret,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
