use crate::config::get_config;
use crate::error::{Error, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;

pub async fn create_pool() -> Result<PgPool> {
    let config = get_config();

    let mut options = PgConnectOptions::from_str(&config.database_url)
        .map_err(|e| Error::Config(format!("Invalid DATABASE_URL: {}", e)))?;
    if let Some(username) = &config.database_username {
        options = options.username(username);
    }
    if let Some(password) = &config.database_password {
        options = options.password(password);
    }

    let pool = PgPoolOptions::new()
        .max_connections(50)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect_with(options)
        .await?;
    Ok(pool)
}
