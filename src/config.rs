use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_username: Option<String>,
    pub database_password: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub screening_pool_core: usize,
    pub screening_pool_max: usize,
    pub screening_pool_queue: usize,
    pub uploads_resume_dir: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_resume_bytes: usize,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            database_url: get_env("DATABASE_URL")?,
            database_username: env::var("DATABASE_USERNAME").ok(),
            database_password: env::var("DATABASE_PASSWORD").ok(),
            llm_base_url: get_env_or("LLM_BASE_URL", "http://localhost:11434"),
            llm_model: get_env_or("LLM_MODEL", "llama2"),
            llm_timeout_secs: get_env_parse_or("LLM_TIMEOUT_SECS", 120)?,
            screening_pool_core: get_env_parse_or("SCREENING_POOL_CORE", 2)?,
            screening_pool_max: get_env_parse_or("SCREENING_POOL_MAX", 5)?,
            screening_pool_queue: get_env_parse_or("SCREENING_POOL_QUEUE", 100)?,
            uploads_resume_dir: get_env_or("UPLOADS_RESUME_DIR", "uploads/resumes"),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            max_resume_bytes: get_env_parse_or("MAX_RESUME_BYTES", 10 * 1024 * 1024)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
