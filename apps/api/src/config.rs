use anyhow::{bail, Context, Result};

/// Largest activity report window a caller may request.
pub const MAX_ACTIVITY_WINDOW_DAYS: u32 = 365;

/// Application configuration loaded from environment variables.
/// Startup fails if `DATABASE_URL` is missing or a numeric variable does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Unset means interview feedback comes from the canned generator.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub db_max_connections: u32,
    pub activity_window_days: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let activity_window_days = parse_env("ACTIVITY_WINDOW_DAYS", 30u32)?;
        if activity_window_days == 0 || activity_window_days > MAX_ACTIVITY_WINDOW_DAYS {
            bail!("ACTIVITY_WINDOW_DAYS must be between 1 and {MAX_ACTIVITY_WINDOW_DAYS}");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            port: parse_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10u32)?,
            activity_window_days,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
