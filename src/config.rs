use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::warn;

const INSECURE_DEFAULT_SECRET: &str = "your-secret-key-change-in-production";
const DEFAULT_TOKEN_TTL: &str = "7d";
/// Upper bound on any parsed duration: ten years.
const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

impl AppEnv {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => bail!("unknown APP_ENV '{other}'"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub env: AppEnv,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL is not defined in the environment")?;

        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => s,
            _ => {
                warn!("JWT_SECRET is not set; falling back to an insecure default secret");
                INSECURE_DEFAULT_SECRET.to_string()
            }
        };
        let ttl_raw =
            std::env::var("JWT_EXPIRES_IN").unwrap_or_else(|_| DEFAULT_TOKEN_TTL.into());
        let ttl = parse_duration(&ttl_raw)
            .with_context(|| format!("invalid JWT_EXPIRES_IN '{ttl_raw}'"))?;

        let env = match std::env::var("APP_ENV") {
            Ok(v) => AppEnv::parse(&v)?,
            Err(_) => AppEnv::Development,
        };
        let port = match std::env::var("PORT") {
            Ok(v) => v.parse::<u16>().with_context(|| format!("invalid PORT '{v}'"))?,
            Err(_) => 5000,
        };

        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            env,
            jwt: JwtConfig { secret, ttl },
        })
    }
}

/// Parses `30s`, `15m`, `12h`, `7d`, `2w` or a bare number of seconds.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("empty duration");
    }
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: u64 = digits
        .parse()
        .with_context(|| format!("missing amount in '{raw}'"))?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        other => bail!("unknown duration unit '{other}'"),
    };
    if amount == 0 {
        bail!("duration must be positive");
    }
    let secs = amount
        .checked_mul(multiplier)
        .filter(|secs| *secs <= MAX_DURATION_SECS)
        .with_context(|| format!("duration '{raw}' exceeds ten years"))?;
    Ok(Duration::from_secs(secs))
}
