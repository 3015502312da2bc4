use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::str::FromStr;

use woza_core::impact::{ImpactParams, DEFAULT_FUND_SHARE, DEFAULT_POINTS_PER_KG};
use woza_db::{CollectionRepository, SchemaVersion};

/// Which schema the repository should use. `Auto` probes once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaChoice {
    Auto,
    Fixed(SchemaVersion),
}

impl FromStr for SchemaChoice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(SchemaChoice::Auto);
        }
        let version = s
            .parse::<SchemaVersion>()
            .with_context(|| format!("WOZA_SCHEMA must be auto, current or legacy (got '{}')", s))?;
        Ok(SchemaChoice::Fixed(version))
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub schema: SchemaChoice,
    pub impact: ImpactParams,
    pub bind_addr: String,
    pub s3_endpoint: String,
    pub s3_bucket: String,
    pub s3_region: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env if present

        let fund_share = parse_var("WOZA_FUND_SHARE", DEFAULT_FUND_SHARE)?;
        let points_per_kg = parse_var("WOZA_POINTS_PER_KG", DEFAULT_POINTS_PER_KG)?;

        Ok(Config {
            database_url: env::var("DATABASE_URL").ok(),

            db_max_connections: parse_var("WOZA_DB_MAX_CONNECTIONS", 5)?,

            schema: env::var("WOZA_SCHEMA")
                .unwrap_or_else(|_| "auto".to_string())
                .parse()?,

            impact: ImpactParams::new(fund_share, points_per_kg)
                .context("Invalid impact parameters")?,

            bind_addr: env::var("WOZA_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),

            s3_endpoint: env::var("S3_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),

            s3_bucket: env::var("S3_BUCKET")
                .unwrap_or_else(|_| "woza-photos".to_string()),

            s3_region: env::var("AWS_REGION")
                .unwrap_or_else(|_| "us-east-1".to_string()),
        })
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set")
    }

    pub async fn connect_pool(&self) -> Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .connect(self.require_database_url()?)
            .await
            .context("Failed to connect to database (is Postgres running?)")
    }

    /// Opens the pool and settles the schema layout once, up front.
    pub async fn connect_repository(&self) -> Result<CollectionRepository> {
        let pool = self.connect_pool().await?;

        let repo = match self.schema {
            SchemaChoice::Auto => CollectionRepository::connect_detected(pool)
                .await
                .context("Failed to detect schema layout")?,
            SchemaChoice::Fixed(version) => CollectionRepository::new(pool, version),
        };
        tracing::info!(schema = %repo.schema_version(), "repository ready");
        Ok(repo)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}
