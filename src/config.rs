use anyhow::Context;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub pool_size: u32,
    pub log_filter: String,
    pub service_name: String,
}

impl Config {
    pub fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let port = match dotenvy::var("PORT") {
            Ok(port) => port.parse().with_context(|| format!("PORT is not a valid port: {port}"))?,
            Err(_) => DEFAULT_PORT,
        };
        let pool_size = match dotenvy::var("DATABASE_POOL_SIZE") {
            Ok(size) => parse_pool_size(&size)?,
            Err(_) => DEFAULT_POOL_SIZE,
        };
        Ok(Self {
            host: dotenvy::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
            database_url: dotenvy::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            pool_size,
            log_filter: dotenvy::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            service_name: dotenvy::var("SERVICE_NAME").unwrap_or_else(|_| "todo-list".to_string()),
        })
    }
}

fn parse_pool_size(raw: &str) -> anyhow::Result<u32> {
    let size: u32 = raw
        .parse()
        .with_context(|| format!("DATABASE_POOL_SIZE is not a number: {raw}"))?;
    anyhow::ensure!(size > 0, "DATABASE_POOL_SIZE must be at least 1");
    Ok(size)
}
