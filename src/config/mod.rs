use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://mindmap.db?mode=rwc";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub is_dev: bool,
    /// Refuse to fetch previews from hosts resolving to private or loopback addresses.
    pub preview_block_private_networks: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            is_dev: env::var("APP_ENV").as_deref() != Ok("production"),
            preview_block_private_networks: env::var("PREVIEW_BLOCK_PRIVATE_NETWORKS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
