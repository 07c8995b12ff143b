use std::env;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} is missing (set it in the environment or .env)")]
    MissingVar(&'static str),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub bot_token: String,
    pub etherscan_api_key: Option<String>,

    pub static_dir: String,
}

impl Settings {
    pub fn index_file(&self) -> String {
        format!("{}/index.html", self.static_dir.trim_end_matches('/'))
    }
}

pub fn load() -> Result<Settings, ConfigError> {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    load_from(|name| env::var(name).ok())
}

pub fn load_from(var: impl Fn(&str) -> Option<String>) -> Result<Settings, ConfigError> {
    let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

    let bot_token = non_empty("BOT_TOKEN").ok_or(ConfigError::MissingVar("BOT_TOKEN"))?;

    let etherscan_api_key = non_empty("ETHERSCAN_API_KEY");

    let host = non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

    let port = var("PORT")
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let static_dir = non_empty("STATIC_DIR").unwrap_or_else(|| "static".to_string());

    Ok(Settings {
        host,
        port,
        bot_token,
        etherscan_api_key,
        static_dir,
    })
}
