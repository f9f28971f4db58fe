use std::collections::HashMap;
use std::env::var;

use dotenvy::dotenv;

/// Which message formatter the pipeline renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterKind {
    Standard,
    Arabic,
}

pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub bot_token: String,
    pub webhook_api_key: String,
    /// City id → channel handle, from CITY_CHANNELS as JSON
    /// (e.g. `{"1":"@baghdad_listings"}`).
    pub city_channels: HashMap<String, String>,
    pub formatter: FormatterKind,
    pub rate_limit_per_window: u32,
    pub rate_limit_window_secs: u64,
    pub rate_limit_burst: u32,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub queue_capacity: usize,
    pub queue_workers: usize,
    pub batch_parallelism: usize,
}

impl Config {
    pub fn try_parse() -> Result<Config, String> {
        let _ = dotenv();

        Ok(Config {
            port: require("PORT")?
                .parse::<u16>()
                .map_err(|_| "An error occured while parsing PORT env param".to_string())?,
            scheme: optional("SCHEME", "http"),
            host: optional("HOST", "localhost"),
            bot_token: require("BOT_TOKEN")?,
            webhook_api_key: require("WEBHOOK_API_KEY")?,
            city_channels: parse_city_channels(&require("CITY_CHANNELS")?)?,
            formatter: match optional("MESSAGE_FORMATTER", "arabic").as_str() {
                "standard" => FormatterKind::Standard,
                "arabic" => FormatterKind::Arabic,
                other => {
                    return Err(format!("Unknown MESSAGE_FORMATTER value: {other}"));
                }
            },
            rate_limit_per_window: parse_or("RATE_LIMIT_REQUESTS", 19)?,
            rate_limit_window_secs: parse_or("RATE_LIMIT_PERIOD", 60)?,
            rate_limit_burst: parse_or("RATE_LIMIT_BURST", 5)?,
            retry_max_attempts: parse_or("MAX_RETRIES", 3)?,
            retry_base_delay_ms: parse_or("RETRY_BASE_DELAY_MS", 1000)?,
            retry_max_delay_ms: parse_or("RETRY_MAX_DELAY_MS", 30_000)?,
            queue_capacity: parse_or("QUEUE_CAPACITY", 256)?,
            queue_workers: parse_or("QUEUE_WORKERS", 4)?,
            batch_parallelism: parse_or("BATCH_PARALLELISM", 4)?,
        })
    }
}

fn require(name: &str) -> Result<String, String> {
    var(name).map_err(|_| format!("An error occured while getting {name} env param"))
}

fn optional(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("An error occured while parsing {name} env param")),
        Err(_) => Ok(default),
    }
}

fn parse_city_channels(raw: &str) -> Result<HashMap<String, String>, String> {
    let parsed: HashMap<String, serde_json::Value> = serde_json::from_str(raw)
        .map_err(|_| "An error occured while parsing CITY_CHANNELS env param".to_string())?;
    Ok(parsed
        .into_iter()
        .map(|(city_id, handle)| {
            let handle = match handle {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (city_id, handle)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_channels_accepts_string_and_numeric_handles() {
        let parsed =
            parse_city_channels(r#"{"1":"@baghdad_listings","2":-1001234567890}"#).unwrap();
        assert_eq!(parsed["1"], "@baghdad_listings");
        assert_eq!(parsed["2"], "-1001234567890");
    }

    #[test]
    fn city_channels_rejects_malformed_json() {
        assert!(parse_city_channels("not json").is_err());
    }
}
