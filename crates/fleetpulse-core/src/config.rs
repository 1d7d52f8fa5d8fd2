use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    /// IANA name of the declared reporting timezone. Parsed once at startup;
    /// every hour-of-day in the system is in this zone — no downstream
    /// component applies a second offset.
    pub timezone: String,
    pub cache_ttl_secs: u64,
    pub cors_origins: Vec<String>,
    pub duckdb_memory_limit: String,
    /// Serve a clearly-labeled placeholder dataset when the source is down
    /// instead of failing report requests. Intended for demos.
    pub demo_fallback: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("FLEETPULSE_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("FLEETPULSE_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            timezone: std::env::var("FLEETPULSE_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),
            cache_ttl_secs: std::env::var("FLEETPULSE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            cors_origins: std::env::var("FLEETPULSE_CORS_ORIGINS")
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            duckdb_memory_limit: std::env::var("FLEETPULSE_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            demo_fallback: std::env::var("FLEETPULSE_DEMO_FALLBACK")
                .map(|v| v != "false")
                .unwrap_or(true),
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn reporting_timezone(&self) -> Result<chrono_tz::Tz, String> {
        self.timezone
            .parse()
            .map_err(|_| format!("invalid FLEETPULSE_TIMEZONE: {}", self.timezone))
    }
}
