use std::time::Duration;

/// Process-wide configuration, loaded once at startup from the
/// environment. Uses a plain `std::env::var(...).expect(...)` style
/// in `main.rs` rather than a config-file format, with `dotenvy`
/// loading a local `.env` first so development doesn't need real
/// exported vars.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,

    pub jwt_secret: String,
    pub jwt_access_expiry: Duration,
    pub jwt_refresh_expiry: Duration,

    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_sender: String,

    pub vnpay_tmn_code: String,
    pub vnpay_hash_secret: String,
    pub vnpay_payment_url: String,
    pub vnpay_return_url: String,

    pub redis_host: Option<String>,
    pub redis_port: Option<u16>,
    pub redis_db: Option<u8>,
    pub redis_password: Option<String>,

    pub cors_origins: Vec<String>,

    pub hold_ttl: Duration,
    pub reaper_period: Duration,
    pub event_bus_queue_bound: usize,
}

fn env_var(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("missing required environment variable {key}"))
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_var_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Loads configuration from the process environment, calling
    /// `dotenvy::dotenv()` first so a local `.env` file is honored in
    /// development without shadowing real exported variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let redis_host = std::env::var("REDIS_HOST").ok();
        let cors_origins = env_var_or("CORS_ORIGINS", "*")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url: env_var("DATABASE_URL").map_err(anyhow::Error::msg)?,

            jwt_secret: env_var("JWT_SECRET").map_err(anyhow::Error::msg)?,
            jwt_access_expiry: Duration::from_secs(env_var_parsed("JWT_ACCESS_EXPIRY_MINUTES", 60u64) * 60),
            jwt_refresh_expiry: Duration::from_secs(env_var_parsed("JWT_REFRESH_EXPIRY_DAYS", 7u64) * 86_400),

            smtp_host: env_var_or("SMTP_HOST", "localhost"),
            smtp_port: env_var_parsed("SMTP_PORT", 587u16),
            smtp_username: env_var_or("SMTP_USERNAME", ""),
            smtp_password: env_var_or("SMTP_PASSWORD", ""),
            smtp_sender: env_var_or("SMTP_SENDER", "no-reply@cinerail.example"),

            vnpay_tmn_code: env_var("VNPAY_TMN_CODE").map_err(anyhow::Error::msg)?,
            vnpay_hash_secret: env_var("VNPAY_HASH_SECRET").map_err(anyhow::Error::msg)?,
            vnpay_payment_url: env_var_or("VNPAY_PAYMENT_URL", "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html"),
            vnpay_return_url: env_var("VNPAY_RETURN_URL").map_err(anyhow::Error::msg)?,

            redis_host,
            redis_port: std::env::var("REDIS_PORT").ok().and_then(|v| v.parse().ok()),
            redis_db: std::env::var("REDIS_DB").ok().and_then(|v| v.parse().ok()),
            redis_password: std::env::var("REDIS_PASSWORD").ok(),

            cors_origins,

            hold_ttl: Duration::from_secs(env_var_parsed("HOLD_TTL_MINUTES", 10u64) * 60),
            reaper_period: Duration::from_secs(env_var_parsed("REAPER_PERIOD_SECONDS", 30u64)),
            event_bus_queue_bound: env_var_parsed("EVENT_BUS_QUEUE_BOUND", 64usize),
        })
    }
}
