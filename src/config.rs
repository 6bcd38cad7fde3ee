use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    /// SQLite path. `None` leaves the booking store unconfigured.
    pub database_url: Option<String>,
    pub admin_password: Option<String>,
    pub session_secret: Option<String>,
    pub paystack_secret_key: Option<String>,
    pub paystack_base_url: String,
    pub app_url: String,
    pub gateway_timeout_secs: u64,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: non_empty("DATABASE_URL"),
            admin_password: non_empty("ADMIN_PASSWORD"),
            session_secret: non_empty("ADMIN_SESSION_SECRET"),
            paystack_secret_key: non_empty("PAYSTACK_SECRET_KEY"),
            paystack_base_url: non_empty("PAYSTACK_BASE_URL")
                .unwrap_or_else(|| "https://api.paystack.co".to_string()),
            app_url: non_empty("APP_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
            gateway_timeout_secs: env::var("GATEWAY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }

    pub fn payment_callback_url(&self) -> String {
        format!("{}/booking/payment/callback", self.app_url.trim_end_matches('/'))
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
