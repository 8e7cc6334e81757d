use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_expiry_hours: i64,
    pub payment_token_ttl_secs: i64,
    /// Compatibility switch: the legacy backend let one successful payment
    /// token back any number of bookings. Off by default.
    pub allow_token_reuse: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "ridesphere.db".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "supersecretkey".to_string()),
            token_expiry_hours: env::var("TOKEN_EXPIRY_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6),
            payment_token_ttl_secs: env::var("PAYMENT_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900),
            allow_token_reuse: env::var("ALLOW_TOKEN_REUSE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}
