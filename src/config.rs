use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    /// Base URL prepended to modification links embedded in emails.
    pub public_base_url: String,
    /// Validity window for modification tokens, in hours.
    pub token_ttl_hours: i64,
    pub mailer_api_url: String,
    pub mailer_api_key: String,
    pub mailer_from: String,
    pub studio_email: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "bookings.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(48),
            mailer_api_url: env::var("MAILER_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            mailer_api_key: env::var("MAILER_API_KEY").unwrap_or_default(),
            mailer_from: env::var("MAILER_FROM")
                .unwrap_or_else(|_| "bookings@studio.example".to_string()),
            studio_email: env::var("STUDIO_EMAIL")
                .unwrap_or_else(|_| "info@studio.example".to_string()),
        }
    }
}
