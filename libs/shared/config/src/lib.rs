use std::env;

use chrono_tz::Tz;
use tracing::warn;

/// Default per-request timeout for store round trips, in seconds.
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Named timezone all "today" and next-occurrence arithmetic is
    /// anchored to, e.g. "Asia/Beirut". Stored dates are plain
    /// calendar dates in this zone.
    pub clinic_timezone: String,
    pub store_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            clinic_timezone: env::var("CLINIC_TIMEZONE")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_TIMEZONE not set, defaulting to UTC");
                    "UTC".to_string()
                }),
            store_timeout_secs: env::var("STORE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    /// Parse the configured operational timezone, falling back to UTC
    /// on an unknown zone name.
    pub fn timezone(&self) -> Tz {
        self.clinic_timezone.parse().unwrap_or_else(|_| {
            warn!("Unknown timezone '{}', falling back to UTC", self.clinic_timezone);
            Tz::UTC
        })
    }
}
