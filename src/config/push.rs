use std::env;

pub const DEFAULT_EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Clone)]
pub struct PushConfig {
    pub api_url: String,
    /// Optional bearer token for Expo's enhanced push security mode.
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

impl PushConfig {
    /// Read push gateway config from environment variables.
    /// Returns None when push delivery is disabled.
    pub fn from_env() -> Option<Self> {
        if !super::parse_bool_env("PUSH_ENABLED", true) {
            return None;
        }

        let api_url =
            env::var("EXPO_PUSH_URL").unwrap_or_else(|_| DEFAULT_EXPO_PUSH_URL.to_string());
        let access_token = env::var("EXPO_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        let timeout_secs = env::var("PUSH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Some(Self {
            api_url,
            access_token,
            timeout_secs,
        })
    }
}
