use crate::config::push::PushConfig;
use serde::Serialize;
use std::time::Duration;

/// Deep-link tag the passenger app branches on without parsing the body text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PushAction {
    #[serde(rename = "confirmTravel")]
    ConfirmTravel,
    #[serde(rename = "travelConfirmed")]
    TravelConfirmed,
    #[serde(rename = "travelComplete")]
    TravelComplete,
}

#[derive(Debug, Clone, Serialize)]
pub struct PushData {
    pub action: PushAction,
    pub bus_id: i32,
    pub user_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<i32>,
}

/// Wire format of the Expo push gateway.
#[derive(Debug, Serialize)]
struct PushMessage<'a> {
    to: &'a str,
    sound: &'static str,
    title: &'a str,
    body: &'a str,
    data: &'a PushData,
}

/// Expo device tokens look like `ExponentPushToken[xxxxxxxx]`; the legacy
/// `ExpoPushToken[` prefix is still issued to some older clients.
pub fn is_valid_expo_token(token: &str) -> bool {
    (token.starts_with("ExponentPushToken[") || token.starts_with("ExpoPushToken["))
        && token.ends_with(']')
}

#[derive(Clone)]
pub struct PushService {
    client: Option<reqwest::Client>,
    config: Option<PushConfig>,
}

impl PushService {
    /// Build from environment variables. If the gateway is disabled or the
    /// HTTP client cannot be built, sends are silently skipped (graceful
    /// degradation).
    pub fn from_env() -> Self {
        match PushConfig::from_env() {
            Some(cfg) => {
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(cfg.timeout_secs))
                    .build();

                match client {
                    Ok(client) => Self {
                        client: Some(client),
                        config: Some(cfg),
                    },
                    Err(e) => {
                        tracing::warn!("Failed to build push HTTP client: {e}");
                        Self {
                            client: None,
                            config: None,
                        }
                    }
                }
            }
            None => Self {
                client: None,
                config: None,
            },
        }
    }

    /// Returns true if the push gateway is configured and available.
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Ask the passenger to confirm a starting journey.
    pub async fn send_confirm_travel(&self, token: &str, body: &str, data: PushData) {
        self.send(token, "Confirm Your Travel", body, &data).await;
    }

    /// Acknowledge a passenger's confirmation.
    pub async fn send_travel_confirmed(&self, token: &str, data: PushData) {
        self.send(
            token,
            "Travel Confirmed",
            "Thank you for confirming your journey!",
            &data,
        )
        .await;
    }

    /// Tell the passenger their trip is over.
    pub async fn send_travel_completed(&self, token: &str, body: &str, data: PushData) {
        self.send(token, "Travel Completed", body, &data).await;
    }

    /// Fire-and-forget delivery. Failures are logged and absorbed; a status
    /// transition must never fail because the gateway is down.
    pub async fn send(&self, token: &str, title: &str, body: &str, data: &PushData) {
        let (client, config) = match (&self.client, &self.config) {
            (Some(client), Some(config)) => (client, config),
            _ => {
                tracing::debug!("Push gateway not configured, skipping push to user {}", data.user_id);
                return;
            }
        };

        let message = PushMessage {
            to: token,
            sound: "default",
            title,
            body,
            data,
        };

        let mut request = client.post(&config.api_url).json(&message);
        if let Some(access_token) = &config.access_token {
            request = request.bearer_auth(access_token);
        }

        match request.send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!("Push sent to user {}: {}", data.user_id, title);
            }
            Ok(resp) => {
                tracing::warn!(
                    "Push gateway returned {} for user {}",
                    resp.status(),
                    data.user_id
                );
            }
            Err(e) => {
                tracing::warn!("Push delivery failed for user {}: {}", data.user_id, e);
            }
        }
    }
}
