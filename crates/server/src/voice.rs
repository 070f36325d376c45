//! Credential relay for the external conversational voice service.
//!
//! The browser never sees the API key: it asks this server for a short-lived
//! signed URL or conversation token, and the server makes the upstream call
//! with the key attached. Transport signaling and audio stay between the
//! browser and the voice service.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use smartmenu_agent::build_menu_context;
use smartmenu_core::config::VoiceConfig;
use smartmenu_core::Catalog;

#[derive(Clone)]
pub struct VoiceState {
    config: VoiceConfig,
    catalog: Arc<Catalog>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
pub struct VoiceError {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SignedUrlResponse {
    pub signed_url: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub context: String,
}

impl VoiceState {
    pub fn new(config: VoiceConfig, catalog: Arc<Catalog>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { config, catalog, client }
    }

    fn credentials(&self) -> Result<(&str, String), (StatusCode, Json<VoiceError>)> {
        if !self.config.enabled {
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(VoiceError { error: "voice assistant is disabled".to_string() }),
            ));
        }
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(VoiceError { error: "voice api key not configured".to_string() }),
            )
        })?;
        let agent_id = self.config.agent_id.clone().ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(VoiceError { error: "voice agent id not configured".to_string() }),
            )
        })?;
        Ok((api_key.expose_secret(), agent_id))
    }

    async fn relay(
        &self,
        upstream_path: &str,
        response_field: &str,
    ) -> Result<String, (StatusCode, Json<VoiceError>)> {
        let (api_key, agent_id) = self.credentials()?;
        let url =
            format!("{}/{}?agent_id={}", self.config.base_url.trim_end_matches('/'), upstream_path, agent_id);

        let mut last_error = String::new();
        for attempt in 0..=self.config.max_retries {
            let response = self.client.get(&url).header("xi-api-key", api_key).send().await;

            match response {
                Ok(response) if response.status().is_success() => {
                    let payload: Value = response.json().await.map_err(|err| {
                        upstream_failure(format!("malformed upstream response: {err}"))
                    })?;
                    return payload
                        .get(response_field)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| {
                            upstream_failure(format!(
                                "upstream response missing `{response_field}`"
                            ))
                        });
                }
                Ok(response) => {
                    last_error = format!("upstream status {}", response.status());
                }
                Err(err) => {
                    last_error = err.to_string();
                }
            }
            info!(
                event_name = "voice.relay.retry",
                attempt = attempt + 1,
                error = %last_error,
                "voice credential request failed"
            );
        }

        error!(event_name = "voice.relay.failed", error = %last_error, "giving up on voice relay");
        Err(upstream_failure(last_error))
    }
}

fn upstream_failure(message: String) -> (StatusCode, Json<VoiceError>) {
    (StatusCode::BAD_GATEWAY, Json(VoiceError { error: message }))
}

pub fn router(state: VoiceState) -> Router {
    Router::new()
        .route("/api/v1/voice/signed-url", get(signed_url))
        .route("/api/v1/voice/token", get(token))
        .route("/api/v1/voice/context", get(context))
        .with_state(state)
}

async fn signed_url(
    State(state): State<VoiceState>,
) -> Result<Json<SignedUrlResponse>, (StatusCode, Json<VoiceError>)> {
    let signed_url =
        state.relay("v1/convai/conversation/get-signed-url", "signed_url").await?;
    Ok(Json(SignedUrlResponse { signed_url }))
}

async fn token(
    State(state): State<VoiceState>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<VoiceError>)> {
    let token = state.relay("v1/convai/conversation/token", "token").await?;
    Ok(Json(TokenResponse { token }))
}

/// Grounding blob the voice client pushes into a fresh conversation.
async fn context(State(state): State<VoiceState>) -> Json<ContextResponse> {
    Json(ContextResponse { context: build_menu_context(&state.catalog) })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use smartmenu_core::config::VoiceConfig;
    use smartmenu_core::Catalog;

    use super::{router, VoiceState};

    fn disabled_state() -> VoiceState {
        VoiceState::new(
            VoiceConfig {
                enabled: false,
                api_key: None,
                agent_id: None,
                base_url: "https://api.elevenlabs.io".to_string(),
                timeout_secs: 5,
                max_retries: 0,
            },
            Arc::new(Catalog::builtin()),
        )
    }

    async fn send(state: VoiceState, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).expect("request");
        let response = router(state).oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn credential_routes_refuse_when_voice_is_disabled() {
        let (status, body) = send(disabled_state(), "/api/v1/voice/signed-url").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().expect("error").contains("disabled"));

        let (status, _) = send(disabled_state(), "/api/v1/voice/token").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn context_is_served_even_without_credentials() {
        let (status, body) = send(disabled_state(), "/api/v1/voice/context").await;
        assert_eq!(status, StatusCode::OK);
        let context = body["context"].as_str().expect("context");
        assert!(context.contains("МЕНЮ РЕСТОРАНА"));
        assert!(context.contains("(id:h1, 7000₸)"));
    }
}
