//! Anthropic Messages API adapter.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::schema::{
    Provider, RouteConfig, RouteType, ANTHROPIC_API_BASE, ANTHROPIC_API_KEY, ANTHROPIC_VERSION,
};
use crate::providers::{
    payload_object, read_response, resolve_secret, ProviderAdapter, ProviderError, ProviderResponse,
};

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_VERSION: &str = "2023-06-01";

/// The Messages API requires `max_tokens`.
const DEFAULT_MAX_TOKENS: u64 = 1024;

pub struct AnthropicAdapter {
    client: reqwest::Client,
}

impl AnthropicAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn invoke(&self, route: &RouteConfig, payload: Value) -> Result<ProviderResponse, ProviderError> {
        let model = &route.model;
        let mut body = payload_object(payload)?;

        match route.route_type {
            RouteType::Chat => {}
            RouteType::Completions => {
                // A completion prompt becomes a single user turn.
                let prompt = match body.remove("prompt") {
                    Some(Value::String(prompt)) => prompt,
                    _ => {
                        return Err(ProviderError::InvalidPayload(
                            "'prompt' must be a string".to_string(),
                        ))
                    }
                };
                body.insert(
                    "messages".to_string(),
                    json!([{"role": "user", "content": prompt}]),
                );
            }
            RouteType::Embeddings => {
                return Err(ProviderError::UnsupportedRouteType {
                    provider: Provider::Anthropic,
                    route_type: route.route_type,
                })
            }
        }

        body.insert("model".to_string(), Value::String(model.name.clone()));
        body.entry("max_tokens")
            .or_insert_with(|| Value::from(DEFAULT_MAX_TOKENS));

        let api_key = model
            .setting(ANTHROPIC_API_KEY)
            .ok_or(ProviderError::MissingSetting(ANTHROPIC_API_KEY))?;
        let api_key = resolve_secret(api_key)?;
        let base = model
            .setting(ANTHROPIC_API_BASE)
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');
        let version = model.setting(ANTHROPIC_VERSION).unwrap_or(DEFAULT_VERSION);

        tracing::debug!(route = %route.name, model = %model.name, "Calling Anthropic");
        let response = self
            .client
            .post(format!("{base}/messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", version)
            .json(&body)
            .send()
            .await?;
        read_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ModelConfig, ProviderSettings};
    use crate::providers::testing::spawn_echo_upstream;

    fn route(route_type: RouteType, base: &str) -> RouteConfig {
        let mut config = ProviderSettings::new();
        config.insert(ANTHROPIC_API_KEY.into(), json!("ant-key"));
        config.insert(ANTHROPIC_API_BASE.into(), json!(base));
        RouteConfig {
            name: "claude".into(),
            route_type,
            model: ModelConfig {
                name: "claude-3-haiku".into(),
                provider: Provider::Anthropic,
                config,
            },
        }
    }

    #[tokio::test]
    async fn test_completion_becomes_message() {
        let base = spawn_echo_upstream().await;
        let adapter = AnthropicAdapter::new(reqwest::Client::new());

        let response = adapter
            .invoke(&route(RouteType::Completions, &base), json!({"prompt": "hello", "temperature": 0.2}))
            .await
            .unwrap();

        let echoed = response.body;
        assert_eq!(echoed["request"]["path"], "/messages");
        assert_eq!(echoed["request"]["x_api_key"], "ant-key");
        assert_eq!(echoed["request"]["anthropic_version"], DEFAULT_VERSION);
        assert_eq!(echoed["body"]["messages"], json!([{"role": "user", "content": "hello"}]));
        assert_eq!(echoed["body"]["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(echoed["body"]["model"], "claude-3-haiku");
        assert!(echoed["body"].get("prompt").is_none());
    }

    #[tokio::test]
    async fn test_chat_keeps_caller_max_tokens() {
        let base = spawn_echo_upstream().await;
        let adapter = AnthropicAdapter::new(reqwest::Client::new());

        let response = adapter
            .invoke(
                &route(RouteType::Chat, &base),
                json!({"messages": [{"role": "user", "content": "hi"}], "max_tokens": 5}),
            )
            .await
            .unwrap();
        assert_eq!(response.body["body"]["max_tokens"], 5);
    }

    #[tokio::test]
    async fn test_rejects_bad_payloads() {
        let adapter = AnthropicAdapter::new(reqwest::Client::new());
        let base = "http://127.0.0.1:9";

        let err = adapter
            .invoke(&route(RouteType::Completions, base), json!({"input": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidPayload(_)));

        let err = adapter
            .invoke(&route(RouteType::Embeddings, base), json!({"input": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedRouteType { .. }));
    }
}
