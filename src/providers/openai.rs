//! OpenAI and Azure OpenAI adapter.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::schema::{
    Provider, RouteConfig, RouteType, OPENAI_API_BASE, OPENAI_API_KEY, OPENAI_API_TYPE,
    OPENAI_API_VERSION, OPENAI_DEPLOYMENT_NAME, OPENAI_ORGANIZATION,
};
use crate::providers::{
    payload_object, read_response, resolve_secret, ProviderAdapter, ProviderError, ProviderResponse,
};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAiAdapter {
    client: reqwest::Client,
}

impl OpenAiAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn endpoint(route_type: RouteType) -> &'static str {
    match route_type {
        RouteType::Completions => "completions",
        RouteType::Chat => "chat/completions",
        RouteType::Embeddings => "embeddings",
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn invoke(&self, route: &RouteConfig, payload: Value) -> Result<ProviderResponse, ProviderError> {
        let model = &route.model;
        let mut body = payload_object(payload)?;

        let api_key = model
            .setting(OPENAI_API_KEY)
            .ok_or(ProviderError::MissingSetting(OPENAI_API_KEY))?;
        let api_key = resolve_secret(api_key)?;
        let base = model
            .setting(OPENAI_API_BASE)
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');
        let path = endpoint(route.route_type);

        let request = match model.setting(OPENAI_API_TYPE).unwrap_or("open_ai") {
            "open_ai" => {
                // The route decides the model, not the caller.
                body.insert("model".to_string(), Value::String(model.name.clone()));
                let mut request = self
                    .client
                    .post(format!("{base}/{path}"))
                    .bearer_auth(api_key);
                if let Some(organization) = model.setting(OPENAI_ORGANIZATION) {
                    request = request.header("OpenAI-Organization", organization);
                }
                request
            }
            api_type => {
                let version = model
                    .setting(OPENAI_API_VERSION)
                    .ok_or(ProviderError::MissingSetting(OPENAI_API_VERSION))?;
                let deployment = model
                    .setting(OPENAI_DEPLOYMENT_NAME)
                    .unwrap_or(model.name.as_str());
                let request = self
                    .client
                    .post(format!("{base}/openai/deployments/{deployment}/{path}"))
                    .query(&[("api-version", version)]);
                if api_type == "azuread" {
                    request.bearer_auth(api_key)
                } else {
                    request.header("api-key", api_key)
                }
            }
        };

        tracing::debug!(route = %route.name, model = %model.name, endpoint = path, "Calling OpenAI");
        let response = request.json(&body).send().await?;
        read_response(response).await
    }
}
