use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A route as the gateway exposes it (secrets never included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    #[serde(rename = "type")]
    pub route_type: String,
    pub model: Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub provider: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct RouteList {
    routes: Vec<Route>,
}

#[derive(Deserialize)]
struct RouteEnvelope {
    route: Route,
}

pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Liveness probe; returns the raw `{"status": ...}` body.
    pub async fn health(&self) -> Result<Value, ClientError> {
        let resp = self.client.get(format!("{}/health", self.base_url)).send().await?;
        decode(resp).await
    }

    /// All routes currently served.
    pub async fn search_routes(&self) -> Result<Vec<Route>, ClientError> {
        let resp = self
            .client
            .get(format!("{}/gateway/routes/", self.base_url))
            .send()
            .await?;
        let list: RouteList = decode(resp).await?;
        Ok(list.routes)
    }

    pub async fn get_route(&self, name: &str) -> Result<Route, ClientError> {
        let resp = self
            .client
            .get(format!("{}/gateway/routes/{}", self.base_url, name))
            .send()
            .await?;
        let envelope: RouteEnvelope = decode(resp).await?;
        Ok(envelope.route)
    }

    /// Invoke a route with a provider-shaped JSON payload.
    pub async fn query(&self, name: &str, payload: &Value) -> Result<Value, ClientError> {
        let resp = self
            .client
            .post(format!("{}/gateway/routes/{}", self.base_url, name))
            .json(payload)
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        let detail = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(text);
        return Err(ClientError::Status {
            status: status.as_u16(),
            detail,
        });
    }

    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_deserializes_public_view() {
        let route: Route = serde_json::from_str(
            r#"{"name": "chat", "type": "llm/v1/chat", "model": {"name": "gpt-4", "provider": "openai"}}"#,
        )
        .unwrap();
        assert_eq!(route.route_type, "llm/v1/chat");
        assert_eq!(route.model.provider, "openai");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        assert_eq!(GatewayClient::new("http://localhost:5000/").base_url(), "http://localhost:5000");
    }
}
