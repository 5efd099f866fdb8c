//! Configuration validation.
//!
//! # Responsibilities
//! - Turn a raw parsed document into a typed `GatewayConfig`
//! - Check required fields, enum membership and route name shape
//! - Enforce route name uniqueness across the whole document
//! - Check provider settings against each provider's key set
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: &Value → Result<GatewayConfig, ConfigValidationError>
//! - Runs before config is accepted into the system

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::schema::{
    GatewayConfig, ModelConfig, Provider, ProviderSettings, RouteConfig, RouteType,
    ANTHROPIC_API_BASE, OPENAI_API_BASE, OPENAI_API_TYPE, OPENAI_API_TYPES, OPENAI_API_VERSION,
};

/// Longest accepted route name.
pub const MAX_ROUTE_NAME_LEN: usize = 128;

const ROOT_KEYS: &[&str] = &["routes"];
const ROUTE_KEYS: &[&str] = &["name", "type", "model"];
const MODEL_KEYS: &[&str] = &["name", "provider", "config"];

/// A single problem found in a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Location inside the document, e.g. `routes[1].model.provider`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in one configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} validation error(s): {}", .issues.len(), render_issues(.issues))]
pub struct ConfigValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Accumulates issues while walking the document.
#[derive(Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validate a raw parsed configuration document.
pub fn validate_config(raw: &Value) -> Result<GatewayConfig, ConfigValidationError> {
    let mut issues = Issues::default();
    let mut routes = Vec::new();

    let Some(root) = raw.as_object() else {
        issues.push("$", "expected a mapping with a 'routes' key");
        return Err(ConfigValidationError { issues: issues.0 });
    };

    check_unknown_keys(root, ROOT_KEYS, "$", &mut issues);

    match root.get("routes") {
        None => issues.push("routes", "missing required field"),
        Some(Value::Array(items)) => {
            let mut seen: HashMap<&str, usize> = HashMap::new();
            for (index, item) in items.iter().enumerate() {
                let path = format!("routes[{index}]");

                if let Some(name) = item.get("name").and_then(Value::as_str) {
                    if let Some(first) = seen.get(name) {
                        issues.push(
                            format!("{path}.name"),
                            format!("duplicate route name '{name}' (first defined at routes[{first}])"),
                        );
                    } else {
                        seen.insert(name, index);
                    }
                }

                if let Some(route) = validate_route(item, &path, &mut issues) {
                    routes.push(route);
                }
            }
        }
        Some(other) => issues.push("routes", format!("expected a list, found {}", kind(other))),
    }

    if !issues.is_empty() {
        return Err(ConfigValidationError { issues: issues.0 });
    }

    Ok(GatewayConfig { routes })
}

/// Check that a name can be used as a single URL path segment.
pub fn is_valid_route_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_ROUTE_NAME_LEN
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn validate_route(item: &Value, path: &str, issues: &mut Issues) -> Option<RouteConfig> {
    let Some(obj) = item.as_object() else {
        issues.push(path, format!("expected a mapping, found {}", kind(item)));
        return None;
    };
    let before = issues.len();

    check_unknown_keys(obj, ROUTE_KEYS, path, issues);

    let name = required_str(obj, "name", path, issues);
    if let Some(name) = name {
        if !is_valid_route_name(name) {
            issues.push(
                format!("{path}.name"),
                format!(
                    "invalid route name '{name}': use 1-{MAX_ROUTE_NAME_LEN} characters from [A-Za-z0-9._-]"
                ),
            );
        }
    }

    let route_type = required_str(obj, "type", path, issues).and_then(|value| {
        let parsed = RouteType::parse(value);
        if parsed.is_none() {
            issues.push(
                format!("{path}.type"),
                format!("unsupported route type '{value}', expected one of {}", route_type_list()),
            );
        }
        parsed
    });

    let model = match obj.get("model") {
        None => {
            issues.push(format!("{path}.model"), "missing required field");
            None
        }
        Some(model) => validate_model(model, &format!("{path}.model"), route_type, issues),
    };

    if issues.len() > before {
        return None;
    }

    Some(RouteConfig {
        name: name?.to_string(),
        route_type: route_type?,
        model: model?,
    })
}

fn validate_model(
    item: &Value,
    path: &str,
    route_type: Option<RouteType>,
    issues: &mut Issues,
) -> Option<ModelConfig> {
    let Some(obj) = item.as_object() else {
        issues.push(path, format!("expected a mapping, found {}", kind(item)));
        return None;
    };

    check_unknown_keys(obj, MODEL_KEYS, path, issues);

    let name = required_str(obj, "name", path, issues);
    if name == Some("") {
        issues.push(format!("{path}.name"), "must not be empty");
    }

    let provider = required_str(obj, "provider", path, issues).and_then(|value| {
        let parsed = Provider::parse(value);
        if parsed.is_none() {
            issues.push(
                format!("{path}.provider"),
                format!("unsupported provider '{value}', expected one of {}", provider_list()),
            );
        }
        parsed
    });

    let config = match obj.get("config") {
        None | Some(Value::Null) => ProviderSettings::new(),
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Some(other) => {
            issues.push(
                format!("{path}.config"),
                format!("expected a mapping, found {}", kind(other)),
            );
            return None;
        }
    };

    let provider = provider?;
    if let Some(route_type) = route_type {
        if !provider.supports(route_type) {
            issues.push(
                format!("{path}.provider"),
                format!("provider '{provider}' does not support route type '{route_type}'"),
            );
        }
    }
    validate_provider_settings(provider, &config, &format!("{path}.config"), issues);

    Some(ModelConfig {
        name: name?.to_string(),
        provider,
        config,
    })
}

fn validate_provider_settings(
    provider: Provider,
    config: &ProviderSettings,
    path: &str,
    issues: &mut Issues,
) {
    for key in provider.required_keys() {
        match config.get(*key) {
            None => issues.push(
                format!("{path}.{key}"),
                format!("missing required setting for provider '{provider}'"),
            ),
            Some(Value::String(s)) if s.trim().is_empty() => {
                issues.push(format!("{path}.{key}"), "must not be empty")
            }
            Some(Value::String(_)) => {}
            Some(other) => issues.push(
                format!("{path}.{key}"),
                format!("expected a string, found {}", kind(other)),
            ),
        }
    }

    for (key, value) in config {
        let known = provider.required_keys().contains(&key.as_str())
            || provider.optional_keys().contains(&key.as_str());
        if !known {
            issues.push(
                format!("{path}.{key}"),
                format!("unknown setting for provider '{provider}'"),
            );
            continue;
        }
        // Required keys were type-checked above.
        if !value.is_string() && !provider.required_keys().contains(&key.as_str()) {
            issues.push(
                format!("{path}.{key}"),
                format!("expected a string, found {}", kind(value)),
            );
        }
    }

    for key in [OPENAI_API_BASE, ANTHROPIC_API_BASE] {
        if let Some(base) = config.get(key).and_then(Value::as_str) {
            let valid = url::Url::parse(base)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !valid {
                issues.push(
                    format!("{path}.{key}"),
                    format!("'{base}' is not a valid http(s) URL"),
                );
            }
        }
    }

    if provider == Provider::OpenAi {
        let api_type = config
            .get(OPENAI_API_TYPE)
            .and_then(Value::as_str)
            .unwrap_or("open_ai");
        if !OPENAI_API_TYPES.contains(&api_type) {
            issues.push(
                format!("{path}.{OPENAI_API_TYPE}"),
                format!(
                    "unsupported value '{api_type}', expected one of {}",
                    OPENAI_API_TYPES.join(", ")
                ),
            );
        } else if api_type != "open_ai" {
            for key in [OPENAI_API_BASE, OPENAI_API_VERSION] {
                if !config.contains_key(key) {
                    issues.push(
                        format!("{path}.{key}"),
                        format!("required when {OPENAI_API_TYPE} is '{api_type}'"),
                    );
                }
            }
        }
    }
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
    issues: &mut Issues,
) -> Option<&'a str> {
    match obj.get(key) {
        None => {
            issues.push(format!("{path}.{key}"), "missing required field");
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(other) => {
            issues.push(
                format!("{path}.{key}"),
                format!("expected a string, found {}", kind(other)),
            );
            None
        }
    }
}

fn check_unknown_keys(obj: &Map<String, Value>, allowed: &[&str], path: &str, issues: &mut Issues) {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            let location = if path == "$" {
                key.clone()
            } else {
                format!("{path}.{key}")
            };
            issues.push(location, "unknown field");
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn route_type_list() -> String {
    RouteType::ALL.map(|t| t.as_str()).join(", ")
}

fn provider_list() -> String {
    Provider::ALL.map(|p| p.as_str()).join(", ")
}
