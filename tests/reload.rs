//! Live reconfiguration against a running gateway.

use std::time::Duration;

use gateway_client::{ClientError, GatewayClient};
use model_gateway::config::schema::GatewaySettings;
use model_gateway::{Gateway, StartupError};

mod common;

const UPSTREAM: &str = "http://127.0.0.1:9/v1";

fn route_names(routes: &[gateway_client::Route]) -> Vec<&str> {
    routes.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn test_valid_update_replaces_routes() {
    let gateway = common::start_gateway(&common::basic_config(UPSTREAM)).await;
    let client = GatewayClient::new(&gateway.url(""));

    let routes = client.search_routes().await.unwrap();
    assert_eq!(route_names(&routes), ["completions-gpt4", "embeddings-gpt4"]);

    common::write_config(&gateway.config_path, &common::update_config(UPSTREAM));
    gateway.wait_for_generation(2).await;

    assert_eq!(client.health().await.unwrap()["status"], "OK");
    let routes = client.search_routes().await.unwrap();
    assert_eq!(route_names(&routes), ["chat-gpt4"]);
    assert_eq!(routes[0].route_type, "llm/v1/chat");
}

#[tokio::test]
async fn test_health_stays_up_during_reloads() {
    let gateway = common::start_gateway(&common::basic_config(UPSTREAM)).await;
    let client = GatewayClient::new(&gateway.url(""));

    let configs = [
        common::update_config(UPSTREAM),
        common::basic_config(UPSTREAM),
        common::update_config(UPSTREAM),
    ];
    for (i, config) in configs.iter().enumerate() {
        common::write_config(&gateway.config_path, config);
        for _ in 0..5 {
            assert_eq!(client.health().await.unwrap()["status"], "OK");
            // Listing is always one of the two complete tables.
            let count = client.search_routes().await.unwrap().len();
            assert!(count == 1 || count == 2, "saw partial table of {count} routes");
        }
        gateway.wait_for_generation(i as u64 + 2).await;
    }
}

#[tokio::test]
async fn test_invalid_update_keeps_previous_routes() {
    let gateway = common::start_gateway(&common::basic_config(UPSTREAM)).await;
    let client = GatewayClient::new(&gateway.url(""));

    common::write_config(&gateway.config_path, common::INVALID_CONFIG);
    // Several poll cycles.
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(gateway.registry.generation(), 1);
    let routes = client.search_routes().await.unwrap();
    assert_eq!(route_names(&routes), ["completions-gpt4", "embeddings-gpt4"]);

    // Fixing the file is picked up.
    common::write_config(&gateway.config_path, &common::update_config(UPSTREAM));
    gateway.wait_for_generation(2).await;
    assert_eq!(route_names(&client.search_routes().await.unwrap()), ["chat-gpt4"]);
}

#[tokio::test]
async fn test_removed_then_recreated_source() {
    let gateway = common::start_gateway(&common::basic_config(UPSTREAM)).await;
    let client = GatewayClient::new(&gateway.url(""));

    std::fs::remove_file(&gateway.config_path).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(client.search_routes().await.unwrap().len(), 2);
    assert_eq!(client.health().await.unwrap()["status"], "OK");

    common::write_config(&gateway.config_path, &common::update_config(UPSTREAM));
    gateway.wait_for_generation(2).await;
    assert_eq!(route_names(&client.search_routes().await.unwrap()), ["chat-gpt4"]);
}

#[tokio::test]
async fn test_removed_route_is_gone_after_reload() {
    let gateway = common::start_gateway(&common::basic_config(UPSTREAM)).await;
    let client = GatewayClient::new(&gateway.url(""));
    assert!(client.get_route("embeddings-gpt4").await.is_ok());

    common::write_config(&gateway.config_path, &common::update_config(UPSTREAM));
    gateway.wait_for_generation(2).await;

    match client.get_route("embeddings-gpt4").await {
        Err(ClientError::Status { status, detail }) => {
            assert_eq!(status, 404);
            assert_eq!(
                detail,
                "The route 'embeddings-gpt4' is not present or active on the server. Please verify the route name."
            );
        }
        other => panic!("expected 404, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_initial_config_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes.yaml");
    std::fs::write(&path, common::INVALID_CONFIG).unwrap();

    let result = Gateway::bootstrap(&path, GatewaySettings::default());
    assert!(matches!(result, Err(StartupError::Config(_))));
}
