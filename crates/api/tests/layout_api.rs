//! Integration tests for `POST /api/v1/layout`.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{body_json, build_test_app, circle_worker, failing_worker, post_json, post_raw};

fn fixture() -> serde_json::Value {
    json!({
        "nodes": [
            { "id": "a", "group": 1 },
            { "id": "b", "group": 1 },
            { "id": "c", "group": 2 }
        ],
        "links": [
            { "source": 0, "target": 1, "weight": 3 },
            { "source": "1", "target": 2 }
        ],
        "directed": false
    })
}

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn layout_returns_graph_with_coordinates() {
    let app = build_test_app(&[circle_worker().await]).await;

    let response = post_json(
        app.router.clone(),
        "/api/v1/layout",
        json!({ "graph": fixture(), "settings": { "optimalDistance": 10 } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let graph = &json["data"];
    let nodes = graph["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(graph["links"].as_array().unwrap().len(), 2);
    for node in nodes {
        assert!(node["x"].is_f64());
        assert!(node["y"].is_f64());
    }
    assert_eq!(nodes[0]["x"], 10.0);
    assert_eq!(nodes[2]["group"], 2);
    assert_eq!(graph["links"][0]["weight"], 3);
    assert_eq!(graph["directed"], false);

    app.pool.shutdown().await;
}

#[tokio::test]
async fn settings_are_optional() {
    let app = build_test_app(&[circle_worker().await]).await;

    let response = post_json(
        app.router.clone(),
        "/api/v1/layout",
        json!({ "graph": fixture() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["nodes"][0]["x"], 200.0);

    app.pool.shutdown().await;
}

#[tokio::test]
async fn null_and_zero_settings_fall_back_to_defaults() {
    let app = build_test_app(&[circle_worker().await]).await;

    let response = post_json(
        app.router.clone(),
        "/api/v1/layout",
        json!({
            "graph": fixture(),
            "settings": { "optimalDistance": 0, "iterations": null, "saveSvg": null }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["nodes"][0]["x"], 200.0);

    app.pool.shutdown().await;
}

// ---------------------------------------------------------------------------
// Invalid input
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_graph_returns_400() {
    let app = build_test_app(&[circle_worker().await]).await;

    let response = post_json(app.router.clone(), "/api/v1/layout", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
    assert_eq!(json["error"], "Graph is not defined");

    app.pool.shutdown().await;
}

#[tokio::test]
async fn graph_without_links_returns_400() {
    let app = build_test_app(&[circle_worker().await]).await;

    let response = post_json(
        app.router.clone(),
        "/api/v1/layout",
        json!({ "graph": { "nodes": [] } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_INPUT");

    app.pool.shutdown().await;
}

#[tokio::test]
async fn out_of_range_link_returns_400() {
    let app = build_test_app(&[circle_worker().await]).await;

    let response = post_json(
        app.router.clone(),
        "/api/v1/layout",
        json!({ "graph": { "nodes": [{}, {}], "links": [{ "source": 0, "target": 2 }] } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");
    assert!(json["error"].as_str().unwrap().contains("out of range"));

    app.pool.shutdown().await;
}

#[tokio::test]
async fn malformed_json_returns_400() {
    let app = build_test_app(&[circle_worker().await]).await;

    let response = post_raw(app.router.clone(), "/api/v1/layout", "{ not json".to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

    app.pool.shutdown().await;
}

// ---------------------------------------------------------------------------
// Worker failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn worker_error_body_is_passed_through() {
    let port = failing_worker(StatusCode::INTERNAL_SERVER_ERROR, "layout engine crashed").await;
    let app = build_test_app(&[port]).await;

    let response = post_json(
        app.router.clone(),
        "/api/v1/layout",
        json!({ "graph": fixture() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = body_json(response).await;
    assert_eq!(json["code"], "WORKER_ERROR");
    assert_eq!(json["error"], "layout engine crashed");

    let health = app.pool.status();
    assert_eq!(health.workers[0].jobs_failed, 1);
    app.pool.shutdown().await;
}
