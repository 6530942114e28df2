use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with, MockConfig, ACCESS_TOKEN};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn authed(method: &str, uri: &str) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {ACCESS_TOKEN}"))
}

fn get(uri: &str) -> Request<String> {
    authed("GET", uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    authed(method, uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn send(app: &Router, req: Request<String>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

// --- guard ---

#[tokio::test]
async fn missing_token_is_unauthenticated() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/tags").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["message"], "Unauthenticated.");
}

#[tokio::test]
async fn wrong_token_is_unauthenticated() {
    let req = Request::builder()
        .uri("/api/tags")
        .header(http::header::AUTHORIZATION, "Bearer nope")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn responses_carry_rate_headers() {
    let resp = app().oneshot(get("/api/genders")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-ratelimit-limit"], "60");
    assert_eq!(resp.headers()["x-ratelimit-remaining"], "59");
}

#[tokio::test]
async fn exhausted_limit_returns_429_with_retry_after() {
    let app = app_with(MockConfig {
        rate_limit: 2,
        ..MockConfig::default()
    });
    for remaining in ["1", "0"] {
        let resp = send(&app, get("/api/tags")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-ratelimit-remaining"], remaining);
    }
    let resp = send(&app, get("/api/tags")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.headers()["x-ratelimit-remaining"], "0");
    let retry: u64 = resp.headers()["retry-after"].to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry));
    assert_eq!(body_bytes(resp).await, "Too Many Attempts.");
}

// --- reference data ---

#[tokio::test]
async fn genders_are_seeded_with_unix_seconds() {
    let resp = app().oneshot(get("/api/genders?limit=2")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["name"], "Man");
    assert!(body["data"][0]["created_at"].is_i64());
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["last_page"], 2);
    assert_eq!(body["meta"]["per_page"], 2);
}

#[tokio::test]
async fn countries_are_keyed_by_code() {
    let body = body_json(app().oneshot(get("/api/countries")).await.unwrap()).await;
    assert_eq!(body["data"]["US"]["name"], "United States");
    assert!(body.get("meta").is_none());
}

#[tokio::test]
async fn field_types_use_type_key() {
    let body = body_json(app().oneshot(get("/api/contactfieldtypes/1")).await.unwrap()).await;
    assert_eq!(body["data"]["type"], "email");
    assert_eq!(body["data"]["protocol"], "mailto:");
    assert_eq!(body["data"]["delible"], false);
}

#[tokio::test]
async fn limit_above_maximum_is_rejected() {
    let resp = app().oneshot(get("/api/tags?limit=500")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- errors ---

#[tokio::test]
async fn missing_resource_has_monica_error_body() {
    let resp = app().oneshot(get("/api/tags/99")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["error_code"], 31);
    assert_eq!(body["error"]["message"], "The resource has not been found");
}

#[tokio::test]
async fn non_numeric_id_returns_400() {
    let resp = app().oneshot(get("/api/tags/not-a-number")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_tag_name_is_unprocessable() {
    let resp = app()
        .oneshot(json_request("POST", "/api/tags", r#"{"name":"  "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["error_code"], 32);
}

// --- lifecycles ---

#[tokio::test]
async fn tag_lifecycle() {
    let app = app();

    let resp = send(&app, json_request("POST", "/api/tags", r#"{"name":"Old Friends"}"#)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    let id = created["data"]["id"].as_u64().unwrap();
    assert_eq!(created["data"]["name_slug"], "old-friends");
    assert!(created["data"]["created_at"].is_string());

    let resp = send(&app, json_request("PUT", &format!("/api/tags/{id}"), r#"{"name":"work"}"#)).await;
    assert_eq!(body_json(resp).await["data"]["name"], "work");

    let resp = send(&app, authed("DELETE", &format!("/api/tags/{id}")).body(String::new()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["deleted"], true);
    assert_eq!(body["id"], id);

    let resp = send(&app, get(&format!("/api/tags/{id}"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_lifecycle() {
    let app = app();

    let resp = send(
        &app,
        json_request("POST", "/api/contacts", r#"{"first_name":"Ada","last_name":"Lovelace","gender_id":2}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let contact = body_json(resp).await;
    let id = contact["data"]["id"].as_u64().unwrap();
    assert_eq!(contact["data"]["gender"], "Woman");
    assert!(contact["data"].get("gender_id").is_none());

    let resp = send(&app, json_request("PUT", &format!("/api/contacts/{id}/work"), r#"{"job":"Analyst"}"#)).await;
    let body = body_json(resp).await;
    assert_eq!(body["data"]["information"]["career"]["job"], "Analyst");
    assert!(body["data"]["information"]["career"]["company"].is_null());

    let resp = send(
        &app,
        json_request("POST", &format!("/api/contacts/{id}/setTags"), r#"{"tags":["math","history"]}"#),
    )
    .await;
    let body = body_json(resp).await;
    assert_eq!(body["data"]["tags"].as_array().unwrap().len(), 2);

    let body = body_json(send(&app, get("/api/contacts?query=love")).await).await;
    assert_eq!(body["meta"]["total"], 1);
    let body = body_json(send(&app, get("/api/contacts?query=babbage")).await).await;
    assert_eq!(body["meta"]["total"], 0);

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/contactfields",
            &format!(r#"{{"contact_field_type_id":1,"contact_id":{id},"data":"ada@example.com"}}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let field = body_json(resp).await;
    assert!(field["data"]["created_at"].as_i64().unwrap() > 1_000_000_000_000);
    assert_eq!(field["data"]["contact"]["id"], id);

    let body = body_json(send(&app, get(&format!("/api/contacts/{id}/contactfields"))).await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = send(&app, authed("DELETE", &format!("/api/contacts/{id}")).body(String::new()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&app, get(&format!("/api/contacts/{id}/contactfields"))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_with_unknown_gender_is_unprocessable() {
    let resp = app()
        .oneshot(json_request("POST", "/api/contacts", r#"{"first_name":"Ada","gender_id":42}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
