//! HTTP tests for the user directory and notify endpoints over an in-memory
//! store and the in-process user events broker.

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use serde_json::{json, Value};
use user_events::USER_EVENTS_TOPIC;
use user_service::handlers;

use common::TestContext;

#[actix_web::test]
async fn create_user_returns_201_with_id() {
    let ctx = TestContext::new();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({"name": "Ana", "email": "ana@example.com", "phone": ""}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["id"].as_i64().is_some());
    assert_eq!(body["name"], "Ana");
    assert_eq!(body["email"], "ana@example.com");
    assert!(body.get("phone").is_none());
}

#[actix_web::test]
async fn create_user_with_duplicate_email_returns_409() {
    let ctx = TestContext::new();
    ctx.seed("Ana", "ana@example.com", None).await;
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({"name": "Another Ana", "email": "ana@example.com"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CONFLICT");
}

#[actix_web::test]
async fn create_user_with_invalid_fields_returns_400() {
    let ctx = TestContext::new();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    for payload in [
        json!({"name": "A", "email": "ana@example.com"}),
        json!({"name": "Ana", "email": "not-an-email"}),
        json!({"name": "Ana", "email": "ana@example.com", "phone": "1".repeat(21)}),
        json!({"email": "ana@example.com"}),
    ] {
        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload: {}", payload);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    assert!(ctx.state.users.list().await.unwrap().is_empty());
}

#[actix_web::test]
async fn create_user_validates_trimmed_name() {
    let ctx = TestContext::new();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    for name in ["  A  ", "     "] {
        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({"name": name, "email": "ana@example.com"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "name: {:?}", name);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    let padded = format!("  {}", "a".repeat(50));
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({"name": padded, "email": " ana@example.com "}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "a".repeat(50));
    assert_eq!(body["email"], "ana@example.com");
}

#[actix_web::test]
async fn update_user_rejects_name_that_trims_too_short() {
    let ctx = TestContext::new();
    let ana = ctx.seed("Ana", "ana@example.com", None).await;
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::put()
        .uri(&format!("/users/{}", ana.id))
        .set_json(json!({"name": "  A  ", "email": "ana@example.com"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.state.users.get(ana.id).await.unwrap().name, "Ana");
}

#[actix_web::test]
async fn get_and_list_users() {
    let ctx = TestContext::new();
    let ana = ctx.seed("Ana", "ana@example.com", Some("555-0100")).await;
    ctx.seed("Bo", "bo@example.com", None).await;
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/users/{}", ana.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["phone"], "555-0100");

    let req = test::TestRequest::get().uri("/users").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn get_unknown_user_returns_404() {
    let ctx = TestContext::new();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/users/999").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_web::test]
async fn update_user_replaces_fields() {
    let ctx = TestContext::new();
    let ana = ctx.seed("Ana", "ana@example.com", Some("555-0100")).await;
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::put()
        .uri(&format!("/users/{}", ana.id))
        .set_json(json!({"name": "Ana Maria", "email": "ana.maria@example.com"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], ana.id);
    assert_eq!(body["name"], "Ana Maria");
    assert_eq!(body["email"], "ana.maria@example.com");
    assert!(body.get("phone").is_none());
}

#[actix_web::test]
async fn update_user_conflicts_and_missing() {
    let ctx = TestContext::new();
    let ana = ctx.seed("Ana", "ana@example.com", None).await;
    ctx.seed("Bo", "bo@example.com", None).await;
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::put()
        .uri(&format!("/users/{}", ana.id))
        .set_json(json!({"name": "Ana", "email": "bo@example.com"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CONFLICT
    );

    // Keeping one's own email is not a conflict.
    let req = test::TestRequest::put()
        .uri(&format!("/users/{}", ana.id))
        .set_json(json!({"name": "Ana B", "email": "ana@example.com"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::put()
        .uri("/users/999")
        .set_json(json!({"name": "Nobody", "email": "nobody@example.com"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn delete_user_returns_204_then_404() {
    let ctx = TestContext::new();
    let ana = ctx.seed("Ana", "ana@example.com", None).await;
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let uri = format!("/users/{}", ana.id);
    let req = test::TestRequest::delete().uri(&uri).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get().uri(&uri).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::delete().uri(&uri).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn notify_publishes_record_keyed_by_id() {
    let ctx = TestContext::new();
    let ana = ctx.seed("Ana", "ana@example.com", Some("")).await;
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/users/{}/notify", ana.id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user_id"], ana.id);
    assert_eq!(body["topic"], USER_EVENTS_TOPIC);

    let messages = ctx.broker.messages(USER_EVENTS_TOPIC);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].key, Some(ana.id.to_string()));

    let record = user_events::decode(&messages[0].payload).unwrap();
    assert_eq!(record.id, Some(ana.id));
    assert_eq!(record.name, "Ana");
    assert_eq!(record.phone, None);
}

#[actix_web::test]
async fn notify_unknown_user_returns_404_without_publishing() {
    let ctx = TestContext::new();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post().uri("/users/999/notify").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.broker.send_calls(), 0);
}

#[actix_web::test]
async fn notify_returns_500_when_publish_fails() {
    let ctx = TestContext::new();
    let ana = ctx.seed("Ana", "ana@example.com", None).await;
    ctx.broker.set_fail_sends(true);
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/users/{}/notify", ana.id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "EVENT_PUBLISH_ERROR");
    assert!(ctx.broker.messages(USER_EVENTS_TOPIC).is_empty());
}

#[actix_web::test]
async fn health_reports_store_status() {
    let ctx = TestContext::new();
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");

    ctx.store.set_unhealthy(true);
    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "unhealthy");
}

#[actix_web::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let ctx = TestContext::new();
    let ana = ctx.seed("Ana", "ana@example.com", None).await;
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/users/{}/notify", ana.id))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("user_events_published_total"));
}
