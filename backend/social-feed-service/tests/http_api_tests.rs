//! HTTP surface: routing, auth and status mapping

mod common;

use actix_web::{http::StatusCode, test, App};
use common::{mint_token, TestContext, TEST_JWT_SECRET};
use serde_json::{json, Value};
use social_feed_service::config::FeedConfig;
use social_feed_service::handlers::{self, AppState};
use uuid::Uuid;

fn state_for(ctx: &TestContext) -> AppState {
    AppState::new(
        &ctx.stores,
        ctx.media.clone(),
        FeedConfig::default(),
        TEST_JWT_SECRET,
    )
}

fn bearer(user_id: Uuid) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", mint_token(user_id)))
}

#[actix_web::test]
async fn test_health_is_public() {
    let ctx = TestContext::new();
    let state = state_for(&ctx);
    let app = test::init_service(App::new().configure(|cfg| handlers::configure(cfg, &state))).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_api_requires_bearer_token() {
    let ctx = TestContext::new();
    let state = state_for(&ctx);
    let app = test::init_service(App::new().configure(|cfg| handlers::configure(cfg, &state))).await;

    let req = test::TestRequest::get().uri("/api/posts/all").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/notifications")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[actix_web::test]
async fn test_like_comment_and_delete_flow() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    let post = ctx.post(&alice, "hello", 0).await;
    let state = state_for(&ctx);
    let app = test::init_service(App::new().configure(|cfg| handlers::configure(cfg, &state))).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/like/{}", post.id))
        .insert_header(bearer(bob.id))
        .to_request();
    let likes: Vec<Uuid> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(likes, vec![bob.id]);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/comment/{}", post.id))
        .insert_header(bearer(bob.id))
        .set_json(json!({ "text": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/comment/{}", post.id))
        .insert_header(bearer(bob.id))
        .set_json(json!({ "text": "nice" }))
        .to_request();
    let comment: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(comment["text"], "nice");
    assert_eq!(comment["user"]["username"], "bob");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(bob.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(alice.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Post deleted successfully");

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/like/{}", post.id))
        .insert_header(bearer(bob.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_follow_accepts_get_and_post() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    let state = state_for(&ctx);
    let app = test::init_service(App::new().configure(|cfg| handlers::configure(cfg, &state))).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/follow/{}", bob.id))
        .insert_header(bearer(alice.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["following"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/follow/{}", bob.id))
        .insert_header(bearer(alice.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["following"], false);

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/follow/{}", alice.id))
        .insert_header(bearer(alice.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_create_post_and_read_feeds() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let state = state_for(&ctx);
    let app = test::init_service(App::new().configure(|cfg| handlers::configure(cfg, &state))).await;

    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(alice.id))
        .set_json(json!({ "text": "first post" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(alice.id))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/posts/all?limit=10")
        .insert_header(bearer(alice.id))
        .to_request();
    let posts: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["text"], "first post");
    assert_eq!(posts[0]["user"]["username"], "alice");

    let req = test::TestRequest::get()
        .uri("/api/posts/user/alice")
        .insert_header(bearer(alice.id))
        .to_request();
    let posts: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(posts.len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/posts/following")
        .insert_header(bearer(alice.id))
        .to_request();
    let posts: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(posts.is_empty());
}

#[actix_web::test]
async fn test_notifications_list_and_delete() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    ctx.interactions.toggle_follow(bob.id, alice.id).await.unwrap();
    let state = state_for(&ctx);
    let app = test::init_service(App::new().configure(|cfg| handlers::configure(cfg, &state))).await;

    let req = test::TestRequest::get()
        .uri("/api/notifications")
        .insert_header(bearer(alice.id))
        .to_request();
    let list: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["type"], "follow");
    assert_eq!(list[0]["read"], false);
    assert_eq!(list[0]["from"]["username"], "bob");

    let req = test::TestRequest::delete()
        .uri("/api/notifications")
        .insert_header(bearer(alice.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/notifications")
        .insert_header(bearer(alice.id))
        .to_request();
    let list: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(list.is_empty());
}

#[actix_web::test]
async fn test_profile_and_suggested() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    ctx.user("bob").await;
    let state = state_for(&ctx);
    let app = test::init_service(App::new().configure(|cfg| handlers::configure(cfg, &state))).await;

    let req = test::TestRequest::get()
        .uri("/api/users/profile/bob")
        .insert_header(bearer(alice.id))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["username"], "bob");
    assert!(profile.get("passwordHash").is_none());
    assert!(profile.get("email").is_none());

    let req = test::TestRequest::get()
        .uri("/api/users/profile/ghost")
        .insert_header(bearer(alice.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/users/suggested")
        .insert_header(bearer(alice.id))
        .to_request();
    let suggested: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(suggested.len(), 1);
    assert_eq!(suggested[0]["username"], "bob");
}
