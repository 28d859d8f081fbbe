mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::*;
use foodgram::api;
use foodgram::infrastructure::AppState;
use foodgram::models::ListKind;
use foodgram::services::toggle_add;
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

fn app(state: AppState) -> Router {
    Router::new().nest("/api", api::api_router(state))
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Vec<u8>, header::HeaderMap) {
    let response = app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, body, headers)
}

async fn send_json(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body, _) = send(state, request).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn authed(method: &str, uri: &str, user_id: i32) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Token {}", token_for(user_id)))
}

#[tokio::test]
async fn test_health_check() {
    let state = setup_state().await;
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send_json(&state, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let state = setup_state().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "email": "carol@example.com",
                "username": "carol",
                "first_name": "Carol",
                "last_name": "Cook",
                "password": "s3cret-pass"
            })
            .to_string(),
        ))
        .unwrap();
    let (status, body) = send_json(&state, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "carol");
    assert!(body.get("password").is_none());

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/token/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "carol@example.com", "password": "s3cret-pass" }).to_string(),
        ))
        .unwrap();
    let (status, body) = send_json(&state, request).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["auth_token"].as_str().expect("missing token").to_string();

    let request = Request::builder()
        .uri("/api/users/me")
        .header(header::AUTHORIZATION, format!("Token {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&state, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "carol@example.com");
    assert_eq!(body["is_subscribed"], false);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let state = setup_state().await;
    create_user(state.db(), "alice").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/token/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "alice@example.com", "password": "nope" }).to_string(),
        ))
        .unwrap();
    let (status, body) = send_json(&state, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("non_field_errors").is_some());
}

#[tokio::test]
async fn test_toggles_require_authentication() {
    let state = setup_state().await;
    let alice = create_user(state.db(), "alice").await;
    let recipe = create_recipe(state.db(), alice, "Pancakes", &[]).await;

    for uri in [
        format!("/api/recipes/{}/favorite", recipe),
        format!("/api/recipes/{}/shopping_cart", recipe),
        "/api/recipes/download_shopping_cart".to_string(),
        "/api/users/subscriptions".to_string(),
    ] {
        let method = if uri.ends_with("download_shopping_cart") || uri.ends_with("subscriptions") {
            "GET"
        } else {
            "POST"
        };
        let request = Request::builder()
            .method(method)
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let (status, _) = send_json(&state, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_favorite_toggle_over_http() {
    let state = setup_state().await;
    let alice = create_user(state.db(), "alice").await;
    let recipe = create_recipe(state.db(), alice, "Pancakes", &[]).await;
    let uri = format!("/api/recipes/{}/favorite", recipe);

    let (status, body) =
        send_json(&state, authed("POST", &uri, alice).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], recipe);
    assert_eq!(body["name"], "Pancakes");
    assert_eq!(body["cooking_time"], 10);

    let (status, body) =
        send_json(&state, authed("POST", &uri, alice).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].is_string());

    let (status, _) =
        send_json(&state, authed("DELETE", &uri, alice).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
        send_json(&state, authed("DELETE", &uri, alice).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(
        &state,
        authed("POST", "/api/recipes/999/shopping_cart", alice)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_download_shopping_cart() {
    let state = setup_state().await;
    let db = state.db();
    let alice = create_user(db, "alice").await;
    let flour = create_ingredient(db, "flour", "g").await;
    let sugar = create_ingredient(db, "sugar", "g").await;
    let bread = create_recipe(db, alice, "Bread", &[(flour, 200)]).await;
    let cake = create_recipe(db, alice, "Cake", &[(flour, 100), (sugar, 50)]).await;
    toggle_add(db, alice, bread, ListKind::Cart).await.unwrap();
    toggle_add(db, alice, cake, ListKind::Cart).await.unwrap();

    let request = authed("GET", "/api/recipes/download_shopping_cart", alice)
        .body(Body::empty())
        .unwrap();
    let (status, body, headers) = send(&state, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"ShoppingList.txt\""
    );
    assert_eq!(String::from_utf8(body).unwrap(), "flour - 300 g.\nsugar - 50 g.");
}

#[tokio::test]
async fn test_empty_shopping_cart_downloads_empty_file() {
    let state = setup_state().await;
    let alice = create_user(state.db(), "alice").await;

    let request = authed("GET", "/api/recipes/download_shopping_cart", alice)
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = send(&state, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_subscribe_over_http() {
    let state = setup_state().await;
    let alice = create_user(state.db(), "alice").await;
    let bob = create_user(state.db(), "bob").await;
    create_recipe(state.db(), bob, "Soup", &[]).await;
    create_recipe(state.db(), bob, "Stew", &[]).await;

    let (status, body) = send_json(
        &state,
        authed("POST", &format!("/api/users/{}/subscribe", alice), alice)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].is_string());

    let (status, _) = send_json(
        &state,
        authed("POST", "/api/users/999/subscribe", alice)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(
        &state,
        authed(
            "POST",
            &format!("/api/users/{}/subscribe?recipes_limit=1", bob),
            alice,
        )
        .body(Body::empty())
        .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 2);
    assert_eq!(body["recipes"].as_array().unwrap().len(), 1);

    let (status, body) = send_json(
        &state,
        authed("GET", "/api/users/subscriptions", alice)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "bob");

    let (status, _) = send_json(
        &state,
        authed("DELETE", &format!("/api/users/{}/subscribe", bob), alice)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_recipe_list_is_paginated_and_public() {
    let state = setup_state().await;
    let alice = create_user(state.db(), "alice").await;
    for name in ["Soup", "Stew", "Salad"] {
        create_recipe(state.db(), alice, name, &[]).await;
    }

    let request = Request::builder()
        .uri("/api/recipes?limit=2")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&state, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["next"], "/api/recipes?limit=2&page=2");
    assert!(body["previous"].is_null());
    assert_eq!(body["results"][0]["name"], "Salad");
    assert_eq!(body["results"][0]["is_favorited"], false);
}

#[tokio::test]
async fn test_create_recipe_over_http() {
    let state = setup_state().await;
    let alice = create_user(state.db(), "alice").await;
    let lunch = create_tag(state.db(), "lunch").await;
    let rice = create_ingredient(state.db(), "rice", "g").await;

    let payload = json!({
        "ingredients": [{ "id": rice, "amount": 150 }],
        "tags": [lunch],
        "image": PNG_DATA_URI,
        "name": "Fried rice",
        "text": "Fry the rice.",
        "cooking_time": 20
    });
    let request = authed("POST", "/api/recipes", alice)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send_json(&state, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["author"]["id"], alice);
    assert_eq!(body["ingredients"][0]["amount"], 150);
    assert_eq!(body["tags"][0]["slug"], "lunch");

    let missing_tags = json!({
        "ingredients": [{ "id": rice, "amount": 150 }],
        "tags": [],
        "image": PNG_DATA_URI,
        "name": "Fried rice",
        "text": "Fry the rice.",
        "cooking_time": 20
    });
    let request = authed("POST", "/api/recipes", alice)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(missing_tags.to_string()))
        .unwrap();
    let (status, body) = send_json(&state, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["tags"].is_array());
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let state = setup_state().await;
    create_tag(state.db(), "breakfast").await;
    create_ingredient(state.db(), "Sugar", "g").await;
    create_ingredient(state.db(), "salt", "g").await;
    create_ingredient(state.db(), "flour", "g").await;

    let request = Request::builder().uri("/api/tags").body(Body::empty()).unwrap();
    let (status, body) = send_json(&state, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let request = Request::builder()
        .uri("/api/ingredients?name=s")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&state, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let request = Request::builder()
        .uri("/api/tags/999")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send_json(&state, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_huge_page_numbers_return_empty_pages() {
    let state = setup_state().await;
    let alice = create_user(state.db(), "alice").await;
    create_recipe(state.db(), alice, "Soup", &[]).await;

    for uri in [
        "/api/recipes?page=18446744073709551615",
        "/api/recipes?page=9223372036854775807&limit=100",
        "/api/users?page=18446744073709551615",
    ] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send_json(&state, request).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["count"], 1, "{}", uri);
        assert!(body["results"].as_array().unwrap().is_empty(), "{}", uri);
        assert!(body["next"].is_null(), "{}", uri);
    }

    let (status, body) = send_json(
        &state,
        authed("GET", "/api/users/subscriptions?recipes_limit=18446744073709551615", alice)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_ingredient_search_treats_wildcards_literally() {
    let state = setup_state().await;
    create_ingredient(state.db(), "flour", "g").await;
    create_ingredient(state.db(), "sugar_cane", "g").await;
    create_ingredient(state.db(), "sugarloaf", "g").await;

    let request = Request::builder()
        .uri("/api/ingredients?name=%25")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&state, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let request = Request::builder()
        .uri("/api/ingredients?name=sugar_")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send_json(&state, request).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["sugar_cane"]);
}
