// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::http::header;
use actix_web::{http::StatusCode, test};
use nop_blog::store::{NewPost, PostStore};
use serde_json::{Value, json};

use common::{ALICE_EMAIL, ALICE_NAME, BOB_EMAIL, BOB_NAME, bearer, error_code, read_json};

#[actix_web::test]
async fn only_the_author_can_update_a_post() {
    let harness = common::TestHarness::new();
    let (alice, alice_tokens) = harness.session(ALICE_NAME, ALICE_EMAIL);
    let (_, bob_tokens) = harness.session(BOB_NAME, BOB_EMAIL);
    let post = harness
        .database
        .create_post(NewPost {
            title: "Original".to_string(),
            body: "Body".to_string(),
            author_id: alice.id,
        })
        .expect("seed post");
    let app = test::init_service(common::build_test_app(harness.services.clone())).await;

    let req = test::TestRequest::put()
        .uri(&format!("/posts/{}", post.id))
        .insert_header(bearer(&bob_tokens.access_token))
        .set_json(json!({ "title": "Hijacked", "body": "Mine now" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let json = read_json(resp).await;
    assert_eq!(error_code(&json), Some("forbidden"));

    let stored = harness
        .database
        .get_post(post.id)
        .expect("get post")
        .expect("post exists");
    assert_eq!(stored.title, "Original");

    let req = test::TestRequest::put()
        .uri(&format!("/posts/{}", post.id))
        .insert_header(bearer(&alice_tokens.access_token))
        .set_json(json!({ "title": "Edited", "body": "New body" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = read_json(resp).await;
    assert_eq!(json.get("title").and_then(Value::as_str), Some("Edited"));
    assert_eq!(json.get("author_id").and_then(Value::as_i64), Some(alice.id));
}

#[actix_web::test]
async fn update_of_missing_post_is_not_found() {
    let harness = common::TestHarness::new();
    let (_, tokens) = harness.session(ALICE_NAME, ALICE_EMAIL);
    let app = test::init_service(common::build_test_app(harness.services.clone())).await;

    let req = test::TestRequest::put()
        .uri("/posts/4242")
        .insert_header(bearer(&tokens.access_token))
        .set_json(json!({ "title": "Edited", "body": "New body" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn guarded_routes_reject_bad_credentials_uniformly() {
    let harness = common::TestHarness::new();
    let (_, tokens) = harness.session(ALICE_NAME, ALICE_EMAIL);
    let app = test::init_service(common::build_test_app(harness.services.clone())).await;

    let headers = [
        None,
        Some("Bearer".to_string()),
        Some("Basic YWxpY2U6cGFzcw==".to_string()),
        Some(format!("bearer {}", tokens.access_token)),
        Some("Bearer not.a.jwt".to_string()),
        Some(format!("Bearer {}", tokens.refresh_token)),
    ];

    let mut bodies = Vec::new();
    for value in headers {
        let mut req = test::TestRequest::post()
            .uri("/posts")
            .set_json(json!({ "title": "Nope", "body": "Nope" }));
        if let Some(value) = value {
            req = req.insert_header((header::AUTHORIZATION, value));
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        bodies.push(read_json(resp).await);
    }

    assert!(bodies.iter().all(|body| body == &bodies[0]));
    assert_eq!(error_code(&bodies[0]), Some("unauthorized"));

    let posts = harness.database.list_posts(10, 0).expect("list posts");
    assert!(posts.is_empty());
}

#[actix_web::test]
async fn token_from_another_deployment_is_rejected() {
    let harness = common::TestHarness::new();
    harness.register(ALICE_NAME, ALICE_EMAIL);

    let other = common::TestHarness::with_config(
        nop_blog::util::TestConfigBuilder::new()
            .with_jwt_secret("another-deployment-secret-another-one")
            .build(),
    );
    let (_, foreign) = other.session(ALICE_NAME, ALICE_EMAIL);

    let app = test::init_service(common::build_test_app(harness.services.clone())).await;
    let req = test::TestRequest::post()
        .uri("/posts")
        .insert_header(bearer(&foreign.access_token))
        .set_json(json!({ "title": "Forged", "body": "Forged" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_post_validates_fields() {
    let harness = common::TestHarness::new();
    let (_, tokens) = harness.session(ALICE_NAME, ALICE_EMAIL);
    let app = test::init_service(common::build_test_app(harness.services.clone())).await;

    for body in [
        json!({ "title": "   ", "body": "Body" }),
        json!({ "title": "x".repeat(201), "body": "Body" }),
        json!({ "title": "Missing body" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/posts")
            .insert_header(bearer(&tokens.access_token))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = read_json(resp).await;
        assert_eq!(error_code(&json), Some("validation_error"));
    }
}

#[actix_web::test]
async fn list_posts_pages_newest_first_with_authors() {
    let harness = common::TestHarness::new();
    let alice = harness.register(ALICE_NAME, ALICE_EMAIL);
    for index in 0..15 {
        harness
            .database
            .create_post(NewPost {
                title: format!("Post {}", index),
                body: "Body".to_string(),
                author_id: alice.id,
            })
            .expect("seed post");
    }
    let app = test::init_service(common::build_test_app(harness.services.clone())).await;

    let req = test::TestRequest::get().uri("/posts").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = read_json(resp).await;
    let items = json.as_array().expect("post array");
    assert_eq!(items.len(), 10);
    assert_eq!(
        items[0].get("title").and_then(Value::as_str),
        Some("Post 14")
    );
    assert_eq!(
        items[0]
            .get("author")
            .and_then(|author| author.get("username"))
            .and_then(Value::as_str),
        Some(ALICE_NAME)
    );

    let req = test::TestRequest::get()
        .uri("/posts?limit=5&offset=10")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let json = read_json(resp).await;
    let items = json.as_array().expect("post array");
    assert_eq!(items.len(), 5);
    assert_eq!(items[0].get("title").and_then(Value::as_str), Some("Post 4"));

    let req = test::TestRequest::get()
        .uri("/posts?limit=abc&offset=-3")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = read_json(resp).await;
    assert_eq!(json.as_array().map(Vec::len), Some(10));
}

#[actix_web::test]
async fn list_user_posts_filters_by_author() {
    let harness = common::TestHarness::new();
    let alice = harness.register(ALICE_NAME, ALICE_EMAIL);
    let bob = harness.register(BOB_NAME, BOB_EMAIL);
    for (author_id, title) in [(alice.id, "A1"), (bob.id, "B1"), (alice.id, "A2")] {
        harness
            .database
            .create_post(NewPost {
                title: title.to_string(),
                body: "Body".to_string(),
                author_id,
            })
            .expect("seed post");
    }
    let app = test::init_service(common::build_test_app(harness.services.clone())).await;

    let req = test::TestRequest::get()
        .uri(&format!("/users/{}/posts", alice.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = read_json(resp).await;
    let titles: Vec<&str> = json
        .as_array()
        .expect("post array")
        .iter()
        .filter_map(|post| post.get("title").and_then(Value::as_str))
        .collect();
    assert_eq!(titles, vec!["A2", "A1"]);

    let req = test::TestRequest::get().uri("/users/777/posts").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = read_json(resp).await;
    assert_eq!(json.as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn non_numeric_ids_are_bad_requests() {
    let harness = common::TestHarness::new();
    let app = test::init_service(common::build_test_app(harness.services.clone())).await;

    for uri in ["/posts/abc", "/users/abc/posts"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = read_json(resp).await;
        assert_eq!(error_code(&json), Some("validation_error"));
    }
}
