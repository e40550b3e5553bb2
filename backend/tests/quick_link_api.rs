mod helpers;

use common::QuickLinkDto;
use helpers::{get_auth_token, sign_in_user, sign_up_user, spawn_app};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::SocketAddr;

async fn create_link(
    addr: &SocketAddr,
    client: &reqwest::Client,
    token: &str,
    name: &str,
    url: &str,
) -> QuickLinkDto {
    let res = client
        .post(format!("http://{}/api/quick-links", addr))
        .bearer_auth(token)
        .json(&json!({ "name": name, "url": url }))
        .send()
        .await
        .expect("Failed to create quick link");
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    serde_json::from_value(body["data"].clone()).expect("Malformed quick link in response")
}

#[tokio::test]
async fn create_and_fetch_quick_link() {
    let (addr, client, _db_pool) = spawn_app().await;
    let token = get_auth_token(&addr, &client, "a@x.com", "A").await;

    let link = create_link(&addr, &client, &token, "Docs", "https://example.com").await;
    assert_eq!(link.name, "Docs");
    assert_eq!(link.url, "https://example.com");

    let res = client
        .get(format!("http://{}/api/quick-links/{}", addr, link.id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let fetched: QuickLinkDto = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(fetched, link);

    let res = client
        .get(format!("http://{}/api/quick-links", addr))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let links: Vec<QuickLinkDto> = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(links, vec![link]);
}

#[tokio::test]
async fn list_returns_only_own_links_newest_first() {
    let (addr, client, _db_pool) = spawn_app().await;
    let token_a = get_auth_token(&addr, &client, "a@x.com", "A").await;
    let token_b = get_auth_token(&addr, &client, "b@x.com", "B").await;

    let first = create_link(&addr, &client, &token_a, "First", "https://one.example.com").await;
    let second = create_link(&addr, &client, &token_a, "Second", "https://two.example.com").await;
    create_link(&addr, &client, &token_b, "Other", "https://other.example.com").await;

    let res = client
        .get(format!("http://{}/api/quick-links", addr))
        .bearer_auth(&token_a)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let links: Vec<QuickLinkDto> = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(links, vec![second, first]);
}

#[tokio::test]
async fn foreign_links_read_as_not_found() {
    let (addr, client, _db_pool) = spawn_app().await;
    let token_a = get_auth_token(&addr, &client, "a@x.com", "A").await;
    let token_b = get_auth_token(&addr, &client, "b@x.com", "B").await;

    let link = create_link(&addr, &client, &token_a, "Docs", "https://example.com").await;
    let link_url = format!("http://{}/api/quick-links/{}", addr, link.id);

    // Owner mismatch must be indistinguishable from true absence.
    let res = client.get(&link_url).bearer_auth(&token_b).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Quick link not found"));

    let res = client
        .put(&link_url)
        .bearer_auth(&token_b)
        .json(&json!({ "name": "Stolen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(&link_url).bearer_auth(&token_b).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The resource is untouched for its owner.
    let res = client.get(&link_url).bearer_auth(&token_a).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let fetched: QuickLinkDto = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(fetched, link);
}

#[tokio::test]
async fn partial_update_preserves_unspecified_fields() {
    let (addr, client, _db_pool) = spawn_app().await;
    let token = get_auth_token(&addr, &client, "a@x.com", "A").await;

    let link = create_link(&addr, &client, &token, "Docs", "https://example.com").await;
    let link_url = format!("http://{}/api/quick-links/{}", addr, link.id);

    let res = client
        .put(&link_url)
        .bearer_auth(&token)
        .json(&json!({ "name": "Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let updated: QuickLinkDto = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.url, "https://example.com");

    let res = client
        .put(&link_url)
        .bearer_auth(&token)
        .json(&json!({ "url": "https://new.example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let updated: QuickLinkDto = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.url, "https://new.example.com");
}

#[tokio::test]
async fn update_of_missing_link_returns_not_found() {
    let (addr, client, _db_pool) = spawn_app().await;
    let token = get_auth_token(&addr, &client, "a@x.com", "A").await;

    let res = client
        .put(format!("http://{}/api/quick-links/no-such-id", addr))
        .bearer_auth(&token)
        .json(&json!({ "name": "Whatever" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_of_already_deleted_link_returns_not_found() {
    let (addr, client, _db_pool) = spawn_app().await;
    let token = get_auth_token(&addr, &client, "a@x.com", "A").await;

    let link = create_link(&addr, &client, &token, "Docs", "https://example.com").await;
    let link_url = format!("http://{}/api/quick-links/{}", addr, link.id);

    let res = client.delete(&link_url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], json!("Quick link deleted successfully"));

    let res = client.delete(&link_url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(&link_url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let (addr, client, db_pool) = spawn_app().await;
    let base = format!("http://{}/api/quick-links", addr);
    let item = format!("{}/some-id", base);

    let responses = [
        client.post(&base).json(&json!({ "name": "X", "url": "https://x.com" })).send().await.unwrap(),
        client.get(&base).send().await.unwrap(),
        client.get(&item).send().await.unwrap(),
        client.put(&item).json(&json!({ "name": "X" })).send().await.unwrap(),
        client.delete(&item).send().await.unwrap(),
    ];
    for res in responses {
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["success"], json!(false));
    }

    // Nothing was persisted by the rejected create.
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quick_links")
        .fetch_one(&db_pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn create_rejects_invalid_payloads() {
    let (addr, client, _db_pool) = spawn_app().await;
    let token = get_auth_token(&addr, &client, "a@x.com", "A").await;
    let base = format!("http://{}/api/quick-links", addr);

    let res = client
        .post(&base)
        .bearer_auth(&token)
        .json(&json!({ "name": "", "url": "https://example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Name is required"));

    let res = client
        .post(&base)
        .bearer_auth(&token)
        .json(&json!({ "name": "Docs", "url": "not a url" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Invalid URL format"));
}

#[tokio::test]
async fn owner_comes_from_the_identity_not_the_payload() {
    let (addr, client, _db_pool) = spawn_app().await;
    let user = sign_up_user(&addr, &client, "a@x.com", "A").await;
    let token = sign_in_user(&addr, &client, "a@x.com").await;

    // A client-supplied user_id is ignored.
    let res = client
        .post(format!("http://{}/api/quick-links", addr))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Docs",
            "url": "https://example.com",
            "user_id": "someone-else"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["user_id"], json!(user.id));
}
