//! End-to-end tests for liking and unliking albums.

mod common;

use common::{
    TestClient, TestServer, ABBEY_ROAD_ID, BACK_TO_BLACK_ID, MISSING_ALBUM_ID, OTHER_PASS,
    OTHER_USER_EMAIL, RUMOURS_ID, THRILLER_ID,
};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_like_requires_authentication() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    for response in [
        client.like_album(THRILLER_ID).await,
        client.unlike_album(ABBEY_ROAD_ID).await,
        client.get_liked_albums().await,
    ] {
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["kind"], "unauthenticated");
    }
    assert_eq!(
        server
            .catalog_store
            .count_likes(server.test_user_id, ABBEY_ROAD_ID)
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_like_is_idempotent() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    for _ in 0..2 {
        let response = client.like_album(THRILLER_ID).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["id"], THRILLER_ID);
        assert_eq!(body["isLiked"], true);
    }
    assert_eq!(
        server
            .catalog_store
            .count_likes(server.test_user_id, THRILLER_ID)
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_unlike_is_idempotent() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    for _ in 0..2 {
        let response = client.unlike_album(ABBEY_ROAD_ID).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["isLiked"], false);
    }

    let liked: Vec<Value> = client.get_liked_albums().await.json().await.unwrap();
    assert!(liked.is_empty());
}

#[tokio::test]
async fn test_like_missing_album_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.like_album(MISSING_ALBUM_ID).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = client.unlike_album(MISSING_ALBUM_ID).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_liked_albums_are_ordered_by_title() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    for id in [THRILLER_ID, RUMOURS_ID, BACK_TO_BLACK_ID] {
        assert_eq!(client.like_album(id).await.status(), StatusCode::OK);
    }

    let liked: Vec<Value> = client.get_liked_albums().await.json().await.unwrap();
    let titles: Vec<&str> = liked.iter().map(|a| a["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Abbey Road", "Back to Black", "Rumours", "Thriller"]);
    assert!(liked.iter().all(|a| a["isLiked"] == true));
}

#[tokio::test]
async fn test_likes_are_per_user() {
    let server = TestServer::spawn().await;
    let test_user = TestClient::authenticated(server.base_url.clone()).await;
    let other_user =
        TestClient::authenticated_as(server.base_url.clone(), OTHER_USER_EMAIL, OTHER_PASS).await;

    assert_eq!(other_user.like_album(THRILLER_ID).await.status(), StatusCode::OK);

    let album: Value = test_user.get_album(THRILLER_ID).await.json().await.unwrap();
    assert_eq!(album["isLiked"], false);
    let album: Value = other_user.get_album(ABBEY_ROAD_ID).await.json().await.unwrap();
    assert_eq!(album["isLiked"], false);
    let album: Value = other_user.get_album(THRILLER_ID).await.json().await.unwrap();
    assert_eq!(album["isLiked"], true);
}
