//! Post Tests
//!
//! Covers multipart post creation, post detail, and the feed listing.

mod common;

use axum::http::StatusCode;
use common::{app, PNG_BYTES, TEST_UPLOAD_MAX_BYTES};
use roastr::domain::post::PostKind;
use uuid::Uuid;

// ===========================================================================
// Post Creation
// ===========================================================================

#[tokio::test]
async fn create_post_uploads_image_under_owner_prefix() {
    let app = app().await;
    let user = app.create_user("post_create").await;

    let resp = app
        .post_multipart(
            "/posts",
            &[("kind", "vote"), ("caption", "Rate my fit")],
            Some(PNG_BYTES),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert!(body["id"].is_string());
    assert_eq!(body["owner_id"].as_str().unwrap(), user.id.to_string());
    assert_eq!(body["kind"], "vote");
    assert_eq!(body["caption"], "Rate my fit");

    let image_url = body["image_url"].as_str().unwrap();
    assert!(image_url.starts_with(&format!("memory://{}/", user.id)));
    assert!(image_url.ends_with(".png"));

    let key = image_url.trim_start_matches("memory://");
    let (content_type, stored) = app.images.get(key).await.expect("image was uploaded");
    assert_eq!(content_type, "image/png");
    assert_eq!(&stored[..], PNG_BYTES);
}

#[tokio::test]
async fn create_post_blank_caption_is_dropped() {
    let app = app().await;
    let user = app.create_user("post_blank_caption").await;

    let resp = app
        .post_multipart(
            "/posts",
            &[("kind", "roast"), ("caption", "   ")],
            Some(PNG_BYTES),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.json()["caption"].is_null());
}

#[tokio::test]
async fn create_post_caption_too_long() {
    let app = app().await;
    let user = app.create_user("post_long_caption").await;
    let caption = "a".repeat(2201);

    let resp = app
        .post_multipart(
            "/posts",
            &[("kind", "vote"), ("caption", caption.as_str())],
            Some(PNG_BYTES),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.error_message(),
        "caption must be at most 2200 characters"
    );
}

#[tokio::test]
async fn create_post_requires_image() {
    let app = app().await;
    let user = app.create_user("post_no_image").await;

    let resp = app
        .post_multipart("/posts", &[("kind", "vote")], None, Some(&user.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "image is required");
}

#[tokio::test]
async fn create_post_requires_kind() {
    let app = app().await;
    let user = app.create_user("post_no_kind").await;

    let resp = app
        .post_multipart("/posts", &[], Some(PNG_BYTES), Some(&user.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "kind is required");
}

#[tokio::test]
async fn create_post_rejects_unknown_kind() {
    let app = app().await;
    let user = app.create_user("post_bad_kind").await;

    let resp = app
        .post_multipart(
            "/posts",
            &[("kind", "poll")],
            Some(PNG_BYTES),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "kind must be roast or vote");
}

#[tokio::test]
async fn create_post_rejects_non_image_bytes() {
    let app = app().await;
    let user = app.create_user("post_text_file").await;

    let resp = app
        .post_multipart(
            "/posts",
            &[("kind", "vote")],
            Some(b"just some text, not a picture"),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "unsupported image format");
}

#[tokio::test]
async fn create_post_rejects_oversized_image() {
    let app = app().await;
    let user = app.create_user("post_big_image").await;

    let mut image = PNG_BYTES.to_vec();
    image.resize(TEST_UPLOAD_MAX_BYTES + 1, 0);

    let resp = app
        .post_multipart(
            "/posts",
            &[("kind", "vote")],
            Some(&image),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "image exceeds max size");
}

#[tokio::test]
async fn create_post_requires_profile() {
    let app = app().await;
    let token = app.token_for(Uuid::new_v4());

    let resp = app
        .post_multipart("/posts", &[("kind", "vote")], Some(PNG_BYTES), Some(&token))
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "profile not found");
}

#[tokio::test]
async fn create_post_unauthenticated() {
    let app = app().await;

    let resp = app
        .post_multipart("/posts", &[("kind", "vote")], Some(PNG_BYTES), None)
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ===========================================================================
// Post Detail
// ===========================================================================

#[tokio::test]
async fn get_vote_post_includes_aggregate_and_my_rating() {
    let app = app().await;
    let owner = app.create_user("detail_owner").await;
    let rater = app.create_user("detail_rater").await;
    let post_id = app.create_post_for_user(owner.id, PostKind::Vote).await;
    app.rate(post_id, rater.id, 7).await;
    app.rate(post_id, owner.id, 9).await;

    let resp = app
        .get(&format!("/posts/{}", post_id), Some(&rater.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["id"].as_str().unwrap(), post_id.to_string());
    assert_eq!(body["aggregate"]["count"], 2);
    assert_eq!(body["aggregate"]["average"].as_f64().unwrap(), 8.0);
    assert_eq!(body["my_rating"], 7);
}

#[tokio::test]
async fn get_vote_post_without_ratings_has_empty_aggregate() {
    let app = app().await;
    let owner = app.create_user("detail_empty").await;
    let post_id = app.create_post_for_user(owner.id, PostKind::Vote).await;

    let resp = app.get(&format!("/posts/{}", post_id), None).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["aggregate"]["count"], 0);
    assert_eq!(body["aggregate"]["average"].as_f64().unwrap(), 0.0);
    assert!(body.get("my_rating").is_none());
}

#[tokio::test]
async fn get_roast_post_has_no_aggregate() {
    let app = app().await;
    let owner = app.create_user("detail_roast").await;
    let post_id = app.create_post_for_user(owner.id, PostKind::Roast).await;

    let resp = app.get(&format!("/posts/{}", post_id), None).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["kind"], "roast");
    assert!(body.get("aggregate").is_none());
}

#[tokio::test]
async fn get_missing_post() {
    let app = app().await;

    let resp = app.get(&format!("/posts/{}", Uuid::new_v4()), None).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "post not found");
}

// ===========================================================================
// Feed
// ===========================================================================

#[tokio::test]
async fn feed_lists_newest_first() {
    let app = app().await;
    let owner = app.create_user("feed_order").await;
    let mut created = Vec::new();
    for i in 0..6 {
        let kind = if i % 2 == 0 {
            PostKind::Vote
        } else {
            PostKind::Roast
        };
        created.push(app.create_post_for_user(owner.id, kind).await);
    }

    let resp = app.get("/posts", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    let ids: Vec<String> = resp.json()["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = created.iter().rev().map(|id| id.to_string()).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn feed_filters_by_kind() {
    let app = app().await;
    let owner = app.create_user("feed_kind").await;
    let vote_id = app.create_post_for_user(owner.id, PostKind::Vote).await;
    let roast_id = app.create_post_for_user(owner.id, PostKind::Roast).await;
    app.rate(vote_id, owner.id, 4).await;

    let votes = app.get("/posts?kind=vote", None).await.json();
    let votes = votes["items"].as_array().unwrap().clone();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0]["id"].as_str().unwrap(), vote_id.to_string());
    assert_eq!(votes[0]["aggregate"]["count"], 1);
    assert_eq!(votes[0]["aggregate"]["average"].as_f64().unwrap(), 4.0);

    let roasts = app.get("/posts?kind=roast", None).await.json();
    let roasts = roasts["items"].as_array().unwrap().clone();
    assert_eq!(roasts.len(), 1);
    assert_eq!(roasts[0]["id"].as_str().unwrap(), roast_id.to_string());
    assert!(roasts[0].get("aggregate").is_none());

    let all = app.get("/posts?kind=all", None).await.json();
    assert_eq!(all["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn feed_rejects_unknown_kind() {
    let app = app().await;

    let resp = app.get("/posts?kind=poll", None).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "kind must be roast or vote");
}

#[tokio::test]
async fn feed_empty() {
    let app = app().await;

    let resp = app.get("/posts", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn feed_aggregates_are_per_post() {
    let app = app().await;
    let owner = app.create_user("feed_per_post").await;
    let rater = app.create_user("feed_per_post_rater").await;
    let first = app.create_post_for_user(owner.id, PostKind::Vote).await;
    let second = app.create_post_for_user(owner.id, PostKind::Vote).await;
    app.rate(first, owner.id, 2).await;
    app.rate(first, rater.id, 10).await;
    app.rate(second, rater.id, 5).await;

    let body = app.get("/posts?kind=vote", None).await.json();
    let items = body["items"].as_array().unwrap();

    let find = |id: Uuid| {
        items
            .iter()
            .find(|item| item["id"].as_str().unwrap() == id.to_string())
            .unwrap()
            .clone()
    };
    assert_eq!(find(first)["aggregate"]["count"], 2);
    assert_eq!(find(first)["aggregate"]["average"].as_f64().unwrap(), 6.0);
    assert_eq!(find(second)["aggregate"]["count"], 1);
    assert_eq!(find(second)["aggregate"]["average"].as_f64().unwrap(), 5.0);
}
