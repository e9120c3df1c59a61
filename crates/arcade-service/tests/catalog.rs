//! Catalog browse and detail integration tests.

mod common;

use axum::http::StatusCode;

use common::{game_ids, TestHarness, EXPENSIVE_GAME};

// ============================================================================
// Paging
// ============================================================================

#[tokio::test]
async fn first_page_is_full_and_offers_next() {
    let harness = TestHarness::new().await;

    let response = harness.get_as(&harness.alice, "/home/0").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["view"], "user");
    assert_eq!(game_ids(&body), (1..=10).collect::<Vec<_>>());
    assert_eq!(body["page"], 0);
    assert_eq!(body["prev_page"], 0);
    assert_eq!(body["next_page"], 1);
}

#[tokio::test]
async fn short_page_offers_no_next_page() {
    let harness = TestHarness::new().await;

    let response = harness.get_as(&harness.alice, "/home/1").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(game_ids(&body), vec![11, 12, EXPENSIVE_GAME]);
    assert_eq!(body["prev_page"], 0);
    assert_eq!(body["next_page"], 1);
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
    let harness = TestHarness::new().await;

    let body: serde_json::Value = harness.get_as(&harness.alice, "/home/7").await.json();

    assert!(game_ids(&body).is_empty());
    assert_eq!(body["prev_page"], 6);
    assert_eq!(body["next_page"], 7);
}

#[tokio::test]
async fn repeated_requests_return_the_same_page() {
    let harness = TestHarness::new().await;

    let first: serde_json::Value = harness
        .get_as(&harness.alice, "/home/0?genre=3")
        .await
        .json();
    let second: serde_json::Value = harness
        .get_as(&harness.alice, "/home/0?genre=3")
        .await
        .json();

    assert_eq!(game_ids(&first), game_ids(&second));
}

// ============================================================================
// Filters
// ============================================================================

#[tokio::test]
async fn genres_combine_with_or() {
    let harness = TestHarness::new().await;

    let body: serde_json::Value = harness
        .get_as(&harness.alice, "/home/0?genre=1&genre=2")
        .await
        .json();

    assert_eq!(game_ids(&body), vec![1, 2, 4]);
    assert_eq!(body["filter_query"], "genre=1&genre=2");
}

#[tokio::test]
async fn facet_kinds_combine_with_and() {
    let harness = TestHarness::new().await;

    let body: serde_json::Value = harness
        .get_as(&harness.alice, "/home/0?genre=1&genre=2&category=10")
        .await
        .json();
    assert_eq!(game_ids(&body), vec![1]);

    let body: serde_json::Value = harness
        .get_as(&harness.alice, "/home/0?genre=3&category=10")
        .await
        .json();
    assert_eq!(game_ids(&body), vec![3, EXPENSIVE_GAME]);
}

#[tokio::test]
async fn blank_and_unknown_parameters_are_ignored() {
    let harness = TestHarness::new().await;

    let body: serde_json::Value = harness
        .get_as(&harness.alice, "/home/0?genre=&sort=name")
        .await
        .json();

    assert_eq!(game_ids(&body).len(), 10);
    assert_eq!(body["filter_query"], "");
}

#[tokio::test]
async fn non_numeric_facet_id_is_rejected() {
    let harness = TestHarness::new().await;

    for query in ["genre=abc", "tag=1;DROP", "publisher=-1", "genre=1&category=x"] {
        let response = harness
            .get_as(&harness.alice, &format!("/home/0?{query}"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn facet_vocabulary_marks_selection() {
    let harness = TestHarness::new().await;

    let body: serde_json::Value = harness
        .get_as(&harness.alice, "/home/0?genre=2")
        .await
        .json();

    let genres = body["facets"]
        .as_array()
        .unwrap()
        .iter()
        .find(|group| group["kind"] == "genre")
        .expect("genre group");
    let selected: Vec<_> = genres["options"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|o| o["selected"] == true)
        .map(|o| o["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(selected, vec!["Indie"]);
}

#[tokio::test]
async fn store_outage_renders_empty_page() {
    let harness = TestHarness::new().await;
    harness.store.set_unavailable(true);

    let response = harness.get_as(&harness.alice, "/home/0?genre=1").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(game_ids(&body).is_empty());
    assert_eq!(body["next_page"], 0);
}

// ============================================================================
// Role-shaped views
// ============================================================================

#[tokio::test]
async fn admin_home_includes_roster_without_credentials() {
    let harness = TestHarness::new().await;

    let body: serde_json::Value = harness.get_as(&harness.root, "/home/0").await.json();

    assert_eq!(body["view"], "admin");
    let accounts = body["accounts"].as_array().unwrap();
    let names: Vec<_> = accounts
        .iter()
        .map(|a| a["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alice", "root"]);
    assert!(accounts.iter().all(|a| a.get("credential").is_none()));
    assert_eq!(game_ids(&body).len(), 10);
}

#[tokio::test]
async fn user_home_has_no_roster() {
    let harness = TestHarness::new().await;

    let body: serde_json::Value = harness.get_as(&harness.alice, "/home/0").await.json();

    assert!(body.get("accounts").is_none());
}

// ============================================================================
// Detail / Library
// ============================================================================

#[tokio::test]
async fn detail_includes_attributes_and_purchased_flag() {
    let harness = TestHarness::new().await;

    let response = harness.get_as(&harness.alice, "/games/1").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let game = &body["game"];
    assert_eq!(game["id"], 1);
    assert_eq!(game["genres"], serde_json::json!(["Action"]));
    assert_eq!(game["languages"], serde_json::json!(["English", "French"]));
    assert_eq!(game["purchased"], false);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn purchased_flag_is_per_principal() {
    let harness = TestHarness::new().await;

    harness
        .post_form_as(&harness.alice, "/games/1/purchase", &[])
        .await
        .assert_status_ok();

    let mine: serde_json::Value = harness.get_as(&harness.alice, "/games/1").await.json();
    let theirs: serde_json::Value = harness.get_as(&harness.root, "/games/1").await.json();
    assert_eq!(mine["game"]["purchased"], true);
    assert_eq!(theirs["game"]["purchased"], false);
}

#[tokio::test]
async fn unknown_game_is_not_found() {
    let harness = TestHarness::new().await;

    let response = harness.get_as(&harness.alice, "/games/999").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn library_lists_purchases() {
    let harness = TestHarness::new().await;

    let empty: serde_json::Value = harness.get_as(&harness.alice, "/library/0").await.json();
    assert!(empty["games"].as_array().unwrap().is_empty());

    harness
        .post_form_as(&harness.alice, "/games/2/purchase", &[])
        .await
        .assert_status_ok();

    let body: serde_json::Value = harness.get_as(&harness.alice, "/library/0").await.json();
    let games = body["games"].as_array().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0]["game_id"], 2);
    assert_eq!(games[0]["price_paid_cents"], common::GAME_PRICE);
}

#[tokio::test]
async fn sessions_are_released_after_requests() {
    let harness = TestHarness::new().await;

    harness.get_as(&harness.alice, "/home/0").await;
    harness.get_as(&harness.alice, "/games/999").await;
    harness.get_as(&harness.alice, "/home/0?genre=x").await;
    harness
        .post_form_as(&harness.alice, "/games/42/purchase", &[])
        .await;

    assert_eq!(harness.store.open_sessions(), 0);
}
