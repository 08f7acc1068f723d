mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{setup, unique_name, TestApp, TestResponse};

async fn check(app: &TestApp, uri: &str, answer: &str) -> TestResponse {
    app.post_json(uri, None, json!({ "user_answer": answer })).await
}

#[tokio::test]
async fn practice_questions_are_listed_filtered_and_checked() {
    let Some(app) = setup().await else { return };
    let category_id = app.create_category(&unique_name("Practice")).await;

    let resp = app
        .admin_json(
            "POST",
            "/api/admin/practice",
            json!({
                "question_text": "Which trait enables `?` conversion?",
                "correct_answer": "  From ",
                "category_id": category_id,
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    let first_id = resp.body["id"].as_i64().unwrap();

    let resp = app
        .admin_json(
            "POST",
            "/api/admin/practice",
            json!({
                "question_text": "Keyword for a trait object?",
                "correct_answer": "dyn",
                "category_id": category_id,
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let second_id = resp.body["id"].as_i64().unwrap();

    // Newest first.
    let resp = app
        .get(&format!("/api/practice?category_id={}", category_id), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let ids: Vec<i64> = resp.body["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second_id, first_id]);

    // The key is not exposed before an answer is checked.
    let resp = app.get(&format!("/api/practice/{}", first_id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.get("correct_answer").is_none());

    let uri = format!("/api/practice/{}", first_id);
    let resp = check(&app, &uri, " from").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["is_correct"], true);
    assert_eq!(resp.body["user_answer"], "from");

    let resp = check(&app, &uri, "Into").await;
    assert_eq!(resp.body["is_correct"], false);

    let resp = check(&app, &uri, "   ").await;
    assert_eq!(resp.body["is_correct"], false);
    assert_eq!(resp.body["user_answer"], "");

    let resp = app.get("/api/practice/999999999", None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn practice_update_refreshes_timestamp_and_detaches_category() {
    let Some(app) = setup().await else { return };
    let category_id = app.create_category(&unique_name("Practice update")).await;

    let resp = app
        .admin_json(
            "POST",
            "/api/admin/practice",
            json!({
                "question_text": "Smart pointer for shared ownership?",
                "correct_answer": "Rc",
                "category_id": category_id,
            }),
        )
        .await;
    let id = resp.body["id"].as_i64().unwrap();
    let created_at = resp.body["updated_at"].as_str().unwrap().to_string();

    let resp = app
        .admin_json(
            "PATCH",
            &format!("/api/admin/practice/{}", id),
            json!({ "correct_answer": "Arc", "category_id": null }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    assert_eq!(resp.body["correct_answer"], "Arc");
    assert_eq!(resp.body["question_text"], "Smart pointer for shared ownership?");
    assert_eq!(resp.body["category_id"], serde_json::Value::Null);
    assert_ne!(resp.body["updated_at"].as_str().unwrap(), created_at);

    let resp = app
        .get(&format!("/api/practice?category_id={}", category_id), None)
        .await;
    assert!(resp.body["questions"].as_array().unwrap().is_empty());

    let resp = app
        .admin_json(
            "PATCH",
            "/api/admin/practice/999999999",
            json!({ "question_text": "Nothing here" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app
        .admin_json("POST", "/api/admin/practice", json!({ "question_text": "", "correct_answer": "x" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}
