mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, json_body, TestApp};
use serde_json::json;

async fn seed_complaint(app: &TestApp, token: &str, anonymous: bool) -> Result<String> {
    let response = app
        .post_json(
            "/api/complaints",
            &json!({
                "title": "Fee charged twice",
                "description": "The semester fee was debited twice from my account.",
                "is_anonymous": anonymous,
            }),
            Some(token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response.into_body()).await?;
    Ok(body["data"]["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn students_see_only_their_own_complaints() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    app.insert_user("a@example.edu", "longenough", "Student A", "student", None)
        .await?;
    app.insert_user("b@example.edu", "longenough", "Student B", "student", None)
        .await?;
    let token_a = app.login_token("a@example.edu", "longenough").await?;
    let token_b = app.login_token("b@example.edu", "longenough").await?;

    let id = seed_complaint(&app, &token_a, false).await?;

    let response = app.get("/api/complaints", Some(&token_b)).await?;
    let body = json_body(response.into_body()).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    // Detail fetch outside the visible set reads as missing, not forbidden.
    let response = app
        .get(&format!("/api/complaints/{id}"), Some(&token_b))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/complaints", Some(&token_a)).await?;
    let body = json_body(response.into_body()).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn unassigned_staff_cannot_see_complaints() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    app.insert_user("a@example.edu", "longenough", "Student A", "student", None)
        .await?;
    app.insert_user("staff@example.edu", "longenough", "Priya Raman", "staff", None)
        .await?;
    let token_a = app.login_token("a@example.edu", "longenough").await?;
    let token_staff = app.login_token("staff@example.edu", "longenough").await?;

    let id = seed_complaint(&app, &token_a, false).await?;

    let response = app.get("/api/complaints", Some(&token_staff)).await?;
    let body = json_body(response.into_body()).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    let response = app
        .get(&format!("/api/complaints/{id}"), Some(&token_staff))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn oversight_roles_see_everything() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    app.insert_user("a@example.edu", "longenough", "Student A", "student", None)
        .await?;
    app.insert_user("hod@example.edu", "longenough", "HOD", "hod", None)
        .await?;
    let token_a = app.login_token("a@example.edu", "longenough").await?;
    let token_hod = app.login_token("hod@example.edu", "longenough").await?;

    let id = seed_complaint(&app, &token_a, false).await?;

    let response = app.get("/api/complaints", Some(&token_hod)).await?;
    let body = json_body(response.into_body()).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let response = app
        .get(&format!("/api/complaints/{id}"), Some(&token_hod))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn anonymity_redacts_identity_by_viewer() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    app.insert_user("a@example.edu", "longenough", "Student A", "student", Some("CSE"))
        .await?;
    app.insert_user("hod@example.edu", "longenough", "HOD", "hod", None)
        .await?;
    app.insert_user("admin@example.edu", "longenough", "Admin", "admin", None)
        .await?;
    let token_a = app.login_token("a@example.edu", "longenough").await?;
    let token_hod = app.login_token("hod@example.edu", "longenough").await?;
    let token_admin = app.login_token("admin@example.edu", "longenough").await?;

    let id = seed_complaint(&app, &token_a, true).await?;
    let path = format!("/api/complaints/{id}");

    let response = app.get(&path, Some(&token_hod)).await?;
    let body = json_body(response.into_body()).await?;
    assert_eq!(body["data"]["student_name"], json!("Anonymous"));
    assert_eq!(body["data"]["student_email"], json!("Hidden"));
    assert!(body["data"]["student_department"].is_null());

    let response = app.get(&path, Some(&token_admin)).await?;
    let body = json_body(response.into_body()).await?;
    assert_eq!(body["data"]["student_name"], json!("Student A"));
    assert_eq!(body["data"]["anonymous_label"], json!("Anonymous"));

    let response = app.get(&path, Some(&token_a)).await?;
    let body = json_body(response.into_body()).await?;
    assert_eq!(body["data"]["student_name"], json!("Student A"));
    assert!(body["data"].get("anonymous_label").is_none());

    app.cleanup().await?;
    Ok(())
}
