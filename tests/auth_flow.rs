mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, json_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn register_login_and_me_roundtrip() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({
                "email": "asha@example.edu",
                "password": "longenough",
                "name": "Asha Verma",
                "role": "student",
                "department": "CSE",
                "student_id": "CSE-2021-042",
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response.into_body()).await?;
    assert_eq!(body["success"], json!(true));
    assert!(body["data"]["access_token"].as_str().is_some());
    assert_eq!(body["data"]["token_type"], json!("bearer"));
    assert_eq!(body["data"]["user"]["student_id"], json!("CSE-2021-042"));
    assert!(body["data"]["user"]["staff_id"].is_null());

    let token = app.login_token("asha@example.edu", "longenough").await?;
    let response = app.get("/api/auth/me", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await?;
    assert_eq!(body["data"]["email"], json!("asha@example.edu"));
    assert_eq!(body["data"]["role"], json!("student"));
    assert_eq!(body["data"]["department"], json!("CSE"));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_rejected() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    app.insert_user("taken@example.edu", "longenough", "Taken", "student", None)
        .await?;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({
                "email": "taken@example.edu",
                "password": "longenough",
                "name": "Second",
                "role": "student",
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await?;
    assert_eq!(body["success"], json!(false));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn short_password_is_rejected() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({
                "email": "short@example.edu",
                "password": "short",
                "name": "Short",
                "role": "student",
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    app.insert_user("asha@example.edu", "longenough", "Asha", "student", None)
        .await?;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "email": "asha@example.edu", "password": "wrong-pass" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn refresh_without_cookie_is_unauthorized() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    let response = app.post_json("/api/auth/refresh", &json!({}), None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn profile_update_changes_name_only() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    app.insert_user("asha@example.edu", "longenough", "Asha", "student", Some("CSE"))
        .await?;
    let token = app.login_token("asha@example.edu", "longenough").await?;

    let response = app
        .put_json(
            "/api/auth/me",
            &json!({ "name": "Asha V." }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await?;
    assert_eq!(body["data"]["name"], json!("Asha V."));
    assert_eq!(body["data"]["department"], json!("CSE"));

    app.cleanup().await?;
    Ok(())
}
