mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn register_and_login() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let email = common::unique_email("reg");

    let res = client
        .post(server.url("/tickets"))
        .json(&json!({"action": "register", "email": email, "password": "Valid123!", "name": "Pat"}))
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body.get("password").is_none());

    let res = client
        .post(server.url("/tickets"))
        .json(&json!({"action": "login", "email": email, "password": "Valid123!"}))
        .send()
        .await?;
    let (status, body) = common::read(res).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["name"], "Pat");
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let email = common::unique_email("dup");
    let payload = json!({"action": "register", "email": email, "password": "Valid123!", "name": "Pat"});

    let first = client.post(server.url("/tickets")).json(&payload).send().await?;
    assert_eq!(first.status(), StatusCode::OK);

    let (status, body) = common::read(client.post(server.url("/tickets")).json(&payload).send().await?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn weak_passwords_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for weak in ["short1!", "alllowercase1!", "NoDigits!!", "NoSymbol123"] {
        let email = common::unique_email("weak");
        let res = client
            .post(server.url("/tickets"))
            .json(&json!({"action": "register", "email": email, "password": weak}))
            .send()
            .await?;
        let (status, body) = common::read(res).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} -> {}", weak, body);
        assert!(body["field_errors"]["password"].is_string(), "{}", body);
    }
    Ok(())
}

#[tokio::test]
async fn failed_logins_are_indistinguishable() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let email = common::unique_email("login");

    client
        .post(server.url("/tickets"))
        .json(&json!({"action": "register", "email": email, "password": "Valid123!"}))
        .send()
        .await?;

    let wrong = client
        .post(server.url("/tickets"))
        .json(&json!({"action": "login", "email": email, "password": "Wrong123!"}))
        .send()
        .await?;
    let unknown = client
        .post(server.url("/tickets"))
        .json(&json!({"action": "login", "email": common::unique_email("ghost"), "password": "Valid123!"}))
        .send()
        .await?;

    let (wrong_status, wrong_body) = common::read(wrong).await?;
    let (unknown_status, unknown_body) = common::read(unknown).await?;
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    Ok(())
}
