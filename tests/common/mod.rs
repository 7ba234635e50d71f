#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_helpdesk"));
        cmd.arg("serve")
            .env("HELPDESK_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("SECURITY_TOKEN_VERIFICATION", "unverified")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Fresh address so tests sharing the server never collide
pub fn unique_email(label: &str) -> String {
    format!("{}-{}@example.com", label, uuid::Uuid::new_v4().simple())
}

/// Bearer credential with the given payload; the signature is not checked
pub fn unsigned_token(payload: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256", "typ": "JWT"}).to_string());
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}

pub fn user_token(email: &str) -> String {
    unsigned_token(json!({"email": email, "cognito:groups": ["Users"]}))
}

pub fn admin_token(email: &str) -> String {
    unsigned_token(json!({"email": email, "cognito:groups": "Admin"}))
}

/// Status plus parsed JSON body
pub async fn read(res: Response) -> Result<(StatusCode, Value)> {
    let status = res.status();
    let body = res.json::<Value>().await.context("response body was not JSON")?;
    Ok((status, body))
}

/// Create a ticket through the API and return its id
pub async fn create_ticket(server: &TestServer, owner: Option<&str>) -> Result<String> {
    let client = reqwest::Client::new();
    let mut payload = json!({"title": "Integration ticket", "description": "d", "priority": "Low"});
    if let Some(owner) = owner {
        payload["user_email"] = json!(owner);
    }
    let (status, body) = read(client.post(server.url("/tickets")).json(&payload).send().await?).await?;
    anyhow::ensure!(status == StatusCode::OK, "create failed: {} {}", status, body);
    body["ticket_id"]
        .as_str()
        .map(str::to_string)
        .context("create response had no ticket_id")
}
