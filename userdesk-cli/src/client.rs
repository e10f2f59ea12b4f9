use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde_json::{json, Value};
use tracing::debug;

/// Build an HTTP client with optional Bearer token default header.
pub fn build_client(token: &Option<String>) -> anyhow::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(tok) = token {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {}", tok).parse()?);
        builder = builder.default_headers(headers);
    }
    Ok(builder.build()?)
}

/// Normalize non-2xx responses into errors while returning the response on success.
///
/// The API answers errors with `{code, message}`; both are folded into the error text.
pub async fn handle_error(resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    debug!(url = %resp.url(), status = %resp.status(), "api response");
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body: Value = resp
        .json()
        .await
        .unwrap_or_else(|_| json!({"message": "unknown error"}));
    let text = describe_error(status, &body);
    debug!(body = %body, "api error body");
    Err(anyhow::anyhow!(text))
}

fn describe_error(status: reqwest::StatusCode, body: &Value) -> String {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    match body.get("code").and_then(Value::as_str) {
        Some(code) => format!("request failed {} [{}]: {}", status, code, message),
        None => format!("request failed {}: {}", status, message),
    }
}
