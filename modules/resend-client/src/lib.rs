pub mod error;

pub use error::{ResendError, Result};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

const API_URL: &str = "https://api.resend.com";

pub struct ResendClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendEmailRequest {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailResponse {
    pub id: String,
}

impl ResendClient {
    pub fn new(api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.to_string(),
            base_url: API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Send one email. No retries; the caller decides what a failure means.
    pub async fn send(&self, request: &SendEmailRequest) -> Result<SendEmailResponse> {
        let endpoint = format!("{}/emails", self.base_url);

        let resp = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ResendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendEmailResponse = resp.json().await?;
        info!(id = %sent.id, "Email accepted by Resend");
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn send_posts_to_emails_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(body_partial_json(serde_json::json!({
                "to": ["reader@example.test"],
                "subject": "Digest"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "em_123"})),
            )
            .mount(&server)
            .await;

        let client = ResendClient::new("re-key").with_base_url(&server.uri());
        let sent = client
            .send(&SendEmailRequest {
                from: "Digest <digest@example.test>".to_string(),
                to: vec!["reader@example.test".to_string()],
                subject: "Digest".to_string(),
                html: "<h1>hi</h1>".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(sent.id, "em_123");
    }

    #[tokio::test]
    async fn api_failure_is_an_error_not_a_panic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid from"))
            .mount(&server)
            .await;

        let client = ResendClient::new("re-key").with_base_url(&server.uri());
        let err = client
            .send(&SendEmailRequest {
                from: "nope".to_string(),
                to: vec!["reader@example.test".to_string()],
                subject: "Digest".to_string(),
                html: String::new(),
            })
            .await
            .unwrap_err();

        match err {
            ResendError::Api { status, .. } => assert_eq!(status, 422),
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
