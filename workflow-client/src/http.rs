use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{Command, CommandReply, ErrorResponse, ItemSnapshot, Timeline};
use std::fmt;

use crate::backend::Backend;
use crate::error::{ClientError, ClientResult};

/// Opaque per-session credential. Never printed.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(**redacted**)")
    }
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    credential: Option<Credential>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, credential: Option<Credential>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        }
    }

    fn token(&self) -> ClientResult<&str> {
        self.credential
            .as_ref()
            .map(|credential| credential.0.as_str())
            .ok_or_else(|| ClientError::Unauthorized("missing session credential".to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let token = self.token()?;
        let response = self.client.get(self.url(path)).bearer_auth(token).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => format!("unexpected status {}", status),
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = error_message(response).await;
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized(message)),
        s if s.is_client_error() => Err(ClientError::Rejected(message)),
        _ => Err(ClientError::Transport(message)),
    }
}

/// Failed commands come back as 422 with a reply body. A 422 without one is
/// the router refusing the request itself, e.g. a body it cannot decode.
fn unprocessable_reply(body: &str) -> ClientResult<CommandReply> {
    if let Ok(reply) = serde_json::from_str::<CommandReply>(body) {
        return Ok(reply);
    }
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error) => error.error,
        Err(_) if body.trim().is_empty() => "unprocessable command".to_string(),
        Err(_) => body.trim().to_string(),
    };
    Err(ClientError::Rejected(message))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_item_state(&self, item_id: i64) -> ClientResult<ItemSnapshot> {
        self.get_json(&format!("/items/{}/state", item_id)).await
    }

    async fn execute(&self, command: Command) -> ClientResult<CommandReply> {
        let token = self.token()?;
        let response = self
            .client
            .post(self.url(&format!("/items/{}/commands", command.item_id)))
            .bearer_auth(token)
            .json(&command)
            .send()
            .await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await?;
            return unprocessable_reply(&body);
        }
        let response = check_status(response).await?;
        Ok(response.json::<CommandReply>().await?)
    }

    async fn get_timeline(&self, item_id: i64) -> ClientResult<Timeline> {
        self.get_json(&format!("/items/{}/timeline", item_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Intent;

    #[tokio::test]
    async fn missing_credential_blocks_before_sending() {
        // Port 9 is never contacted: the credential check fails first.
        let backend = HttpBackend::new("http://127.0.0.1:9/", None);
        let err = backend.get_item_state(1).await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized(_)));

        let command = Command::new(1, Intent::AwardBid { bid_id: 2 });
        let err = backend.execute(command).await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized(_)));
    }

    #[test]
    fn unprocessable_reply_body_is_a_failed_command() {
        let command = Command::new(1, Intent::AwardBid { bid_id: 2 });
        let failed = CommandReply::failed(&command, "Bid 2 is already awarded");
        let body = serde_json::to_string(&failed).unwrap();
        assert_eq!(unprocessable_reply(&body), Ok(failed));
    }

    #[test]
    fn unprocessable_plain_text_is_rejected_verbatim() {
        let body = "Failed to deserialize the JSON body into the target type: intent: unknown variant `ship_it`";
        assert_eq!(
            unprocessable_reply(body),
            Err(ClientError::Rejected(body.to_string()))
        );
        assert_eq!(
            unprocessable_reply(r#"{"error":"bad packet"}"#),
            Err(ClientError::Rejected("bad packet".to_string()))
        );
    }

    #[test]
    fn credential_is_redacted() {
        let credential = Credential::new("secret-token");
        assert_eq!(format!("{:?}", credential), "Credential(**redacted**)");
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:3001/", None);
        assert_eq!(backend.url("/health"), "http://localhost:3001/health");
    }
}
