use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    application::services::transport::ChannelTransport,
    domain::{
        errors::TransportError,
        models::{ChannelTarget, MessageRef, RenderedMessage},
    },
};

const PARSE_MODE: &str = "HTML";

/// Telegram Bot API transport.
///
/// Picks the API method from the message shape: bare text goes through
/// `sendMessage`, a single photo through `sendPhoto` with the text as caption,
/// and several photos through `sendMediaGroup` with the caption on the first
/// item.
pub struct TelegramTransport {
    http: Client,
    base_url: String,
    token: String,
}

impl TelegramTransport {
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, "https://api.telegram.org".to_string())
    }

    pub fn with_base_url(token: String, base_url: String) -> Self {
        Self {
            http: Client::builder()
                .user_agent("listing-relay/telegram")
                .timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build telegram client"),
            base_url,
            token,
        }
    }

    fn build_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, TransportError> {
        let response = self
            .http
            .post(self.build_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|err| TransportError::Transient(format!("{method} request failed: {err}")))?;

        let status = response.status();
        let body: ApiResponse<T> = response.json().await.map_err(|err| {
            TransportError::Transient(format!("{method} returned unreadable body: {err}"))
        })?;

        if body.ok {
            return body
                .result
                .ok_or_else(|| TransportError::Fatal(format!("{method} returned no result")));
        }

        let detail = format!(
            "{method}: {}",
            body.description.unwrap_or_else(|| status.to_string())
        );
        if status == StatusCode::TOO_MANY_REQUESTS || body.error_code == Some(429) {
            let retry_after = body
                .parameters
                .and_then(|p| p.retry_after)
                .map(Duration::from_secs);
            Err(TransportError::RateLimited {
                retry_after,
                detail,
            })
        } else if status.is_server_error() {
            Err(TransportError::Transient(detail))
        } else {
            Err(TransportError::Fatal(detail))
        }
    }

    async fn send_text(
        &self,
        target: &ChannelTarget,
        text: &str,
    ) -> Result<MessageRef, TransportError> {
        let sent: SentMessage = self
            .call(
                "sendMessage",
                &json!({
                    "chat_id": target.handle,
                    "text": text,
                    "parse_mode": PARSE_MODE,
                    "disable_web_page_preview": false,
                }),
            )
            .await?;
        Ok(MessageRef(sent.message_id))
    }

    async fn send_photo(
        &self,
        target: &ChannelTarget,
        photo: &str,
        caption: &str,
    ) -> Result<MessageRef, TransportError> {
        let sent: SentMessage = self
            .call(
                "sendPhoto",
                &json!({
                    "chat_id": target.handle,
                    "photo": photo,
                    "caption": caption,
                    "parse_mode": PARSE_MODE,
                }),
            )
            .await?;
        Ok(MessageRef(sent.message_id))
    }

    async fn send_media_group(
        &self,
        target: &ChannelTarget,
        photos: &[String],
        caption: &str,
    ) -> Result<MessageRef, TransportError> {
        let media: Vec<serde_json::Value> = photos
            .iter()
            .enumerate()
            .map(|(i, url)| {
                if i == 0 {
                    json!({
                        "type": "photo",
                        "media": url,
                        "caption": caption,
                        "parse_mode": PARSE_MODE,
                    })
                } else {
                    json!({ "type": "photo", "media": url })
                }
            })
            .collect();

        let sent: Vec<SentMessage> = self
            .call(
                "sendMediaGroup",
                &json!({
                    "chat_id": target.handle,
                    "media": media,
                }),
            )
            .await?;
        sent.first()
            .map(|m| MessageRef(m.message_id))
            .ok_or_else(|| TransportError::Fatal("sendMediaGroup returned no messages".into()))
    }
}

#[async_trait]
impl ChannelTransport for TelegramTransport {
    async fn send(
        &self,
        target: &ChannelTarget,
        message: &RenderedMessage,
    ) -> Result<MessageRef, TransportError> {
        debug!(channel = %target.handle, photos = message.photos.len(), "sending to telegram");
        match message.photos.as_slice() {
            [] => self.send_text(target, &message.text).await,
            [photo] => self.send_photo(target, photo, &message.text).await,
            photos => self.send_media_group(target, photos, &message.text).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self.call::<BotUser>("getMe", &json!({})).await {
            Ok(me) => {
                debug!(username = %me.username.unwrap_or_default(), "bot reachable");
                true
            }
            Err(err) => {
                debug!(error = %err, "bot health check failed");
                false
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    description: Option<String>,
    error_code: Option<i64>,
    parameters: Option<ResponseParameters>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_parses_retry_after() {
        let body = r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 14","parameters":{"retry_after":14}}"#;
        let parsed: ApiResponse<SentMessage> = serde_json::from_str(body).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.error_code, Some(429));
        assert_eq!(parsed.parameters.unwrap().retry_after, Some(14));
    }

    #[test]
    fn success_envelope_parses_message_id() {
        let body = r#"{"ok":true,"result":{"message_id":12345,"chat":{"id":1}}}"#;
        let parsed: ApiResponse<SentMessage> = serde_json::from_str(body).unwrap();
        assert!(parsed.ok);
        assert_eq!(parsed.result.unwrap().message_id, 12345);
    }
}
