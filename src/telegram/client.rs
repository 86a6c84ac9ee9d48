//! Bot API HTTP client

use super::types::{
    ApiResponse, GetUpdates, InputMedia, LinkPreviewOptions, SendDocument, SendMediaGroup,
    SendMessage, SendPhoto, Update,
};
use crate::runtime::{ChatId, Transport, TransportError};
use crate::state_machine::{MediaKind, MediaRef};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Wait used when a rate-limited answer does not say how long to back off
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Slack on top of the long-poll timeout before the HTTP request gives up
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TelegramError {
    /// Transport-level failure; the request URL is stripped so the token
    /// never reaches logs
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        TelegramError::Http(e.without_url())
    }
}

impl From<TelegramError> for TransportError {
    fn from(e: TelegramError) -> Self {
        match e {
            TelegramError::RateLimited { retry_after } => TransportError::RateLimited { retry_after },
            other => TransportError::Failed(other.to_string()),
        }
    }
}

/// Bot API client bound to one bot token
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    /// `{api}/bot{token}`; never logged
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(poll_timeout + REQUEST_TIMEOUT_SLACK)
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, TelegramError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_response(status, &body)
    }

    /// Long-poll for message updates after `offset`
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdates {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &request).await
    }

    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        rich: bool,
    ) -> Result<(), TelegramError> {
        let request = SendMessage {
            chat_id,
            text,
            parse_mode: rich.then_some("HTML"),
            link_preview_options: LinkPreviewOptions { is_disabled: rich },
        };
        self.call::<_, IgnoredAny>("sendMessage", &request).await?;
        Ok(())
    }

    /// Send one or more already-uploaded files. A single item goes out as a
    /// plain photo or document since the platform rejects one-element
    /// groups.
    pub async fn send_media(&self, chat_id: ChatId, media: &[MediaRef]) -> Result<(), TelegramError> {
        match media {
            [] => Ok(()),
            [single] => {
                match single.kind {
                    MediaKind::Photo => {
                        let request = SendPhoto {
                            chat_id,
                            photo: &single.file_id,
                        };
                        self.call::<_, IgnoredAny>("sendPhoto", &request).await?;
                    }
                    MediaKind::Document => {
                        let request = SendDocument {
                            chat_id,
                            document: &single.file_id,
                        };
                        self.call::<_, IgnoredAny>("sendDocument", &request).await?;
                    }
                }
                Ok(())
            }
            many => {
                let request = SendMediaGroup {
                    chat_id,
                    media: many.iter().map(input_media).collect(),
                };
                self.call::<_, IgnoredAny>("sendMediaGroup", &request).await?;
                Ok(())
            }
        }
    }
}

fn input_media(media: &MediaRef) -> InputMedia<'_> {
    match media.kind {
        MediaKind::Photo => InputMedia::Photo {
            media: &media.file_id,
        },
        MediaKind::Document => InputMedia::Document {
            media: &media.file_id,
        },
    }
}

/// Classify a Bot API answer into a result or a typed error
fn decode_response<R: DeserializeOwned>(status: StatusCode, body: &str) -> Result<R, TelegramError> {
    let envelope: ApiResponse<R> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if status == StatusCode::TOO_MANY_REQUESTS => {
            return Err(TelegramError::RateLimited {
                retry_after: DEFAULT_RETRY_AFTER,
            })
        }
        Err(e) => {
            return Err(TelegramError::Decode(format!("HTTP {status}: {e}")));
        }
    };

    if envelope.ok {
        return envelope
            .result
            .ok_or_else(|| TelegramError::Decode("missing result".to_string()));
    }

    let code = envelope.error_code.unwrap_or_else(|| i64::from(status.as_u16()));
    if code == 429 || status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = envelope
            .parameters
            .and_then(|p| p.retry_after)
            .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs);
        return Err(TelegramError::RateLimited { retry_after });
    }

    Err(TelegramError::Api {
        code,
        description: envelope
            .description
            .unwrap_or_else(|| "no description".to_string()),
    })
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        rich: bool,
    ) -> Result<(), TransportError> {
        self.send_message(chat_id, text, rich).await?;
        Ok(())
    }

    async fn send_media_group(
        &self,
        chat_id: ChatId,
        media: &[MediaRef],
    ) -> Result<(), TransportError> {
        self.send_media(chat_id, media).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "123:secret";

    async fn client_for(server: &MockServer) -> TelegramClient {
        TelegramClient::new(&server.uri(), TOKEN, Duration::from_secs(1)).unwrap()
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": result}))
    }

    fn sent_message() -> serde_json::Value {
        json!({"message_id": 1, "date": 0, "chat": {"id": 5, "type": "private"}})
    }

    #[tokio::test]
    async fn test_send_message_uses_html_without_previews() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .and(body_partial_json(json!({
                "chat_id": 5,
                "text": "<b>hi</b>",
                "parse_mode": "HTML",
                "link_preview_options": {"is_disabled": true}
            })))
            .respond_with(ok(sent_message()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.send_text(5, "<b>hi</b>", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_plain_message_has_no_parse_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .respond_with(ok(sent_message()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.send_text(5, "a < b", false).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("parse_mode").is_none());
    }

    #[tokio::test]
    async fn test_get_updates_decodes_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getUpdates")))
            .and(body_partial_json(json!({"offset": 11, "timeout": 1})))
            .respond_with(ok(json!([
                {"update_id": 11, "message": {
                    "message_id": 3, "date": 0,
                    "chat": {"id": 5, "type": "private"},
                    "text": "/new_report"
                }}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let updates = client
            .get_updates(Some(11), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 11);
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 7",
                "parameters": {"retry_after": 7}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.send_text(5, "x", false).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::RateLimited { retry_after } if retry_after == Duration::from_secs(7)
        ));
    }

    #[tokio::test]
    async fn test_api_error_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.send_message(5, "x", false).await.unwrap_err();
        match err {
            TelegramError::Api { code, description } => {
                assert_eq!(code, 400);
                assert!(description.contains("chat not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.send_message(5, "x", false).await.unwrap_err();
        assert!(matches!(err, TelegramError::Decode(_)));
        assert!(!err.to_string().contains(TOKEN));
    }

    #[tokio::test]
    async fn test_single_photo_uses_send_photo() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendPhoto")))
            .and(body_partial_json(json!({"chat_id": 5, "photo": "p1"})))
            .respond_with(ok(sent_message()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .send_media_group(5, &[MediaRef::photo("p1")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_single_document_uses_send_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendDocument")))
            .and(body_partial_json(json!({"chat_id": 5, "document": "d1"})))
            .respond_with(ok(sent_message()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .send_media_group(5, &[MediaRef::document("d1")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_several_items_use_media_group() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMediaGroup")))
            .and(body_partial_json(json!({
                "chat_id": 5,
                "media": [
                    {"type": "photo", "media": "p1"},
                    {"type": "photo", "media": "p2"}
                ]
            })))
            .respond_with(ok(json!([sent_message(), sent_message()])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .send_media_group(5, &[MediaRef::photo("p1"), MediaRef::photo("p2")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_media_sends_nothing() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;
        client.send_media_group(5, &[]).await.unwrap();
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
