//! Telegram Bot API transport.
//!
//! Delivers messages via `sendMessage`, publishes the command menu via
//! `setMyCommands` and long-polls `getUpdates` for inbound commands.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use svitlo_core::config::TelegramConfig;
use svitlo_core::ChatId;

use crate::traits::{ChatTransport, CommandSpec, DeliveryError, SendOptions};

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Sends and receives through the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramTransport {
    api_base: String,
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramTransport {
    /// Creates a transport from configuration values.
    ///
    /// Returns [`DeliveryError::Config`] if no bot token is configured.
    pub fn from_config(config: &TelegramConfig) -> Result<Self, DeliveryError> {
        let token = config
            .bot_token
            .clone()
            .ok_or_else(|| DeliveryError::Config("TELEGRAM_BOT_TOKEN is not set".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.send_timeout_secs))
            .build()?;
        Self::new(&config.api_url, token, client)
    }

    pub fn new(
        api_base: &str,
        bot_token: String,
        client: reqwest::Client,
    ) -> Result<Self, DeliveryError> {
        if bot_token.trim().is_empty() {
            return Err(DeliveryError::Config(
                "Telegram bot token must not be empty".to_string(),
            ));
        }
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token,
            client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<T, DeliveryError> {
        let mut request = self.client.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let parsed: Option<ApiResponse<T>> = serde_json::from_str(&text).ok();
        let (description, retry_after) = match parsed {
            Some(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) => return Ok(result),
            Some(resp) => (
                resp.description
                    .unwrap_or_else(|| "Unknown Telegram API error".to_string()),
                resp.parameters.and_then(|p| p.retry_after),
            ),
            None => (text.chars().take(200).collect(), None),
        };

        Err(classify_failure(status.as_u16(), description, retry_after))
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, DeliveryError> {
        let mut body = serde_json::json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = serde_json::Value::from(offset);
        }
        // The HTTP timeout must outlive the server-side long poll.
        let http_timeout = Duration::from_secs(timeout_secs + 10);
        self.call("getUpdates", &body, Some(http_timeout)).await
    }
}

fn classify_failure(status: u16, description: String, retry_after: Option<u64>) -> DeliveryError {
    match status {
        403 => DeliveryError::Blocked(description),
        429 => DeliveryError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(30),
        },
        _ => DeliveryError::Api {
            status,
            description,
        },
    }
}

fn send_message_body(chat_id: ChatId, text: &str, options: &SendOptions) -> serde_json::Value {
    let mut body = serde_json::json!({
        "chat_id": chat_id.0,
        "text": text,
    });
    if let Some(mode) = options.parse_mode {
        body["parse_mode"] = serde_json::to_value(mode).unwrap_or(serde_json::Value::Null);
    }
    if let Some(ref keyboard) = options.keyboard {
        let rows: Vec<Vec<serde_json::Value>> = keyboard
            .rows
            .iter()
            .map(|row| row.iter().map(|label| serde_json::json!({ "text": label })).collect())
            .collect();
        body["reply_markup"] = serde_json::json!({
            "keyboard": rows,
            "resize_keyboard": keyboard.resize,
        });
    }
    body
}

#[async_trait::async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), DeliveryError> {
        let body = send_message_body(chat_id, text, options);
        tracing::debug!(%chat_id, parse_mode = ?options.parse_mode, "Sending Telegram message");
        let _: serde_json::Value = self.call("sendMessage", &body, None).await?;
        Ok(())
    }

    async fn register_commands(&self, commands: &[CommandSpec]) -> Result<(), DeliveryError> {
        let body = serde_json::json!({ "commands": commands });
        let _: bool = self.call("setMyCommands", &body, None).await?;
        tracing::info!(count = commands.len(), "Telegram commands registered");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ParseMode, ReplyKeyboard};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> TelegramTransport {
        TelegramTransport::new(&server.uri(), "123:ABC".to_string(), reqwest::Client::new()).unwrap()
    }

    #[test]
    fn empty_token_rejected() {
        let err = TelegramTransport::new("https://api.telegram.org", "  ".to_string(), reqwest::Client::new())
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn missing_token_in_config_rejected() {
        let config = TelegramConfig {
            bot_token: None,
            api_url: "https://api.telegram.org".to_string(),
            send_timeout_secs: 10,
            broadcast_concurrency: 8,
            updates_timeout_secs: 30,
        };
        assert!(matches!(
            TelegramTransport::from_config(&config),
            Err(DeliveryError::Config(_))
        ));
    }

    #[test]
    fn body_carries_markdown_and_keyboard() {
        let options = SendOptions::markdown().with_keyboard(ReplyKeyboard::single("🔄 Перевірити графік"));
        let body = send_message_body(ChatId(42), "*hi*", &options);
        assert_eq!(body["chat_id"], 42);
        assert_eq!(body["parse_mode"], "Markdown");
        assert_eq!(body["reply_markup"]["keyboard"][0][0]["text"], "🔄 Перевірити графік");
        assert_eq!(body["reply_markup"]["resize_keyboard"], true);
    }

    #[test]
    fn plain_body_has_no_optional_fields() {
        let body = send_message_body(ChatId(1), "x", &SendOptions::default());
        assert!(body.get("parse_mode").is_none());
        assert!(body.get("reply_markup").is_none());
    }

    #[tokio::test]
    async fn send_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:ABC/sendMessage"))
            .and(body_partial_json(serde_json::json!({ "chat_id": 7, "text": "hello" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "message_id": 1, "chat": { "id": 7 }, "text": "hello" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        transport(&server)
            .send_message(ChatId(7), "hello", &SendOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn forbidden_is_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            })))
            .mount(&server)
            .await;

        let err = transport(&server)
            .send_message(ChatId(7), "hello", &SendOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_blocked());
        assert!(err.to_string().contains("blocked by the user"));
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 7",
                "parameters": { "retry_after": 7 }
            })))
            .mount(&server)
            .await;

        let err = transport(&server)
            .send_message(ChatId(7), "hello", &SendOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::RateLimited { retry_after_secs: 7 }));
        assert!(!err.is_blocked());
    }

    #[tokio::test]
    async fn other_failures_are_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = transport(&server)
            .send_message(ChatId(7), "hello", &SendOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Api { status: 502, ref description } if description == "Bad Gateway"));
    }

    #[tokio::test]
    async fn register_commands_posts_menu() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:ABC/setMyCommands"))
            .and(body_partial_json(serde_json::json!({
                "commands": [{ "command": "start", "description": "Підписатися" }]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true, "result": true })),
            )
            .expect(1)
            .mount(&server)
            .await;

        transport(&server)
            .register_commands(&[CommandSpec::new("start", "Підписатися")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn get_updates_decodes_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:ABC/getUpdates"))
            .and(body_partial_json(serde_json::json!({ "offset": 11, "timeout": 0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    { "update_id": 11, "message": { "message_id": 3, "chat": { "id": 99, "type": "private" }, "text": "/start" } },
                    { "update_id": 12, "edited_message": { "chat": { "id": 99 } } }
                ]
            })))
            .mount(&server)
            .await;

        let updates = transport(&server).get_updates(Some(11), 0).await.unwrap();
        assert_eq!(updates.len(), 2);
        let first = updates[0].message.as_ref().unwrap();
        assert_eq!(first.chat.id, 99);
        assert_eq!(first.text.as_deref(), Some("/start"));
        assert!(updates[1].message.is_none());
    }

    #[test]
    fn parse_mode_none_by_default() {
        assert_eq!(SendOptions::default().parse_mode, None);
        assert_eq!(SendOptions::markdown().parse_mode, Some(ParseMode::Markdown));
    }
}
