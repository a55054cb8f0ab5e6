use crate::channels::traits::{
    ChannelAdapter, ChannelId, ChannelOutboundMessage, ReadyInfo, ReadyNotifier,
    ResolvedChannel, SendError,
};
use crate::config::DiscordConfig;
use crate::credentials::Credential;
use crate::error::{NotifierError, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

/// GUILDS only; the bot never reads message content.
const GATEWAY_INTENTS: u64 = 1;

/// Fallback heartbeat interval if HELLO omits one.
const DEFAULT_HEARTBEAT_MS: u64 = 41_250;

/// Gateway close code for a rejected token.
const CLOSE_AUTHENTICATION_FAILED: u16 = 4004;

/// Close codes Discord documents as not reconnectable (shard, version and intent errors).
const FATAL_CLOSE_CODES: [u16; 5] = [4010, 4011, 4012, 4013, 4014];

/// Discord JSON error codes meaning "not allowed here".
const ERR_MISSING_ACCESS: i64 = 50_001;
const ERR_MISSING_PERMISSIONS: i64 = 50_013;

/// Discord channel adapter using the gateway websocket for the session and
/// the REST API for channel lookups and sends.
pub struct DiscordAdapter {
    credential: Credential,
    api_base_url: String,
    client: reqwest::Client,
}

/// Gateway frames the session loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GatewayFrame {
    Hello { heartbeat_interval_ms: u64 },
    Ready { user_name: String, seq: Option<u64> },
    Dispatch { seq: Option<u64> },
    HeartbeatRequest,
    HeartbeatAck,
    Reconnect,
    InvalidSession,
    Unknown,
}

impl DiscordAdapter {
    pub fn new(credential: Credential, config: &DiscordConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| NotifierError::ConnectionFailure(format!("http client: {e}")))?;
        Ok(Self {
            credential,
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base_url)
    }

    /// Check the token against `/users/@me` and return the bot's user name.
    pub async fn verify_credential(&self) -> Result<String> {
        let response = self
            .client
            .get(self.url("/users/@me"))
            .header("Authorization", self.credential.authorization())
            .send()
            .await
            .map_err(|e| NotifierError::ConnectionFailure(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(NotifierError::AuthenticationInvalid(
                "discord rejected the bot token".to_owned(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::ConnectionFailure(format!(
                "discord /users/@me failed ({status}): {body}"
            )));
        }

        let me: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NotifierError::ConnectionFailure(e.to_string()))?;
        Ok(user_display_name(&me))
    }

    async fn gateway_url(&self) -> Result<String> {
        let resp: serde_json::Value = self
            .client
            .get(self.url("/gateway/bot"))
            .header("Authorization", self.credential.authorization())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| NotifierError::ConnectionFailure(format!("gateway lookup: {e}")))?
            .json()
            .await
            .map_err(|e| NotifierError::ConnectionFailure(format!("gateway lookup: {e}")))?;

        let base = resp
            .get("url")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("wss://gateway.discord.gg");
        Ok(format!("{base}/?v=10&encoding=json"))
    }
}

#[async_trait]
impl ChannelAdapter for DiscordAdapter {
    fn id(&self) -> &'static str {
        "discord"
    }

    async fn connect(&self, ready: ReadyNotifier) -> Result<()> {
        let me = self.verify_credential().await?;
        tracing::debug!("discord token accepted for {me}");

        let ws_url = self.gateway_url().await?;
        let (stream, _) = tokio_tungstenite::connect_async(&ws_url)
            .await
            .map_err(|e| NotifierError::ConnectionFailure(format!("gateway connect: {e}")))?;
        let (mut write, mut read) = stream.split();

        let hello = read
            .next()
            .await
            .ok_or_else(|| NotifierError::ConnectionFailure("no hello".to_owned()))?
            .map_err(|e| NotifierError::ConnectionFailure(e.to_string()))?;
        let heartbeat_interval_ms = match hello {
            Message::Text(text) => match parse_gateway_frame(&text) {
                GatewayFrame::Hello {
                    heartbeat_interval_ms,
                } => heartbeat_interval_ms,
                _ => DEFAULT_HEARTBEAT_MS,
            },
            _ => {
                return Err(NotifierError::ConnectionFailure(
                    "unexpected discord hello payload".to_owned(),
                ));
            }
        };

        let identify = json!({
            "op": 2,
            "d": {
                "token": self.credential.expose(),
                "intents": GATEWAY_INTENTS,
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": "bump-notifier",
                    "device": "bump-notifier"
                }
            }
        });
        write
            .send(Message::Text(identify.to_string()))
            .await
            .map_err(|e| NotifierError::ConnectionFailure(format!("identify: {e}")))?;

        let period = Duration::from_millis(heartbeat_interval_ms.max(1));
        let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        let mut ready = Some(ready);
        let mut seq: Option<u64> = None;
        let mut awaiting_ack = false;

        loop {
            let beat = tokio::select! {
                _ = heartbeat.tick() => {
                    if awaiting_ack {
                        return Err(session_dropped(
                            ready.is_none(),
                            "discord stopped acknowledging heartbeats".to_owned(),
                        ));
                    }
                    awaiting_ack = true;
                    true
                }
                maybe_msg = read.next() => {
                    let raw = match maybe_msg {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(frame))) => {
                            let code = frame.as_ref().map(|f| u16::from(f.code));
                            return Err(match code {
                                Some(CLOSE_AUTHENTICATION_FAILED) => {
                                    NotifierError::AuthenticationInvalid(
                                        "discord gateway rejected the bot token".to_owned(),
                                    )
                                }
                                Some(code) if FATAL_CLOSE_CODES.contains(&code) => {
                                    NotifierError::ConnectionFailure(format!(
                                        "discord closed the gateway with code {code}"
                                    ))
                                }
                                _ => session_dropped(
                                    ready.is_none(),
                                    format!("discord websocket closed (code {code:?})"),
                                ),
                            });
                        }
                        None => {
                            return Err(session_dropped(
                                ready.is_none(),
                                "discord websocket closed".to_owned(),
                            ));
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(err)) => {
                            return Err(session_dropped(
                                ready.is_none(),
                                format!("discord websocket error: {err}"),
                            ));
                        }
                    };

                    match parse_gateway_frame(&raw) {
                        GatewayFrame::Ready { user_name, seq: s } => {
                            seq = s.or(seq);
                            if let Some(tx) = ready.take() {
                                // Receiver gone means nobody waits on readiness; keep the session.
                                let _ = tx.send(ReadyInfo { user_name });
                            }
                            false
                        }
                        GatewayFrame::Dispatch { seq: s } => {
                            seq = s.or(seq);
                            false
                        }
                        GatewayFrame::HeartbeatRequest => true,
                        GatewayFrame::HeartbeatAck => {
                            awaiting_ack = false;
                            false
                        }
                        GatewayFrame::Reconnect => {
                            return Err(session_dropped(
                                ready.is_none(),
                                "discord requested a reconnect".to_owned(),
                            ));
                        }
                        GatewayFrame::InvalidSession => {
                            return Err(session_dropped(
                                ready.is_none(),
                                "discord invalidated the session".to_owned(),
                            ));
                        }
                        GatewayFrame::Hello { .. } | GatewayFrame::Unknown => false,
                    }
                }
            };

            if beat {
                let payload = json!({"op": 1, "d": seq});
                write
                    .send(Message::Text(payload.to_string()))
                    .await
                    .map_err(|e| {
                        session_dropped(ready.is_none(), format!("discord heartbeat failed: {e}"))
                    })?;
            }
        }
    }

    async fn resolve_channel(
        &self,
        channel_id: ChannelId,
    ) -> anyhow::Result<Option<ResolvedChannel>> {
        let response = self
            .client
            .get(self.url(&format!("/channels/{channel_id}")))
            .header("Authorization", self.credential.authorization())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("discord channel lookup failed ({status}): {body}");
        }

        let channel: serde_json::Value = response.json().await?;
        let name = channel
            .get("name")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| channel_id.to_string(), str::to_owned);
        Ok(Some(ResolvedChannel {
            id: channel_id,
            name,
        }))
    }

    async fn send(&self, message: ChannelOutboundMessage) -> std::result::Result<(), SendError> {
        let url = self.url(&format!("/channels/{}/messages", message.channel_id));
        let body = json!({
            "content": message.text
        });
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.credential.authorization())
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Other(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_send_failure(status, &body))
    }
}

/// A drop before READY means the bot never came up; after READY it is a lost session.
fn session_dropped(established: bool, reason: String) -> NotifierError {
    if established {
        NotifierError::SessionLost(reason)
    } else {
        NotifierError::ConnectionFailure(reason)
    }
}

fn user_display_name(user: &serde_json::Value) -> String {
    let name = user
        .get("username")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("unknown");
    match user.get("discriminator").and_then(serde_json::Value::as_str) {
        Some(disc) if disc != "0" => format!("{name}#{disc}"),
        _ => name.to_owned(),
    }
}

/// Map a failed `POST /messages` response to a [`SendError`].
pub(crate) fn classify_send_failure(status: StatusCode, body: &str) -> SendError {
    let code = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("code").and_then(serde_json::Value::as_i64));
    if status == StatusCode::FORBIDDEN
        || matches!(code, Some(ERR_MISSING_ACCESS | ERR_MISSING_PERMISSIONS))
    {
        return SendError::PermissionDenied;
    }
    SendError::Other(format!("discord send failed ({status}): {body}"))
}

/// Decode one gateway text frame.
pub(crate) fn parse_gateway_frame(raw: &str) -> GatewayFrame {
    let Ok(payload) = serde_json::from_str::<serde_json::Value>(raw) else {
        return GatewayFrame::Unknown;
    };
    let seq = payload.get("s").and_then(serde_json::Value::as_u64);
    match payload.get("op").and_then(serde_json::Value::as_u64) {
        Some(0) => {
            let event = payload
                .get("t")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            if event == "READY" {
                let user_name = payload
                    .get("d")
                    .and_then(|d| d.get("user"))
                    .map_or_else(|| "unknown".to_owned(), user_display_name);
                GatewayFrame::Ready { user_name, seq }
            } else {
                GatewayFrame::Dispatch { seq }
            }
        }
        Some(1) => GatewayFrame::HeartbeatRequest,
        Some(7) => GatewayFrame::Reconnect,
        Some(9) => GatewayFrame::InvalidSession,
        Some(10) => GatewayFrame::Hello {
            heartbeat_interval_ms: payload
                .get("d")
                .and_then(|v| v.get("heartbeat_interval"))
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(DEFAULT_HEARTBEAT_MS),
        },
        Some(11) => GatewayFrame::HeartbeatAck,
        _ => GatewayFrame::Unknown,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn hello_frame_carries_heartbeat_interval() {
        let frame =
            parse_gateway_frame(r#"{"op":10,"d":{"heartbeat_interval":45000},"s":null,"t":null}"#);
        assert_eq!(
            frame,
            GatewayFrame::Hello {
                heartbeat_interval_ms: 45_000
            }
        );
    }

    #[test]
    fn ready_frame_yields_user_name() {
        let frame = parse_gateway_frame(
            r#"{"op":0,"s":1,"t":"READY","d":{"user":{"username":"BumpBot","discriminator":"0"}}}"#,
        );
        assert_eq!(
            frame,
            GatewayFrame::Ready {
                user_name: "BumpBot".to_owned(),
                seq: Some(1)
            }
        );
    }

    #[test]
    fn legacy_discriminator_is_appended() {
        let user = json!({"username": "BumpBot", "discriminator": "1234"});
        assert_eq!(user_display_name(&user), "BumpBot#1234");
    }

    #[test]
    fn other_dispatches_track_sequence() {
        let frame = parse_gateway_frame(r#"{"op":0,"s":42,"t":"GUILD_CREATE","d":{}}"#);
        assert_eq!(frame, GatewayFrame::Dispatch { seq: Some(42) });
    }

    #[test]
    fn control_opcodes_are_recognised() {
        assert_eq!(
            parse_gateway_frame(r#"{"op":1,"d":null}"#),
            GatewayFrame::HeartbeatRequest
        );
        assert_eq!(
            parse_gateway_frame(r#"{"op":7,"d":null}"#),
            GatewayFrame::Reconnect
        );
        assert_eq!(
            parse_gateway_frame(r#"{"op":9,"d":false}"#),
            GatewayFrame::InvalidSession
        );
        assert_eq!(parse_gateway_frame(r#"{"op":11}"#), GatewayFrame::HeartbeatAck);
        assert_eq!(parse_gateway_frame("not json"), GatewayFrame::Unknown);
    }

    #[test]
    fn drops_after_ready_are_recoverable() {
        let before = session_dropped(false, "closed".to_owned());
        let after = session_dropped(true, "closed".to_owned());
        assert!(matches!(before, NotifierError::ConnectionFailure(_)));
        assert!(before.is_fatal());
        assert!(matches!(after, NotifierError::SessionLost(_)));
        assert!(!after.is_fatal());
    }

    #[test]
    fn forbidden_status_is_permission_denied() {
        assert_eq!(
            classify_send_failure(StatusCode::FORBIDDEN, ""),
            SendError::PermissionDenied
        );
    }

    #[test]
    fn missing_permissions_code_is_permission_denied() {
        let body = r#"{"message":"Missing Permissions","code":50013}"#;
        assert_eq!(
            classify_send_failure(StatusCode::BAD_REQUEST, body),
            SendError::PermissionDenied
        );
    }

    #[test]
    fn server_error_is_other() {
        match classify_send_failure(StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            SendError::Other(detail) => assert!(detail.contains("500")),
            SendError::PermissionDenied => panic!("500 is not a permission error"),
        }
    }
}
