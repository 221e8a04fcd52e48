//! # イベント受信
//!
//! 上流の Pub/Sub（Amazon SNS の HTTP(S) サブスクリプション）が POST する
//! エンベロープを解釈する。
//!
//! ```json
//! {
//!   "Type": "Notification",
//!   "MessageId": "...",
//!   "TopicArn": "arn:aws:sns:...",
//!   "Message": "{\"email\":\"john@x.com\",\"firstName\":\"John\",\"lastName\":\"Doe\"}"
//! }
//! ```
//!
//! 解釈できない本文は部分的に処理せず、呼び出し全体を失敗させる。

use regmail_domain::{DomainError, registration::RegistrationEvent};
use serde::Deserialize;

/// 受信メッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// 登録イベント
    Notification {
        message_id: Option<String>,
        event:      RegistrationEvent,
    },
    /// サブスクリプション確認要求（`SubscribeURL` へのアクセスで確定する）
    SubscriptionConfirmation {
        topic_arn:     Option<String>,
        subscribe_url: String,
    },
    /// サブスクリプション解除の通知
    UnsubscribeConfirmation { topic_arn: Option<String> },
}

#[derive(Debug, Deserialize)]
struct SnsEnvelope {
    #[serde(rename = "Type")]
    message_type:  String,
    #[serde(rename = "MessageId", default)]
    message_id:    Option<String>,
    #[serde(rename = "TopicArn", default)]
    topic_arn:     Option<String>,
    #[serde(rename = "Message", default)]
    message:       Option<String>,
    #[serde(rename = "SubscribeURL", default)]
    subscribe_url: Option<String>,
}

/// エンベロープ本文を解釈する
pub fn parse_envelope(body: &str) -> Result<Inbound, DomainError> {
    let envelope: SnsEnvelope =
        serde_json::from_str(body).map_err(|e| DomainError::MalformedEvent(e.to_string()))?;

    match envelope.message_type.as_str() {
        "Notification" => {
            let message = envelope.message.ok_or_else(|| {
                DomainError::MalformedEvent("Message がありません".to_string())
            })?;
            Ok(Inbound::Notification {
                message_id: envelope.message_id,
                event:      RegistrationEvent::parse(&message)?,
            })
        }
        "SubscriptionConfirmation" => {
            let subscribe_url = envelope.subscribe_url.ok_or_else(|| {
                DomainError::MalformedEvent("SubscribeURL がありません".to_string())
            })?;
            Ok(Inbound::SubscriptionConfirmation {
                topic_arn: envelope.topic_arn,
                subscribe_url,
            })
        }
        "UnsubscribeConfirmation" => Ok(Inbound::UnsubscribeConfirmation {
            topic_arn: envelope.topic_arn,
        }),
        other => Err(DomainError::MalformedEvent(format!(
            "未対応のメッセージ種別: {other}"
        ))),
    }
}
