//! # イベント受信ハンドラ
//!
//! `POST /events` で SNS のエンベロープを受け取り、種別ごとに処理を振り分ける。
//!
//! | 種別 | 処理 | `status` |
//! |------|------|----------|
//! | `Notification` | 確認メール送信 | `sent` / `already_sent` |
//! | `SubscriptionConfirmation` | `SubscribeURL` へアクセス | `subscription_confirmed` |
//! | `UnsubscribeConfirmation` | 受領のみ | `unsubscribe_acknowledged` |
//!
//! SNS は `Content-Type: text/plain` で送信するため、本文は文字列として受け取る。

use std::sync::Arc;

use axum::{Json, extract::State};
use regmail_shared::{event_log::event, log_business_event};
use serde::{Deserialize, Serialize};

use crate::{
    error::MailerError,
    intake::{Inbound, parse_envelope},
    subscription::SubscriptionConfirmer,
    usecase::VerificationMailer,
};

/// 全リクエストで共有する状態
///
/// クライアント類は起動時に 1 度だけ構築する。
pub struct AppState {
    pub mailer:    VerificationMailer,
    pub confirmer: Arc<dyn SubscriptionConfirmer>,
}

/// 呼び出し結果
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvocationResponse {
    pub status:  String,
    pub message: String,
}

impl InvocationResponse {
    fn new(status: &str, message: &str) -> Self {
        Self {
            status:  status.to_string(),
            message: message.to_string(),
        }
    }
}

/// SNS エンベロープ受信
///
/// ## エンドポイント
/// POST /events
#[tracing::instrument(skip_all)]
pub async fn receive_event(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<InvocationResponse>, MailerError> {
    let response = match parse_envelope(&body)? {
        Inbound::Notification {
            message_id,
            event: registration,
        } => {
            tracing::debug!(message_id = ?message_id, "登録イベントを受信");
            let outcome = state.mailer.handle(registration).await?;
            InvocationResponse::new(outcome.status(), outcome.message())
        }
        Inbound::SubscriptionConfirmation {
            topic_arn,
            subscribe_url,
        } => {
            state.confirmer.confirm(&subscribe_url).await?;
            log_business_event!(
                event.category = event::category::SUBSCRIPTION,
                event.action = event::action::SUBSCRIPTION_CONFIRMED,
                event.result = event::result::SUCCESS,
                subscription.topic_arn = ?topic_arn,
                "SNS サブスクリプションを確認"
            );
            InvocationResponse::new("subscription_confirmed", "Subscription confirmed")
        }
        Inbound::UnsubscribeConfirmation { topic_arn } => {
            tracing::info!(topic_arn = ?topic_arn, "SNS サブスクリプション解除を受領");
            InvocationResponse::new("unsubscribe_acknowledged", "Unsubscribe acknowledged")
        }
    };

    Ok(Json(response))
}
