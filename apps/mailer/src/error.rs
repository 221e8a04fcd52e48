//! # Mailer エラー定義
//!
//! 呼び出し全体を失敗させるエラーと、HTTP レスポンスへの変換を定義する。
//!
//! 上流（SNS）は 2xx 以外の応答を配信失敗とみなして再配信する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regmail_domain::DomainError;
use regmail_shared::event_log::error;
use serde::Serialize;
use thiserror::Error;

use crate::{subscription::SubscriptionError, usecase::VerificationError};

/// エラーレスポンス（RFC 7807 Problem Details）
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
}

/// Mailer で発生するエラー
#[derive(Debug, Error)]
pub enum MailerError {
    /// 受信本文を解釈できない
    #[error("不正なイベント: {0}")]
    MalformedEvent(#[from] DomainError),

    /// 確認メール送信の失敗
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// SNS サブスクリプション確認の失敗
    #[error("サブスクリプション確認に失敗: {0}")]
    Subscription(#[from] SubscriptionError),
}

impl IntoResponse for MailerError {
    fn into_response(self) -> Response {
        let (status, error_type, title, detail) = match &self {
            MailerError::MalformedEvent(e) => {
                tracing::warn!(
                    error.category = error::category::INPUT,
                    error.kind = error::kind::MALFORMED_EVENT,
                    error = %e,
                    "不正なイベントを受信"
                );
                (
                    StatusCode::BAD_REQUEST,
                    "https://regmail.example.com/errors/malformed-event",
                    "Bad Request",
                    e.to_string(),
                )
            }
            MailerError::Verification(e) => {
                // 詳細はユースケース層で error.kind 付きで出力済み
                tracing::error!("確認メール処理に失敗: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "https://regmail.example.com/errors/internal-error",
                    "Internal Server Error",
                    "内部エラーが発生しました".to_string(),
                )
            }
            MailerError::Subscription(e) => {
                tracing::error!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::SUBSCRIPTION_CONFIRMATION,
                    error = %e,
                    "サブスクリプション確認に失敗"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "https://regmail.example.com/errors/internal-error",
                    "Internal Server Error",
                    "内部エラーが発生しました".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error_type: error_type.to_string(),
                title: title.to_string(),
                status: status.as_u16(),
                detail,
            }),
        )
            .into_response()
    }
}
