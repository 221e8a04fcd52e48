//! # 通知
//!
//! 確認メールの送信に関するドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **送信失敗は呼び出し元へ伝播**: このサービスは再送しない。再送は上流の再配信に任せる
//! - **テンプレート分離**: メッセージ生成（TemplateRenderer）と送信（NotificationSender）は分離

use thiserror::Error;

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。NotificationSender に渡される。
/// 送信元アドレスは送信実装側が保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}
