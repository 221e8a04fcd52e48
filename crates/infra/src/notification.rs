//! # 通知送信
//!
//! 確認メールの送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **3 つの実装**: SMTP（Mailpit 開発用）、SES（本番用）、Noop（ログ出力のみ）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **再送しない**: 送信失敗はそのまま返す。再送は上流イベントの再配信に任せる

mod noop;
mod ses;
mod smtp;

use async_trait::async_trait;
pub use noop::NoopNotificationSender;
use regmail_domain::notification::{EmailMessage, NotificationError};
pub use ses::SesNotificationSender;
pub use smtp::SmtpNotificationSender;

/// メール送信トレイト
///
/// 1 回の成功呼び出しにつき、送信されるメッセージは 1 通。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError>;
}
