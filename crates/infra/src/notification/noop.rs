//! Noop 通知送信実装
//!
//! 確認メールを送信せず、宛先と件名を info、本文を debug で出力する。
//! SMTP サーバーなしでローカル実行する場合でも、本文中の確認リンクを
//! ログから拾って確認フローを試せる。

use async_trait::async_trait;
use regmail_domain::notification::{EmailMessage, NotificationError};

use super::NotificationSender;

/// Noop 通知送信（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Noop: 確認メール送信をスキップ"
        );
        tracing::debug!(to = %email.to, body = %email.text_body, "Noop: 確認メール本文");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use super::*;

    const LINK: &str = "https://app.example.com/v1/user/verify?email=john%40x.com&token=T";

    /// ログ出力を蓄積するライター
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn make_email() -> EmailMessage {
        EmailMessage {
            to:        "john@x.com".to_string(),
            subject:   "Verify your email address".to_string(),
            html_body: format!("<a href=\"{LINK}\">Verify email address</a>"),
            text_body: format!("Hi John,\n\n{LINK}\n"),
        }
    }

    #[tokio::test]
    async fn send_emailは送信せずに成功する() {
        let result = NoopNotificationSender.send_email(&make_email()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn debugログに確認リンクを含む本文が出力される() {
        let captured = CapturedLog::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        NoopNotificationSender
            .send_email(&make_email())
            .await
            .unwrap();

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("john@x.com"));
        assert!(output.contains(LINK), "ログに確認リンクが含まれること: {output}");
    }
}
