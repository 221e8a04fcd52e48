//! SMTP 通知送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）に接続する。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Message, MultiPart, SinglePart, header::ContentType},
};
use regmail_domain::notification::{EmailMessage, NotificationError};

use super::NotificationSender;

/// SMTP 通知送信
pub struct SmtpNotificationSender {
    transport:    AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotificationSender {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `host`: SMTP サーバーのホスト名（例: "localhost"）
    /// - `port`: SMTP サーバーのポート番号（例: 1025 for Mailpit）
    /// - `from_address`: 送信元メールアドレス
    pub fn new(host: &str, port: u16, from_address: String) -> Self {
        // builder_dangerous: TLS なしで接続（Mailpit 等のローカル SMTP 向け）
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();

        Self {
            transport,
            from_address,
        }
    }

    /// 送信用の MIME メッセージ（text/plain + text/html の multipart/alternative）を組み立てる
    fn build_message(&self, email: &EmailMessage) -> Result<Message, NotificationError> {
        Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| NotificationError::SendFailed(format!("送信元アドレス不正: {e}")))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| NotificationError::SendFailed(format!("宛先アドレス不正: {e}")))?)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    #[tracing::instrument(skip_all, level = "debug", fields(to = %email.to))]
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_email(to: &str) -> EmailMessage {
        EmailMessage {
            to:        to.to_string(),
            subject:   "Verify your email address".to_string(),
            html_body: "<p>verify</p>".to_string(),
            text_body: "verify".to_string(),
        }
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SmtpNotificationSender>();
    }

    #[test]
    fn 宛先アドレスが不正ならsend_failed() {
        let sender =
            SmtpNotificationSender::new("localhost", 1025, "noreply@example.com".to_string());

        let result = sender.build_message(&make_email("not-an-address"));
        assert!(matches!(result, Err(NotificationError::SendFailed(_))));
    }

    #[test]
    fn 正しいアドレスならメッセージを構築できる() {
        let sender =
            SmtpNotificationSender::new("localhost", 1025, "noreply@example.com".to_string());

        let message = sender.build_message(&make_email("john@x.com")).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("To: john@x.com"));
        assert!(formatted.contains("Subject: Verify your email address"));
    }
}
