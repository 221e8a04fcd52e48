//! SES 通知送信実装
//!
//! AWS SES v2 API を使用してメールを送信する。本番環境で使用する。
//!
//! 送信元アドレスが SES で未検証、スロットリング、ネットワーク障害などは
//! すべて [`NotificationError::SendFailed`] として返す。

use async_trait::async_trait;
use aws_sdk_sesv2::{
    Client,
    types::{Body, Content, Destination, EmailContent, Message},
};
use regmail_domain::notification::{EmailMessage, NotificationError};

use super::NotificationSender;
use crate::aws;

/// SES 通知送信
pub struct SesNotificationSender {
    client:       Client,
    from_address: String,
}

impl SesNotificationSender {
    /// 新しい SES 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `client`: AWS SES v2 クライアント
    /// - `from_address`: 送信元メールアドレス（SES で検証済みであること）
    pub fn new(client: Client, from_address: String) -> Self {
        Self {
            client,
            from_address,
        }
    }

    /// リージョンとエンドポイントからクライアントを構築して作成する
    pub async fn connect(region: &str, endpoint: Option<&str>, from_address: String) -> Self {
        let config = aws::load_sdk_config(region, endpoint).await;
        Self::new(Client::new(&config), from_address)
    }
}

fn content(data: &str, part: &str) -> Result<Content, NotificationError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| NotificationError::SendFailed(format!("{part}構築失敗: {e}")))
}

#[async_trait]
impl NotificationSender for SesNotificationSender {
    #[tracing::instrument(skip_all, level = "debug", fields(to = %email.to))]
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let destination = Destination::builder().to_addresses(&email.to).build();

        let message = Message::builder()
            .subject(content(&email.subject, "件名")?)
            .body(
                Body::builder()
                    .html(content(&email.html_body, "HTML 本文")?)
                    .text(content(&email.text_body, "テキスト本文")?)
                    .build(),
            )
            .build();

        self.client
            .send_email()
            .from_email_address(&self.from_address)
            .destination(destination)
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SES 送信失敗: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SesNotificationSender>();
    }

    #[test]
    fn contentは本文をそのまま保持する() {
        let built = content("Verify your email address", "件名").unwrap();
        assert_eq!(built.data(), "Verify your email address");
        assert_eq!(built.charset(), Some("UTF-8"));
    }
}
