//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで確認メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **HTML は自動エスケープ**: 氏名は上流の入力のためエスケープする。確認リンクは
//!   パーセントエンコード済みのため `safe` で出力する
//! - **有効期限の明記**: 本文にリンクの有効期限（時間）を記載する

use regmail_domain::{
    notification::{EmailMessage, NotificationError},
    verification::VerificationLink,
};
use tera::{Context, Tera};

/// 確認メールの件名
pub const VERIFICATION_SUBJECT: &str = "Verify your email address";

const TEMPLATE_NAME: &str = "verify_email";

/// 確認メールの差し込み値
#[derive(Debug)]
pub struct VerificationEmailParams<'a> {
    pub to:           &'a str,
    pub first_name:   &'a str,
    pub link:         &'a VerificationLink,
    /// リンクの有効期限（時間）
    pub expiry_hours: i64,
}

/// テンプレートレンダラー
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    pub fn new() -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    "verify_email.html",
                    include_str!("../../templates/verification/verify_email.html"),
                ),
                (
                    "verify_email.txt",
                    include_str!("../../templates/verification/verify_email.txt"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self { engine })
    }

    /// 確認メールを生成する
    pub fn render(
        &self,
        params: &VerificationEmailParams<'_>,
    ) -> Result<EmailMessage, NotificationError> {
        let mut context = Context::new();
        context.insert("first_name", params.first_name);
        context.insert("verification_link", params.link.as_str());
        context.insert("expiry_hours", &params.expiry_hours);

        let html_body = self
            .engine
            .render(&format!("{TEMPLATE_NAME}.html"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        let text_body = self
            .engine
            .render(&format!("{TEMPLATE_NAME}.txt"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(EmailMessage {
            to: params.to.to_string(),
            subject: VERIFICATION_SUBJECT.to_string(),
            html_body,
            text_body,
        })
    }
}
