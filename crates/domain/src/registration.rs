//! # ユーザー登録イベント
//!
//! 上流（Web アプリケーション）が発行する登録イベントの受信モデル。
//!
//! ```json
//! { "email": "john@x.com", "firstName": "John", "lastName": "Doe", "token": "..." }
//! ```
//!
//! `token` は任意。上流が事前にトークンを生成している場合のみ含まれる。

use serde::Deserialize;

use crate::DomainError;

/// ユーザー登録イベント
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationEvent {
    /// 登録したメールアドレス（送信先かつ冪等キー）
    pub email:      String,
    pub first_name: String,
    pub last_name:  String,
    /// 上流が事前生成した確認トークン
    #[serde(default)]
    pub token:      Option<String>,
}

impl RegistrationEvent {
    /// JSON テキストからイベントを復元する
    ///
    /// # エラー
    ///
    /// - JSON として解釈できない、または必須項目が欠けている: `DomainError::MalformedEvent`
    /// - `email` が空: `DomainError::Validation`
    pub fn parse(body: &str) -> Result<Self, DomainError> {
        let mut event: Self = serde_json::from_str(body)
            .map_err(|e| DomainError::MalformedEvent(e.to_string()))?;

        event.email = event.email.trim().to_string();
        if event.email.is_empty() {
            return Err(DomainError::Validation("email は必須です".to_string()));
        }

        Ok(event)
    }
}
