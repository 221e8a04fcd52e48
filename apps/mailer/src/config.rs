//! # Mailer 設定
//!
//! 環境変数から確認メール送信サービスの設定を読み込む。
//! 必須項目の欠落や不正値は [`ConfigError`] として返す。

use std::{env, ops::RangeInclusive, str::FromStr};

use regmail_domain::verification::DEFAULT_RETENTION_HOURS;
use thiserror::Error;

/// 保持期間・リンク有効期限（時間）の許容範囲（1 時間 〜 1 年）
pub const HOURS_RANGE: RangeInclusive<i64> = 1..=8760;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// 確認メール送信サービスの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailerConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// AWS リージョン（DynamoDB / SES 共通）
    pub aws_region: String,
    /// 送信記録ストアの設定
    pub store: StoreConfig,
    /// 通知設定
    pub notification: NotificationConfig,
    /// 確認リンク・送信記録の設定
    pub verification: VerificationConfig,
}

/// 送信記録ストア（DynamoDB）の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// DynamoDB エンドポイント（DynamoDB Local 使用時に設定）
    pub endpoint:     Option<String>,
    /// テーブル名
    pub table_name:   String,
    /// 起動時にテーブルを作成するか（ローカル開発用）
    pub ensure_table: bool,
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationBackend {
    /// Mailpit（開発）/ SMTP サーバー経由で送信
    Smtp,
    /// Amazon SES v2 経由で送信（本番）
    Ses,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// 通知機能の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub backend:      NotificationBackend,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub smtp_host:    String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub smtp_port:    u16,
    /// SES エンドポイント（エミュレータ使用時に設定）
    pub ses_endpoint: Option<String>,
    /// 送信元メールアドレス
    pub from_address: String,
}

/// 確認リンク・送信記録の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationConfig {
    /// 確認リンクのドメイン（例: `app.example.com`）
    pub domain:            String,
    /// 送信記録の保持期間（時間）。TTL として使用する
    pub retention_hours:   i64,
    /// メール本文に記載するリンク有効期限（時間）
    pub link_expiry_hours: i64,
}

impl MailerConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };

        Ok(Self {
            host: vars.or("MAILER_HOST", "0.0.0.0"),
            port: vars.parse_or("MAILER_PORT", 3100)?,
            aws_region: vars.or("AWS_REGION", "ap-northeast-1"),
            store: StoreConfig {
                endpoint:     vars.optional("DYNAMODB_ENDPOINT"),
                table_name:   vars.required("VERIFICATION_TABLE_NAME")?,
                ensure_table: vars.parse_or("DYNAMODB_ENSURE_TABLE", false)?,
            },
            notification: NotificationConfig {
                backend:      vars.parse_or("NOTIFICATION_BACKEND", NotificationBackend::Noop)?,
                smtp_host:    vars.or("SMTP_HOST", "localhost"),
                smtp_port:    vars.parse_or("SMTP_PORT", 1025)?,
                ses_endpoint: vars.optional("SES_ENDPOINT"),
                from_address: vars.required("NOTIFICATION_FROM_ADDRESS")?,
            },
            verification: VerificationConfig {
                domain:            vars.required("VERIFICATION_DOMAIN")?,
                retention_hours:   vars.hours_or(
                    "VERIFICATION_RETENTION_HOURS",
                    DEFAULT_RETENTION_HOURS,
                )?,
                link_expiry_hours: vars.hours_or("VERIFICATION_LINK_EXPIRY_HOURS", 24)?,
            },
        })
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// 空文字列は未設定として扱う
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parse_or<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.optional(name) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value }),
            None => Ok(default),
        }
    }

    /// 時間数を読み込み、[`HOURS_RANGE`] 外の値は不正とする
    fn hours_or(&self, name: &'static str, default: i64) -> Result<i64, ConfigError> {
        let hours = self.parse_or(name, default)?;
        if HOURS_RANGE.contains(&hours) {
            Ok(hours)
        } else {
            Err(ConfigError::Invalid {
                name,
                value: hours.to_string(),
            })
        }
    }
}
