//! # 確認メール送信記録
//!
//! 確認トークンの発行、確認リンクの構築、送信記録（冪等マーカー）を定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 |
//! |---|------------|
//! | [`VerificationToken`] | 確認トークン（推測不能な不透明文字列） |
//! | [`VerificationLink`] | 確認リンク（メール本文に埋め込む URL） |
//! | [`VerificationRecord`] | 送信記録（`email` ごとに高々 1 件） |
//! | [`VerificationOutcome`] | 1 回の処理結果 |
//!
//! ## ライフサイクル
//!
//! 送信記録はメール送信成功後に作成され、更新されない。
//! 削除はストアの TTL（`expires_at`）による自動削除のみ。

use chrono::{DateTime, Duration, Utc};
use strum::IntoStaticStr;
use uuid::Uuid;

/// 送信記録の保持期間（時間）のデフォルト値
pub const DEFAULT_RETENTION_HOURS: i64 = 24;

/// 確認リンクのパス
const VERIFY_PATH: &str = "/v1/user/verify";

/// トークンの出所
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TokenSource {
    /// 上流イベントが事前生成したトークンをそのまま使用
    Supplied,
    /// このサービスで新規生成
    Generated,
}

/// 確認トークン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// トークンを発行する
    ///
    /// 上流が付与したトークンがあればそのまま使う。再配信された同一イベントは
    /// 同じトークンを運ぶため、リトライ間で冪等になる。
    /// 無い場合（空白のみを含む）は UUID v4（122 ビットの乱数）を生成する。
    pub fn issue(supplied: Option<String>) -> (Self, TokenSource) {
        match supplied {
            Some(token) if !token.trim().is_empty() => (Self(token), TokenSource::Supplied),
            _ => (
                Self(Uuid::new_v4().to_string()),
                TokenSource::Generated,
            ),
        }
    }

    /// ストアから読み出した値を復元する
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VerificationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 確認リンク
///
/// `https://{domain}/v1/user/verify?email={email}&token={token}` 形式。
/// クエリ値はパーセントエンコードする（`a@b.com` → `a%40b.com`）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationLink(String);

impl VerificationLink {
    pub fn build(domain: &str, email: &str, token: &VerificationToken) -> Self {
        let domain = domain.trim_end_matches('/');
        Self(format!(
            "https://{domain}{VERIFY_PATH}?email={}&token={}",
            urlencoding::encode(email),
            urlencoding::encode(token.as_str()),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 送信記録
///
/// 冪等マーカー兼監査証跡。`email` がパーティションキー。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRecord {
    pub email:      String,
    pub token:      VerificationToken,
    /// 送信日時
    pub sent_at:    DateTime<Utc>,
    /// TTL 属性（エポック秒）。ストアはこの時刻を過ぎた記録を自動削除する
    pub expires_at: i64,
}

impl VerificationRecord {
    /// 送信直後の記録を作成する
    ///
    /// `expires_at` は `sent_at + retention`。リンクの有効期限とは独立。
    pub fn new(
        email: impl Into<String>,
        token: VerificationToken,
        sent_at: DateTime<Utc>,
        retention: Duration,
    ) -> Self {
        Self {
            email: email.into(),
            token,
            sent_at,
            expires_at: (sent_at + retention).timestamp(),
        }
    }
}

/// 1 回のイベント処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// 確認メールを送信し、記録を書き込んだ
    Sent { token: VerificationToken },
    /// 既に送信記録があるため何もしなかった
    AlreadySent,
}

impl VerificationOutcome {
    /// レスポンスの `status` 値
    pub fn status(&self) -> &'static str {
        match self {
            Self::Sent { .. } => "sent",
            Self::AlreadySent => "already_sent",
        }
    }

    /// レスポンスの `message` 値
    pub fn message(&self) -> &'static str {
        match self {
            Self::Sent { .. } => "Verification email sent",
            Self::AlreadySent => "Verification email already sent",
        }
    }
}
