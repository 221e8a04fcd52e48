//! # RegMail ドメイン層
//!
//! 登録確認メール送信の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: 確認トークン・確認リンクは生成時に形式が確定する不変オブジェクト
//! - **エンティティ**: 送信記録（[`verification::VerificationRecord`]）はメールアドレスで一意
//! - **外部依存なし**: DynamoDB や SES の詳細はインフラ層に閉じ込める
//!
//! ## 依存関係の方向
//!
//! ```text
//! mailer → infra → domain
//!    ↘               ↑
//!      ──────────────
//! ```
//!
//! ## モジュール構成
//!
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層エラー
//! - [`notification`] - メールメッセージと送信エラー
//! - [`registration`] - ユーザー登録イベント
//! - [`verification`] - 確認トークン・確認リンク・送信記録
//!
//! ## 使用例
//!
//! ```rust
//! use regmail_domain::verification::{VerificationLink, VerificationToken};
//!
//! let (token, _) = VerificationToken::issue(Some("T".to_string()));
//! let link = VerificationLink::build("example.com", "a@b.com", &token);
//! assert_eq!(
//!     link.as_str(),
//!     "https://example.com/v1/user/verify?email=a%40b.com&token=T"
//! );
//! ```

pub mod clock;
pub mod error;
pub mod notification;
pub mod registration;
pub mod verification;

pub use error::DomainError;
