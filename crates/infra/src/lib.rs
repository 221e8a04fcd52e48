//! # RegMail インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! ドメイン層の型を入出力とするトレイト（[`NotificationSender`],
//! [`VerificationRecordRepository`]）と、その具体実装を提供する。
//! ユースケース層はトレイトにのみ依存し、テストではモックに差し替える。
//!
//! ## 責務
//!
//! - **AWS 接続**: SDK 設定の読み込み（[`aws`]）
//! - **送信記録ストア**: DynamoDB テーブルの作成と読み書き（[`dynamodb`], [`repository`]）
//! - **メール送信**: SES / SMTP / Noop（[`notification`]）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use regmail_infra::{aws, dynamodb, repository::DynamoDbVerificationRecordRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let sdk_config = aws::load_sdk_config("ap-northeast-1", Some("http://localhost:18000")).await;
//!     let client = aws_sdk_dynamodb::Client::new(&sdk_config);
//!     dynamodb::ensure_verification_table(&client, "verification_records").await?;
//!     let repo = DynamoDbVerificationRecordRepository::new(client, "verification_records".to_string());
//!     Ok(())
//! }
//! ```

pub mod aws;
pub mod dynamodb;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
pub use notification::NotificationSender;
pub use repository::VerificationRecordRepository;
