//! # リポジトリ実装
//!
//! 送信記録ストアのトレイトと DynamoDB 実装を提供する。
//!
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod verification_record_repository;

pub use verification_record_repository::{
    DynamoDbVerificationRecordRepository,
    VerificationRecordRepository,
};
