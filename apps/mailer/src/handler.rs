//! # HTTP リクエストハンドラ
//!
//! ハンドラは薄く保ち、ビジネスロジックは usecase 層に委譲する。
//!
//! ## ハンドラ一覧
//!
//! - `events`: SNS からのイベント受信
//! - `health`: ヘルスチェック

pub mod events;
pub mod health;

pub use events::{AppState, InvocationResponse, receive_event};
pub use health::health_check;
