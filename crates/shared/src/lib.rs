//! # RegMail 共有ユーティリティ
//!
//! サービスとインフラ層で共通利用するユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - トレーシング関連の依存は `observability` feature でのみ有効化

pub mod event_log;
pub mod health;
pub mod observability;

pub use health::HealthResponse;
