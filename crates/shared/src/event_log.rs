//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! ログフィールドの命名規約とヘルパーマクロを提供する。
//! JSON ログを `jq` でフィルタして調査できることを目的とする。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` / `tracing::warn!` に `error.category` + `error.kind` フィールドを追加する。
//! 定数は [`error`] モジュールで提供。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const VERIFICATION: &str = "verification";
        pub const SUBSCRIPTION: &str = "subscription";
    }

    /// イベントアクション
    pub mod action {
        pub const VERIFICATION_SENT: &str = "verification.sent";
        pub const VERIFICATION_SKIPPED_DUPLICATE: &str = "verification.skipped_duplicate";
        pub const VERIFICATION_FAILED: &str = "verification.failed";
        pub const SUBSCRIPTION_CONFIRMED: &str = "subscription.confirmed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const VERIFICATION_RECORD: &str = "verification_record";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const SKIPPED: &str = "skipped";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（送信記録ストア）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（メール送信、SNS）
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// 受信イベントの不正
        pub const INPUT: &str = "input";
    }

    /// エラー種別
    pub mod kind {
        pub const TRACKING_STORE_READ: &str = "tracking_store_read";
        pub const TRACKING_STORE_WRITE: &str = "tracking_store_write";
        pub const MAIL_DELIVERY: &str = "mail_delivery";
        pub const TEMPLATE: &str = "template";
        pub const MALFORMED_EVENT: &str = "malformed_event";
        pub const SUBSCRIPTION_CONFIRMATION: &str = "subscription_confirmation";
    }
}
