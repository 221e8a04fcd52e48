//! # ヘルスチェックハンドラ
//!
//! レスポンス型は [`regmail_shared::HealthResponse`] を参照。

use axum::Json;
use regmail_shared::HealthResponse;

/// Mailer のヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}
