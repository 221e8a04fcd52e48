//! # アプリケーション構築
//!
//! DI（クライアント・State）の初期化とルーター構築を担当する。
//! `main.rs` は設定読み込みとサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use chrono::Duration;
use regmail_domain::clock::SystemClock;
use regmail_infra::{
    InfraError,
    NotificationSender,
    dynamodb,
    notification::{NoopNotificationSender, SesNotificationSender, SmtpNotificationSender},
    repository::DynamoDbVerificationRecordRepository,
};
use regmail_shared::observability::make_request_span;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    config::{MailerConfig, NotificationBackend, NotificationConfig},
    handler::{AppState, health_check, receive_event},
    subscription::HttpSubscriptionConfirmer,
    usecase::{TemplateRenderer, VerificationMailer, VerificationSettings},
};

/// 設定から共有状態を構築する
///
/// `ensure_table` が有効な場合は送信記録テーブルを作成する（既存なら何もしない）。
pub async fn build_state(config: &MailerConfig) -> anyhow::Result<AppState> {
    let dynamodb_client =
        dynamodb::create_client(&config.aws_region, config.store.endpoint.as_deref()).await;

    if config.store.ensure_table {
        dynamodb::ensure_verification_table(&dynamodb_client, &config.store.table_name)
            .await
            .map_err(log_infra_error)?;
        tracing::info!(table = %config.store.table_name, "送信記録テーブルを確認しました");
    }

    let record_repo = Arc::new(DynamoDbVerificationRecordRepository::new(
        dynamodb_client,
        config.store.table_name.clone(),
    ));
    let sender = build_sender(&config.aws_region, &config.notification).await;
    let template_renderer = TemplateRenderer::new()?;

    let mailer = VerificationMailer::new(
        sender,
        record_repo,
        template_renderer,
        Arc::new(SystemClock),
        VerificationSettings {
            domain:            config.verification.domain.clone(),
            retention:         Duration::hours(config.verification.retention_hours),
            link_expiry_hours: config.verification.link_expiry_hours,
        },
    );

    Ok(AppState {
        mailer,
        confirmer: Arc::new(HttpSubscriptionConfirmer::new()),
    })
}

/// 設定に応じたメール送信実装を選択する
async fn build_sender(
    aws_region: &str,
    config: &NotificationConfig,
) -> Arc<dyn NotificationSender> {
    match config.backend {
        NotificationBackend::Ses => {
            tracing::info!("通知バックエンド: SES");
            Arc::new(
                SesNotificationSender::connect(
                    aws_region,
                    config.ses_endpoint.as_deref(),
                    config.from_address.clone(),
                )
                .await,
            )
        }
        NotificationBackend::Smtp => {
            tracing::info!(
                host = %config.smtp_host,
                port = config.smtp_port,
                "通知バックエンド: SMTP"
            );
            Arc::new(SmtpNotificationSender::new(
                &config.smtp_host,
                config.smtp_port,
                config.from_address.clone(),
            ))
        }
        NotificationBackend::Noop => {
            tracing::info!("通知バックエンド: Noop（メール送信なし）");
            Arc::new(NoopNotificationSender)
        }
    }
}

fn log_infra_error(e: InfraError) -> InfraError {
    tracing::error!(span_trace = %e.span_trace(), "送信記録テーブルの準備に失敗: {}", e);
    e
}

/// ルーターを構築する
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/events", post(receive_event))
        .with_state(state)
        // Request ID レイヤー（下に書いたものが外側）
        // 1. SetRequestIdLayer（最外）: リクエスト受信時に UUID を生成（またはクライアント提供値を使用）
        // 2. TraceLayer: スパンに request_id を含め、全ログに自動注入
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
