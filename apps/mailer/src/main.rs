//! # Mailer サーバー
//!
//! ユーザー登録イベントを SNS の HTTP(S) サブスクリプションで受け取り、
//! 確認メールを送信する。
//!
//! ## 処理の流れ
//!
//! ```text
//! SNS ──POST /events──▶ 重複チェック ──▶ トークン発行 ──▶ メール送信 ──▶ 送信記録
//!                           │                                             │
//!                           └──────────── DynamoDB（TTL 付き）◀───────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `MAILER_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `MAILER_PORT` | No | ポート番号（デフォルト: `3100`） |
//! | `AWS_REGION` | No | リージョン（デフォルト: `ap-northeast-1`） |
//! | `DYNAMODB_ENDPOINT` | No | DynamoDB Local 等のエンドポイント |
//! | `VERIFICATION_TABLE_NAME` | **Yes** | 送信記録テーブル名 |
//! | `DYNAMODB_ENSURE_TABLE` | No | 起動時にテーブルを作成する（デフォルト: `false`） |
//! | `NOTIFICATION_BACKEND` | No | `smtp` / `ses` / `noop`（デフォルト: `noop`） |
//! | `SMTP_HOST` / `SMTP_PORT` | No | SMTP 接続先（デフォルト: `localhost:1025`） |
//! | `SES_ENDPOINT` | No | SES のエンドポイント |
//! | `NOTIFICATION_FROM_ADDRESS` | **Yes** | 送信元アドレス |
//! | `VERIFICATION_DOMAIN` | **Yes** | 確認リンクのドメイン |
//! | `VERIFICATION_RETENTION_HOURS` | No | 送信記録の保持期間（`1`〜`8760`、デフォルト: `24`） |
//! | `VERIFICATION_LINK_EXPIRY_HOURS` | No | 本文に記載するリンク有効期限（`1`〜`8760`、デフォルト: `24`） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（DynamoDB Local + Mailpit）
//! DYNAMODB_ENDPOINT=http://localhost:8000 DYNAMODB_ENSURE_TABLE=true \
//!   NOTIFICATION_BACKEND=smtp cargo run -p regmail-mailer
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use regmail_mailer::{
    app_builder::{build_router, build_state},
    config::MailerConfig,
};
use regmail_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Mailer サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("mailer"));
    let _tracing_guard = tracing::info_span!("app", service = "mailer").entered();

    // 設定読み込み
    let config = MailerConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Mailer サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let state = Arc::new(build_state(&config).await?);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Mailer サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Mailer サーバーを停止しました");
    Ok(())
}

/// Ctrl-C または SIGTERM を待つ
///
/// シグナルハンドラの登録に失敗した場合、そのシグナルは待たない。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl-C ハンドラの登録に失敗: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM ハンドラの登録に失敗: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("SIGINT (Ctrl-C) を受信、シャットダウンを開始します");
        }
        () = terminate => {
            tracing::info!("SIGTERM を受信、シャットダウンを開始します");
        }
    }
}
