//! # AWS SDK 設定
//!
//! DynamoDB / SES クライアントが共有する SDK 設定を読み込む。
//!
//! - **エンドポイント指定あり**: DynamoDB Local 等のローカル環境。ダミー認証情報を使用する
//! - **エンドポイント指定なし**: 本番環境。IAM ロール等のデフォルト認証チェーンを使用する

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_dynamodb::config::Credentials;

/// SDK 設定を読み込む
///
/// # 引数
///
/// * `region` - AWS リージョン（例: `ap-northeast-1`）
/// * `endpoint` - エンドポイント URL（例: `http://localhost:18000`）。`None` で AWS 標準
pub async fn load_sdk_config(region: &str, endpoint: Option<&str>) -> SdkConfig {
    let loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

    let loader = match endpoint {
        Some(endpoint) => loader
            .endpoint_url(endpoint)
            // ローカルエミュレータはクレデンシャルを検証しないが、SDK はプロバイダが必要
            .credentials_provider(Credentials::new("local", "local", None, None, "local")),
        None => loader,
    };

    loader.load().await
}
