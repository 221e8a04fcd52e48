//! # DynamoDB 接続管理
//!
//! 送信記録テーブルへの接続とテーブル作成を行う。
//!
//! ## 設計方針
//!
//! - **ローカル開発**: DynamoDB Local を使用（`DYNAMODB_ENDPOINT` で接続先を指定）
//! - **本番環境**: テーブルは IaC で作成済みの前提。IAM ロールで接続
//! - **テーブル自動作成**: `DYNAMODB_ENSURE_TABLE=true` の場合のみ起動時に作成（冪等）
//!
//! ## テーブルスキーマ
//!
//! - PK: `email` (String)
//! - TTL: `expiresAt` (Number, エポック秒) で自動削除
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use regmail_infra::dynamodb;
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = dynamodb::create_client("ap-northeast-1", Some("http://localhost:18000")).await;
//!     dynamodb::ensure_verification_table(&client, "verification_records").await?;
//!     Ok(())
//! }
//! ```

use aws_sdk_dynamodb::{
    Client,
    types::{
        AttributeDefinition,
        BillingMode,
        KeySchemaElement,
        KeyType,
        ScalarAttributeType,
        TimeToLiveDescription,
        TimeToLiveSpecification,
        TimeToLiveStatus,
    },
};

use crate::{InfraError, aws};

/// パーティションキー属性名
pub const EMAIL_ATTRIBUTE: &str = "email";

/// TTL 属性名
pub const EXPIRES_AT_ATTRIBUTE: &str = "expiresAt";

/// DynamoDB クライアントを作成する
///
/// # 引数
///
/// * `region` - AWS リージョン
/// * `endpoint` - DynamoDB Local の URL。`None` で AWS の DynamoDB に接続する
pub async fn create_client(region: &str, endpoint: Option<&str>) -> Client {
    let config = aws::load_sdk_config(region, endpoint).await;
    Client::new(&config)
}

/// 送信記録テーブルが存在しなければ作成する（冪等）
///
/// テーブルの有無にかかわらず、TTL が `expiresAt` 属性で有効になっていることを保証する。
/// 前回の起動が TTL 設定前に失敗していても、次の起動で有効化される。
#[tracing::instrument(skip(client), level = "debug")]
pub async fn ensure_verification_table(client: &Client, table_name: &str) -> Result<(), InfraError> {
    if table_exists(client, table_name).await? {
        tracing::debug!("テーブル '{}' は既に存在します", table_name);
    } else {
        create_table(client, table_name).await?;
    }

    ensure_time_to_live(client, table_name).await
}

async fn table_exists(client: &Client, table_name: &str) -> Result<bool, InfraError> {
    match client.describe_table().table_name(table_name).send().await {
        Ok(_) => Ok(true),
        Err(err)
            if err
                .as_service_error()
                .is_some_and(|e| e.is_resource_not_found_exception()) =>
        {
            Ok(false)
        }
        Err(err) => Err(InfraError::dynamo_db(format!(
            "テーブル '{table_name}' の確認に失敗: {err}"
        ))),
    }
}

async fn create_table(client: &Client, table_name: &str) -> Result<(), InfraError> {
    tracing::info!("テーブル '{}' を作成します", table_name);

    let create_result = client
        .create_table()
        .table_name(table_name)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(EMAIL_ATTRIBUTE)
                .key_type(KeyType::Hash)
                .build()
                .map_err(|e| InfraError::dynamo_db(format!("KeySchema 構築エラー: {e}")))?,
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(EMAIL_ATTRIBUTE)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(|e| {
                    InfraError::dynamo_db(format!("AttributeDefinition 構築エラー: {e}"))
                })?,
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await;

    match create_result {
        Ok(_) => {
            tracing::info!("テーブル '{}' を作成しました", table_name);
            Ok(())
        }
        // 並行起動時に発生しうる（テーブルが作成中）
        Err(err)
            if err
                .as_service_error()
                .is_some_and(|e| e.is_resource_in_use_exception()) =>
        {
            tracing::debug!(
                "テーブル '{}' は既に作成中または存在します（ResourceInUseException）",
                table_name
            );
            Ok(())
        }
        Err(err) => Err(InfraError::dynamo_db(format!(
            "テーブル '{table_name}' の作成に失敗: {err}"
        ))),
    }
}

/// TTL が未設定なら `expiresAt` で有効化する
async fn ensure_time_to_live(client: &Client, table_name: &str) -> Result<(), InfraError> {
    let output = client
        .describe_time_to_live()
        .table_name(table_name)
        .send()
        .await
        .map_err(|e| {
            InfraError::dynamo_db(format!("テーブル '{table_name}' の TTL 取得に失敗: {e}"))
        })?;

    if !time_to_live_needs_enabling(output.time_to_live_description())? {
        return Ok(());
    }

    client
        .update_time_to_live()
        .table_name(table_name)
        .time_to_live_specification(
            TimeToLiveSpecification::builder()
                .enabled(true)
                .attribute_name(EXPIRES_AT_ATTRIBUTE)
                .build()
                .map_err(|e| InfraError::dynamo_db(format!("TTL 設定の構築に失敗: {e}")))?,
        )
        .send()
        .await
        .map_err(|e| {
            InfraError::dynamo_db(format!("テーブル '{table_name}' の TTL 設定に失敗: {e}"))
        })?;

    tracing::info!("テーブル '{}' の TTL を有効化しました", table_name);

    Ok(())
}

/// TTL の有効化が必要か判定する
///
/// 別の属性で TTL が有効になっている場合はエラー（`expiresAt` での削除が行われないため）。
fn time_to_live_needs_enabling(
    description: Option<&TimeToLiveDescription>,
) -> Result<bool, InfraError> {
    let Some(description) = description else {
        return Ok(true);
    };

    match description.time_to_live_status() {
        Some(TimeToLiveStatus::Enabled | TimeToLiveStatus::Enabling) => {
            match description.attribute_name() {
                Some(EXPIRES_AT_ATTRIBUTE) => Ok(false),
                other => Err(InfraError::dynamo_db(format!(
                    "TTL が別の属性で有効になっています: {other:?}"
                ))),
            }
        }
        _ => Ok(true),
    }
}
