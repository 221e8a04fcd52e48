//! DynamoDB 接続・テーブル作成・送信記録リポジトリの統合テスト
//!
//! DynamoDB Local を使用したテスト。
//!
//! 実行方法:
//! ```bash
//! docker run -p 18000:8000 amazon/dynamodb-local -jar DynamoDBLocal.jar -sharedDb -inMemory
//! cargo test -p regmail-infra --test dynamodb_test
//! ```

use std::collections::HashMap;

use aws_sdk_dynamodb::{
    Client,
    types::{
        AttributeDefinition,
        AttributeValue,
        BillingMode,
        KeySchemaElement,
        KeyType,
        ScalarAttributeType,
        TimeToLiveStatus,
    },
};
use chrono::{DateTime, Duration};
use pretty_assertions::assert_eq;
use regmail_domain::verification::{VerificationRecord, VerificationToken};
use regmail_infra::{
    dynamodb,
    repository::{DynamoDbVerificationRecordRepository, VerificationRecordRepository},
};

/// テスト用の DynamoDB エンドポイント
///
/// 優先順位:
/// 1. `DYNAMODB_ENDPOINT`（CI で明示的に設定）
/// 2. `DYNAMODB_PORT` から構築
/// 3. フォールバック: `http://localhost:18000`
fn dynamodb_endpoint() -> String {
    std::env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| {
        let port = std::env::var("DYNAMODB_PORT").unwrap_or_else(|_| "18000".to_string());
        format!("http://localhost:{port}")
    })
}

async fn create_client() -> Client {
    dynamodb::create_client("ap-northeast-1", Some(&dynamodb_endpoint())).await
}

/// TTL が `expiresAt` 属性で有効（または有効化中）であることを検証する
async fn assert_ttl_enabled(client: &Client, table_name: &str) {
    let output = client
        .describe_time_to_live()
        .table_name(table_name)
        .send()
        .await
        .expect("TTL 情報の取得に失敗");
    let description = output
        .time_to_live_description()
        .expect("TTL 情報がありません");

    assert!(
        matches!(
            description.time_to_live_status(),
            Some(TimeToLiveStatus::Enabled | TimeToLiveStatus::Enabling)
        ),
        "TTL が有効であること: {:?}",
        description.time_to_live_status()
    );
    assert_eq!(description.attribute_name(), Some("expiresAt"));
}

/// ランダムなテーブル名で分離（他テストとの競合を防止）
fn unique_table_name() -> String {
    format!("test_verification_records_{}", uuid::Uuid::now_v7())
}

#[tokio::test]
async fn test_ensure_verification_tableが初回呼び出しでテーブルを作成する() {
    let client = create_client().await;
    let table_name = unique_table_name();

    let result = dynamodb::ensure_verification_table(&client, &table_name).await;
    assert!(result.is_ok(), "テーブル作成に失敗: {:?}", result.err());

    let table = client
        .describe_table()
        .table_name(&table_name)
        .send()
        .await
        .expect("テーブルが存在しません")
        .table
        .expect("テーブル情報がありません");

    // PK: email (HASH)
    assert!(
        table.key_schema().iter().any(|ks| ks.attribute_name() == "email"
            && ks.key_type == KeyType::Hash),
        "email HASH キーが見つかりません"
    );

    assert_ttl_enabled(&client, &table_name).await;

    let _ = client.delete_table().table_name(&table_name).send().await;
}

#[tokio::test]
async fn test_ensure_verification_tableが既存テーブルに対して冪等に動作する() {
    let client = create_client().await;
    let table_name = unique_table_name();

    let first = dynamodb::ensure_verification_table(&client, &table_name).await;
    assert!(first.is_ok(), "1回目のテーブル作成に失敗: {:?}", first.err());

    let second = dynamodb::ensure_verification_table(&client, &table_name).await;
    assert!(second.is_ok(), "2回目の呼び出しでエラー: {:?}", second.err());

    assert_ttl_enabled(&client, &table_name).await;

    let _ = client.delete_table().table_name(&table_name).send().await;
}

#[tokio::test]
async fn test_書き込んだ送信記録をemailで検索できる() {
    let client = create_client().await;
    let table_name = unique_table_name();
    dynamodb::ensure_verification_table(&client, &table_name)
        .await
        .unwrap();
    let repo = DynamoDbVerificationRecordRepository::new(client.clone(), table_name.clone());

    assert!(repo.find_by_email("john@x.com").await.unwrap().is_empty());

    let record = VerificationRecord::new(
        "john@x.com",
        VerificationToken::from_stored("token-123"),
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        Duration::hours(24),
    );
    repo.insert(&record).await.unwrap();

    let found = repo.find_by_email("john@x.com").await.unwrap();
    assert_eq!(found, vec![record]);

    // 他のメールアドレスには影響しない
    assert!(repo.find_by_email("jane@x.com").await.unwrap().is_empty());

    let _ = client.delete_table().table_name(&table_name).send().await;
}

#[tokio::test]
async fn test_存在しないテーブルの検索はエラーになる() {
    let client = create_client().await;
    let repo = DynamoDbVerificationRecordRepository::new(client, unique_table_name());

    let result = repo.find_by_email("john@x.com").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_ttl未設定の既存テーブルにttlを設定する() {
    let client = create_client().await;
    let table_name = unique_table_name();

    // TTL 設定前に中断した状態を再現する
    client
        .create_table()
        .table_name(&table_name)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("email")
                .key_type(KeyType::Hash)
                .build()
                .unwrap(),
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("email")
                .attribute_type(ScalarAttributeType::S)
                .build()
                .unwrap(),
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .unwrap();

    dynamodb::ensure_verification_table(&client, &table_name)
        .await
        .unwrap();

    assert_ttl_enabled(&client, &table_name).await;

    let _ = client.delete_table().table_name(&table_name).send().await;
}

#[tokio::test]
async fn test_復元できない項目があってもhas_recordはtrueを返す() {
    let client = create_client().await;
    let table_name = unique_table_name();
    dynamodb::ensure_verification_table(&client, &table_name)
        .await
        .unwrap();
    let repo = DynamoDbVerificationRecordRepository::new(client.clone(), table_name.clone());

    assert!(!repo.has_record("john@x.com").await.unwrap());

    // 他の書き込み元による sentAt のない項目
    client
        .put_item()
        .table_name(&table_name)
        .set_item(Some(HashMap::from([
            ("email".to_string(), AttributeValue::S("john@x.com".to_string())),
            ("token".to_string(), AttributeValue::S("token-123".to_string())),
            ("expiresAt".to_string(), AttributeValue::N("1700086400".to_string())),
        ])))
        .send()
        .await
        .unwrap();

    assert!(repo.has_record("john@x.com").await.unwrap());
    assert!(repo.find_by_email("john@x.com").await.is_err());
    assert!(!repo.has_record("jane@x.com").await.unwrap());

    let _ = client.delete_table().table_name(&table_name).send().await;
}
