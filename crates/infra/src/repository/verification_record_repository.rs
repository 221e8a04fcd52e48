//! # VerificationRecordRepository
//!
//! 確認メール送信記録の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **DynamoDB**: `email` をパーティションキーとする単純なキー検索と書き込みのみ
//! - **トランザクションなし**: 条件付き書き込みは使わない。同一イベントの同時処理で
//!   重複送信が 1 通発生しうることは許容する
//! - **削除しない**: 記録の削除は TTL（`expiresAt`）に任せる
//! - **重複チェックは件数のみ**: [`VerificationRecordRepository::has_record`] は項目を
//!   復元しない。他の書き込み元が異なる形式で書いた項目も「送信済み」として数える
//!
//! ## 項目形式
//!
//! | 属性 | 型 | 内容 |
//! |------|----|------|
//! | `email` | S | 送信先（PK） |
//! | `token` | S | 確認トークン |
//! | `sentAt` | S | 送信日時（RFC 3339） |
//! | `expiresAt` | N | TTL（エポック秒） |

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    Client,
    types::{AttributeValue, Select},
};
use chrono::{DateTime, Utc};
use regmail_domain::verification::{VerificationRecord, VerificationToken};

use crate::{
    InfraError,
    dynamodb::{EMAIL_ATTRIBUTE, EXPIRES_AT_ATTRIBUTE},
};

const TOKEN_ATTRIBUTE: &str = "token";
const SENT_AT_ATTRIBUTE: &str = "sentAt";

/// 送信記録リポジトリトレイト
#[async_trait]
pub trait VerificationRecordRepository: Send + Sync {
    /// メールアドレスに紐づく項目が 1 件以上あるか
    ///
    /// 項目の形式は問わない。
    async fn has_record(&self, email: &str) -> Result<bool, InfraError>;

    /// メールアドレスに紐づく送信記録を取得する（0 件以上）
    async fn find_by_email(&self, email: &str) -> Result<Vec<VerificationRecord>, InfraError>;

    /// 送信記録を書き込む
    async fn insert(&self, record: &VerificationRecord) -> Result<(), InfraError>;
}

/// DynamoDB 実装の VerificationRecordRepository
pub struct DynamoDbVerificationRecordRepository {
    client:     Client,
    table_name: String,
}

impl DynamoDbVerificationRecordRepository {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl VerificationRecordRepository for DynamoDbVerificationRecordRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%email))]
    async fn has_record(&self, email: &str) -> Result<bool, InfraError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("#email = :email")
            .expression_attribute_names("#email", EMAIL_ATTRIBUTE)
            .expression_attribute_values(":email", AttributeValue::S(email.to_string()))
            .select(Select::Count)
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| InfraError::dynamo_db(format!("送信記録の件数取得に失敗: {e}")))?;

        Ok(output.count() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%email))]
    async fn find_by_email(&self, email: &str) -> Result<Vec<VerificationRecord>, InfraError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("#email = :email")
            .expression_attribute_names("#email", EMAIL_ATTRIBUTE)
            .expression_attribute_values(":email", AttributeValue::S(email.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| InfraError::dynamo_db(format!("送信記録の検索に失敗: {e}")))?;

        output.items().iter().map(item_to_record).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(email = %record.email))]
    async fn insert(&self, record: &VerificationRecord) -> Result<(), InfraError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .map_err(|e| InfraError::dynamo_db(format!("送信記録の書き込みに失敗: {e}")))?;

        Ok(())
    }
}

/// 送信記録を DynamoDB の項目に変換する
fn record_to_item(record: &VerificationRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (
            EMAIL_ATTRIBUTE.to_string(),
            AttributeValue::S(record.email.clone()),
        ),
        (
            TOKEN_ATTRIBUTE.to_string(),
            AttributeValue::S(record.token.as_str().to_string()),
        ),
        (
            SENT_AT_ATTRIBUTE.to_string(),
            AttributeValue::S(record.sent_at.to_rfc3339()),
        ),
        (
            EXPIRES_AT_ATTRIBUTE.to_string(),
            AttributeValue::N(record.expires_at.to_string()),
        ),
    ])
}

/// DynamoDB の項目を送信記録に変換する
fn item_to_record(item: &HashMap<String, AttributeValue>) -> Result<VerificationRecord, InfraError> {
    let email = string_attribute(item, EMAIL_ATTRIBUTE)?.to_string();
    let token = VerificationToken::from_stored(string_attribute(item, TOKEN_ATTRIBUTE)?);
    let sent_at = DateTime::parse_from_rfc3339(string_attribute(item, SENT_AT_ATTRIBUTE)?)
        .map_err(|e| InfraError::invalid_record(format!("sentAt の形式が不正: {e}")))?
        .with_timezone(&Utc);
    let expires_at = item
        .get(EXPIRES_AT_ATTRIBUTE)
        .and_then(|v| v.as_n().ok())
        .ok_or_else(|| InfraError::invalid_record("expiresAt 属性がありません"))?
        .parse::<i64>()
        .map_err(|e| InfraError::invalid_record(format!("expiresAt の形式が不正: {e}")))?;

    Ok(VerificationRecord {
        email,
        token,
        sent_at,
        expires_at,
    })
}

fn string_attribute<'a>(
    item: &'a HashMap<String, AttributeValue>,
    name: &str,
) -> Result<&'a str, InfraError> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| InfraError::invalid_record(format!("{name} 属性がありません")))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::InfraErrorKind;

    fn make_record() -> VerificationRecord {
        VerificationRecord::new(
            "john@x.com",
            VerificationToken::from_stored("token-123"),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            Duration::hours(24),
        )
    }

    #[test]
    fn test_項目変換で全属性が設定される() {
        let item = record_to_item(&make_record());

        assert_eq!(item.len(), 4);
        assert_eq!(item["email"], AttributeValue::S("john@x.com".to_string()));
        assert_eq!(item["token"], AttributeValue::S("token-123".to_string()));
        assert_eq!(
            item["sentAt"],
            AttributeValue::S("2023-11-14T22:13:20+00:00".to_string())
        );
        assert_eq!(item["expiresAt"], AttributeValue::N("1700086400".to_string()));
    }

    #[test]
    fn test_書き込んだ項目から同じ記録を復元できる() {
        let record = make_record();
        let restored = item_to_record(&record_to_item(&record)).unwrap();

        assert_eq!(restored, record);
    }

    #[test]
    fn test_token属性がない項目はinvalid_record() {
        let mut item = record_to_item(&make_record());
        item.remove("token");

        let err = item_to_record(&item).unwrap_err();
        assert!(matches!(err.kind(), InfraErrorKind::InvalidRecord(_)));
    }

    #[test]
    fn test_expires_atが数値でない項目はinvalid_record() {
        let mut item = record_to_item(&make_record());
        item.insert(
            "expiresAt".to_string(),
            AttributeValue::N("tomorrow".to_string()),
        );

        let err = item_to_record(&item).unwrap_err();
        assert!(matches!(err.kind(), InfraErrorKind::InvalidRecord(_)));
    }
}
