//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! regmail-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use regmail_domain::{
    notification::{EmailMessage, NotificationError},
    verification::VerificationRecord,
};

use crate::{error::InfraError, notification::NotificationSender, repository::VerificationRecordRepository};

// ===== MockNotificationSender =====

/// 送信したメールを記録するモック
///
/// `failing()` で作成すると常に `SendFailed` を返す（記録もしない）。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    fail: Arc<AtomicBool>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sender = Self::default();
        sender.fail.store(true, Ordering::SeqCst);
        sender
    }

    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed(
                "mock: 送信失敗".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ===== MockVerificationRecordRepository =====

/// インメモリの送信記録ストア
///
/// `fail_find` / `fail_insert` で読み書きそれぞれの障害を再現できる。
/// `add_undecodable_item` は他の書き込み元が異なる形式で書いた項目を再現する。
#[derive(Clone, Default)]
pub struct MockVerificationRecordRepository {
    records:            Arc<Mutex<Vec<VerificationRecord>>>,
    undecodable_emails: Arc<Mutex<Vec<String>>>,
    fail_find:          Arc<AtomicBool>,
    fail_insert:        Arc<AtomicBool>,
    query_calls:        Arc<AtomicUsize>,
}

impl MockVerificationRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&self, record: VerificationRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// 送信記録として復元できない項目を追加する
    pub fn add_undecodable_item(&self, email: &str) {
        self.undecodable_emails
            .lock()
            .unwrap()
            .push(email.to_string());
    }

    pub fn records(&self) -> Vec<VerificationRecord> {
        self.records.lock().unwrap().clone()
    }

    /// 読み取り（`has_record` / `find_by_email`）を失敗させる
    pub fn fail_find(&self) {
        self.fail_find.store(true, Ordering::SeqCst);
    }

    pub fn fail_insert(&self) {
        self.fail_insert.store(true, Ordering::SeqCst);
    }

    /// 読み取りが呼ばれた回数
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    fn has_undecodable(&self, email: &str) -> bool {
        self.undecodable_emails
            .lock()
            .unwrap()
            .iter()
            .any(|e| e == email)
    }

    fn begin_query(&self) -> Result<(), InfraError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_find.load(Ordering::SeqCst) {
            return Err(InfraError::dynamo_db("mock: 検索失敗"));
        }
        Ok(())
    }
}

#[async_trait]
impl VerificationRecordRepository for MockVerificationRecordRepository {
    async fn has_record(&self, email: &str) -> Result<bool, InfraError> {
        self.begin_query()?;
        let stored = self.records.lock().unwrap().iter().any(|r| r.email == email);
        Ok(stored || self.has_undecodable(email))
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<VerificationRecord>, InfraError> {
        self.begin_query()?;
        if self.has_undecodable(email) {
            return Err(InfraError::invalid_record("mock: sentAt 属性がありません"));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.email == email)
            .cloned()
            .collect())
    }

    async fn insert(&self, record: &VerificationRecord) -> Result<(), InfraError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(InfraError::dynamo_db("mock: 書き込み失敗"));
        }
        // DynamoDB の PutItem と同じく、同一キーは上書き
        self.undecodable_emails
            .lock()
            .unwrap()
            .retain(|e| e != &record.email);
        let mut records = self.records.lock().unwrap();
        records.retain(|r| r.email != record.email);
        records.push(record.clone());
        Ok(())
    }
}
