//! # 確認メール送信ユースケース
//!
//! 登録イベント 1 件につき、確認メールを高々 1 通だけ送信する。
//!
//! ## 処理の流れ
//!
//! ```text
//! 重複チェック → (トークン発行 →) メール送信 → 送信記録の書き込み
//! ```
//!
//! ## 障害時の方針
//!
//! | 失敗箇所 | 扱い |
//! |---------|------|
//! | 重複チェック（ストア読み取り） | 重複なしとみなして続行（fail open） |
//! | メール送信 | エラーを返す。送信記録は書かない |
//! | 送信記録の書き込み | エラーを返す。メールは送信済みのまま残る |
//!
//! 書き込み失敗時は「送信済み・記録なし」の状態になり、再配信で再送されうる。
//! 補償処理は行わない。
//!
//! 同一イベントが同時に処理されると、両方が重複チェックを通過して 2 通送信されうる。
//! 排他制御は行わず、これを許容する。

use std::sync::Arc;

use chrono::Duration;
use regmail_domain::{
    clock::Clock,
    notification::NotificationError,
    registration::RegistrationEvent,
    verification::{VerificationLink, VerificationOutcome, VerificationRecord, VerificationToken},
};
use regmail_infra::{InfraError, NotificationSender, VerificationRecordRepository};
use regmail_shared::{
    event_log::{error, event},
    log_business_event,
};
use thiserror::Error;

use super::{TemplateRenderer, template_renderer::VerificationEmailParams};

/// 確認メール送信のエラー
#[derive(Debug, Error)]
pub enum VerificationError {
    /// メール本文の生成に失敗
    #[error("確認メールの生成に失敗: {0}")]
    Template(#[source] NotificationError),

    /// メール送信に失敗（送信記録は書かれていない）
    #[error("確認メールの送信に失敗: {0}")]
    Delivery(#[source] NotificationError),

    /// 送信記録の書き込みに失敗（メールは送信済み）
    #[error("送信記録の書き込みに失敗: {0}")]
    RecordWrite(#[source] InfraError),
}

/// 確認リンク・送信記録に関する設定値
#[derive(Debug, Clone)]
pub struct VerificationSettings {
    /// 確認リンクのドメイン
    pub domain:            String,
    /// 送信記録の保持期間
    pub retention:         Duration,
    /// メール本文に記載するリンク有効期限（時間）
    pub link_expiry_hours: i64,
}

/// 確認メール送信サービス
///
/// 起動時に 1 度だけ構築し、すべての呼び出しで共有する。
pub struct VerificationMailer {
    sender:            Arc<dyn NotificationSender>,
    record_repo:       Arc<dyn VerificationRecordRepository>,
    template_renderer: TemplateRenderer,
    clock:             Arc<dyn Clock>,
    settings:          VerificationSettings,
}

impl VerificationMailer {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        record_repo: Arc<dyn VerificationRecordRepository>,
        template_renderer: TemplateRenderer,
        clock: Arc<dyn Clock>,
        settings: VerificationSettings,
    ) -> Self {
        Self {
            sender,
            record_repo,
            template_renderer,
            clock,
            settings,
        }
    }

    /// 登録イベントを処理する
    ///
    /// 送信記録が既にあれば何もせず [`VerificationOutcome::AlreadySent`] を返す。
    #[tracing::instrument(skip_all, fields(email = %registration.email))]
    pub async fn handle(
        &self,
        registration: RegistrationEvent,
    ) -> Result<VerificationOutcome, VerificationError> {
        if self.is_duplicate(&registration.email).await {
            log_business_event!(
                event.category = event::category::VERIFICATION,
                event.action = event::action::VERIFICATION_SKIPPED_DUPLICATE,
                event.entity_type = event::entity_type::VERIFICATION_RECORD,
                event.result = event::result::SKIPPED,
                verification.recipient = %registration.email,
                "送信記録があるため確認メールをスキップ"
            );
            return Ok(VerificationOutcome::AlreadySent);
        }

        let (token, token_source) = VerificationToken::issue(registration.token);
        let link = VerificationLink::build(&self.settings.domain, &registration.email, &token);

        let email = self
            .template_renderer
            .render(&VerificationEmailParams {
                to:           &registration.email,
                first_name:   &registration.first_name,
                link:         &link,
                expiry_hours: self.settings.link_expiry_hours,
            })
            .map_err(|e| {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::TEMPLATE,
                    error = %e,
                    "確認メールのレンダリングに失敗"
                );
                VerificationError::Template(e)
            })?;

        if let Err(e) = self.sender.send_email(&email).await {
            log_business_event!(
                event.category = event::category::VERIFICATION,
                event.action = event::action::VERIFICATION_FAILED,
                event.entity_type = event::entity_type::VERIFICATION_RECORD,
                event.result = event::result::FAILURE,
                verification.recipient = %registration.email,
                error.category = error::category::EXTERNAL_SERVICE,
                error.kind = error::kind::MAIL_DELIVERY,
                error = %e,
                "確認メール送信失敗"
            );
            return Err(VerificationError::Delivery(e));
        }

        let record = VerificationRecord::new(
            registration.email.as_str(),
            token.clone(),
            self.clock.now(),
            self.settings.retention,
        );

        if let Err(e) = self.record_repo.insert(&record).await {
            tracing::error!(
                error.category = error::category::INFRASTRUCTURE,
                error.kind = error::kind::TRACKING_STORE_WRITE,
                error = %e,
                "送信記録の書き込みに失敗（メールは送信済み、再配信時に再送されうる）"
            );
            return Err(VerificationError::RecordWrite(e));
        }

        log_business_event!(
            event.category = event::category::VERIFICATION,
            event.action = event::action::VERIFICATION_SENT,
            event.entity_type = event::entity_type::VERIFICATION_RECORD,
            event.result = event::result::SUCCESS,
            verification.recipient = %registration.email,
            verification.token_source = %token_source,
            verification.expires_at = record.expires_at,
            "確認メール送信成功"
        );

        Ok(VerificationOutcome::Sent { token })
    }

    /// 送信記録が既に存在するか
    ///
    /// 項目は復元せず件数だけを見る。形式の異なる項目も送信済みとして扱う。
    /// ストアの読み取りに失敗した場合は `false`（fail open）。
    async fn is_duplicate(&self, email: &str) -> bool {
        match self.record_repo.has_record(email).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::TRACKING_STORE_READ,
                    error = %e,
                    "重複チェックに失敗したため送信を続行"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use regmail_domain::clock::FixedClock;
    use regmail_infra::mock::{MockNotificationSender, MockVerificationRecordRepository};
    use uuid::Uuid;

    use super::*;

    const RETENTION_HOURS: i64 = 24;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn make_mailer(
        sender: &MockNotificationSender,
        repo: &MockVerificationRecordRepository,
    ) -> VerificationMailer {
        VerificationMailer::new(
            Arc::new(sender.clone()),
            Arc::new(repo.clone()),
            TemplateRenderer::new().unwrap(),
            Arc::new(FixedClock::new(now())),
            VerificationSettings {
                domain:            "app.example.com".to_string(),
                retention:         Duration::hours(RETENTION_HOURS),
                link_expiry_hours: 24,
            },
        )
    }

    fn make_event(token: Option<&str>) -> RegistrationEvent {
        RegistrationEvent {
            email:      "john@x.com".to_string(),
            first_name: "John".to_string(),
            last_name:  "Doe".to_string(),
            token:      token.map(str::to_string),
        }
    }

    fn existing_record() -> VerificationRecord {
        VerificationRecord::new(
            "john@x.com",
            VerificationToken::from_stored("old-token"),
            now() - Duration::hours(1),
            Duration::hours(RETENTION_HOURS),
        )
    }

    #[tokio::test]
    async fn 初回イベントでメールを1通送信し記録を1件書く() {
        let sender = MockNotificationSender::new();
        let repo = MockVerificationRecordRepository::new();
        let mailer = make_mailer(&sender, &repo);

        let outcome = mailer.handle(make_event(None)).await.unwrap();

        let VerificationOutcome::Sent { token } = outcome else {
            panic!("Sent であること: {outcome:?}");
        };
        let uuid = Uuid::parse_str(token.as_str()).unwrap();
        assert_eq!(uuid.get_version_num(), 4);

        let sent = sender.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "john@x.com");
        let link = format!(
            "https://app.example.com/v1/user/verify?email=john%40x.com&token={token}"
        );
        assert!(sent[0].text_body.contains(&link));
        assert!(sent[0].html_body.contains(&link));

        let records = repo.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email, "john@x.com");
        assert_eq!(records[0].token, token);
        assert_eq!(records[0].sent_at, now());
        assert_eq!(
            records[0].expires_at,
            now().timestamp() + RETENTION_HOURS * 60 * 60
        );
    }

    #[tokio::test]
    async fn 送信記録があれば送信せずalready_sentを返す() {
        let sender = MockNotificationSender::new();
        let repo = MockVerificationRecordRepository::new();
        repo.add_record(existing_record());
        let mailer = make_mailer(&sender, &repo);

        let outcome = mailer.handle(make_event(None)).await.unwrap();

        assert_eq!(outcome, VerificationOutcome::AlreadySent);
        assert!(sender.sent_emails().is_empty());
        assert_eq!(repo.records(), vec![existing_record()]);
    }

    #[tokio::test]
    async fn 復元できない形式の記録でも送信済みとして扱う() {
        let sender = MockNotificationSender::new();
        let repo = MockVerificationRecordRepository::new();
        repo.add_undecodable_item("john@x.com");
        let mailer = make_mailer(&sender, &repo);

        let outcome = mailer.handle(make_event(None)).await.unwrap();

        assert_eq!(outcome, VerificationOutcome::AlreadySent);
        assert!(sender.sent_emails().is_empty());
        assert!(repo.records().is_empty());
    }

    #[tokio::test]
    async fn 同じイベントの再配信では2通目を送信しない() {
        let sender = MockNotificationSender::new();
        let repo = MockVerificationRecordRepository::new();
        let mailer = make_mailer(&sender, &repo);

        let first = mailer.handle(make_event(Some("upstream"))).await.unwrap();
        let second = mailer.handle(make_event(Some("upstream"))).await.unwrap();

        assert!(matches!(first, VerificationOutcome::Sent { .. }));
        assert_eq!(second, VerificationOutcome::AlreadySent);
        assert_eq!(sender.sent_emails().len(), 1);
    }

    #[tokio::test]
    async fn 上流のトークンをそのまま記録する() {
        let sender = MockNotificationSender::new();
        let repo = MockVerificationRecordRepository::new();
        let mailer = make_mailer(&sender, &repo);

        mailer
            .handle(make_event(Some("upstream-token")))
            .await
            .unwrap();

        let records = repo.records();
        assert_eq!(records[0].token.as_str(), "upstream-token");
        assert!(
            sender.sent_emails()[0]
                .text_body
                .contains("&token=upstream-token")
        );
    }

    #[tokio::test]
    async fn トークンなしのイベントは呼び出しごとに異なるトークンを生成する() {
        let sender = MockNotificationSender::new();
        let mailer_a = make_mailer(&sender, &MockVerificationRecordRepository::new());
        let mailer_b = make_mailer(&sender, &MockVerificationRecordRepository::new());

        let a = mailer_a.handle(make_event(None)).await.unwrap();
        let b = mailer_b.handle(make_event(None)).await.unwrap();

        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn 送信に失敗したら記録を書かない() {
        let sender = MockNotificationSender::failing();
        let repo = MockVerificationRecordRepository::new();
        let mailer = make_mailer(&sender, &repo);

        let result = mailer.handle(make_event(None)).await;

        assert!(matches!(result, Err(VerificationError::Delivery(_))));
        assert!(repo.records().is_empty());
    }

    #[tokio::test]
    async fn 重複チェックに失敗しても送信を続行する() {
        let sender = MockNotificationSender::new();
        let repo = MockVerificationRecordRepository::new();
        repo.fail_find();
        let mailer = make_mailer(&sender, &repo);

        let outcome = mailer.handle(make_event(None)).await.unwrap();

        assert!(matches!(outcome, VerificationOutcome::Sent { .. }));
        assert_eq!(repo.query_calls(), 1);
        assert_eq!(sender.sent_emails().len(), 1);
        assert_eq!(repo.records().len(), 1);
    }

    #[tokio::test]
    async fn 記録の書き込みに失敗したらエラーを返すがメールは送信済み() {
        let sender = MockNotificationSender::new();
        let repo = MockVerificationRecordRepository::new();
        repo.fail_insert();
        let mailer = make_mailer(&sender, &repo);

        let result = mailer.handle(make_event(None)).await;

        assert!(matches!(result, Err(VerificationError::RecordWrite(_))));
        assert_eq!(sender.sent_emails().len(), 1);
    }
}
