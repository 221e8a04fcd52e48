//! # SNS サブスクリプション確認
//!
//! SNS トピックに HTTP(S) エンドポイントを登録すると、最初に
//! `SubscriptionConfirmation` が届く。本文の `SubscribeURL` に GET すると購読が有効になる。
//!
//! 任意の URL へのリクエストを防ぐため、`https` かつ `*.amazonaws.com` のホストのみ許可する。

use async_trait::async_trait;
use thiserror::Error;

const ALLOWED_HOST_SUFFIX: &str = ".amazonaws.com";

/// サブスクリプション確認エラー
#[derive(Debug, Clone, Error)]
pub enum SubscriptionError {
    /// 許可されていない確認 URL
    #[error("不正な確認 URL: {0}")]
    InvalidUrl(String),

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// 確認 URL が成功以外のステータスを返した
    #[error("予期しないステータス: {0}")]
    UnexpectedStatus(u16),
}

impl From<reqwest::Error> for SubscriptionError {
    fn from(err: reqwest::Error) -> Self {
        SubscriptionError::Network(err.to_string())
    }
}

/// サブスクリプション確認トレイト
#[async_trait]
pub trait SubscriptionConfirmer: Send + Sync {
    /// `SubscribeURL` を 1 回だけ呼び出して購読を確認する
    async fn confirm(&self, subscribe_url: &str) -> Result<(), SubscriptionError>;
}

/// reqwest による実装
#[derive(Clone)]
pub struct HttpSubscriptionConfirmer {
    client: reqwest::Client,
}

impl HttpSubscriptionConfirmer {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpSubscriptionConfirmer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionConfirmer for HttpSubscriptionConfirmer {
    #[tracing::instrument(skip_all)]
    async fn confirm(&self, subscribe_url: &str) -> Result<(), SubscriptionError> {
        let url = validate_subscribe_url(subscribe_url)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SubscriptionError::UnexpectedStatus(status.as_u16()));
        }

        Ok(())
    }
}

/// 確認 URL が SNS のエンドポイントであることを検証する
fn validate_subscribe_url(raw: &str) -> Result<reqwest::Url, SubscriptionError> {
    let url =
        reqwest::Url::parse(raw).map_err(|_| SubscriptionError::InvalidUrl(raw.to_string()))?;

    let host_allowed = url
        .host_str()
        .is_some_and(|host| host.ends_with(ALLOWED_HOST_SUFFIX));

    if url.scheme() != "https" || !host_allowed {
        return Err(SubscriptionError::InvalidUrl(raw.to_string()));
    }

    Ok(url)
}
