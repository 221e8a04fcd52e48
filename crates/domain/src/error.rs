//! # ドメイン層エラー定義
//!
//! 受信イベントの不正など、ドメインルール違反を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `MalformedEvent` | 400 Bad Request | イベント本文を解釈できない |
//! | `Validation` | 400 Bad Request | 必須項目の欠落・空値 |

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// 構造化テキストとして解釈できないイベント
    #[error("イベントの形式が不正です: {0}")]
    MalformedEvent(String),

    /// バリデーションエラー
    ///
    /// 構造は正しいが、値がルールに違反している場合に使用する。
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_eventのメッセージ() {
        let err = DomainError::MalformedEvent("EOF while parsing".to_string());
        assert_eq!(
            err.to_string(),
            "イベントの形式が不正です: EOF while parsing"
        );
    }

    #[test]
    fn test_validationのメッセージ() {
        let err = DomainError::Validation("email は必須です".to_string());
        assert_eq!(err.to_string(), "バリデーションエラー: email は必須です");
    }
}
