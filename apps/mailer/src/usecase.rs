//! # ユースケース層
//!
//! - [`verification`] - 重複チェック → トークン発行 → 送信 → 記録の統合
//! - [`template_renderer`] - tera テンプレートエンジンによる確認メール生成

pub mod template_renderer;
pub mod verification;

pub use template_renderer::TemplateRenderer;
pub use verification::{VerificationError, VerificationMailer, VerificationSettings};
