//! # RegMail Mailer ライブラリ
//!
//! 登録イベントを受けて確認メールを送信するサービスのコアモジュール。
//!
//! ## モジュール構成
//!
//! - `app_builder`: DI とルーター構築
//! - `config`: 環境変数からの設定読み込み
//! - `error`: HTTP レスポンスへのエラー変換
//! - `handler`: HTTP ハンドラ
//! - `intake`: SNS エンベロープの解釈
//! - `subscription`: SNS サブスクリプション確認
//! - `usecase`: 重複チェック・送信・記録の統合

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod intake;
pub mod subscription;
pub mod usecase;
