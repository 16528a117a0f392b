//! # Lexitrack API サーバー
//!
//! 語彙学習サービスの REST API。ユーザー・学習統計・進捗・セッション・
//! 単語セット割り当てを扱う。
//!
//! ## レイヤー構成
//!
//! ```text
//! handler ──▶ usecase ──▶ lexitrack_infra（リポジトリ）──▶ PostgreSQL
//!                │
//!                └──▶ lexitrack_domain（検証・状態遷移）
//! ```
//!
//! ## モジュール構成
//!
//! - [`app_builder`] - State の初期化とルーター構築
//! - [`config`] - アプリケーション設定（環境変数からの読み込み）
//! - [`error`] - API エラー定義と HTTP レスポンスへの変換
//! - [`extract`] - リクエスト抽出の失敗をエラーコードに揃える extractor
//! - [`handler`] - HTTP リクエストハンドラ
//! - [`middleware`] - リクエストログ・リクエストスパン
//! - [`usecase`] - 検証・リポジトリ呼び出し・操作ログ
//!
//! ## ログ
//!
//! 出力はすべて `lexitrack_shared::observability::Logger` 経由の JSON Lines。
//! メールアドレス・電話番号・認証情報などのフィールドは出力前にマスクされる。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod middleware;
pub mod usecase;

#[cfg(test)]
mod test_utils;
