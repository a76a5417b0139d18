//! セッション実行結果の型定義
//!
//! # 責務
//!
//! - 会話の進行状況 [`SessionOutcome`] の型定義
//! - セッション実行時のエラー [`SessionError`] の型定義

use serde::Serialize;
use thiserror::Error;

use crate::error::StorageError;

/// 会話の進行状況
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    /// 回答待ち（まだ終了していない）
    Running,

    /// ツリーを最後まで辿った
    Completed,

    /// 停止コマンドで打ち切られた
    Terminated,
}

/// セッション実行エラー
///
/// # エラー種別
///
/// - [`SessionError::Storage`] - ストレージの読み書きに失敗
/// - [`SessionError::Transport`] - テキストの送信に失敗
#[derive(Debug, Error)]
pub enum SessionError {
    /// ストレージエラー
    #[error("ストレージエラー: {0}")]
    Storage(#[from] StorageError),

    /// 送信エラー
    #[error("送信エラー: {0}")]
    Transport(#[source] std::io::Error),
}
