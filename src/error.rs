//! エラー型の定義
//!
//! シナリオの読み書き（[`ConfigError`]）と回答の保存（[`StorageError`]）のエラーです。
//! 会話の進行中に起きるエラーは [`crate::engine::SessionError`] にまとめられます。

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// シナリオファイル関連のエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// シナリオファイルの読み込みに失敗
    #[error("シナリオファイル '{}' の読み込みに失敗しました: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// シナリオファイルの書き込みに失敗
    #[error("シナリオファイル '{}' の書き込みに失敗しました: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// TOML のデシリアライズに失敗
    #[error("シナリオの TOML を解釈できません: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    /// TOML のシリアライズに失敗
    #[error("シナリオを TOML に変換できません: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// ツリーとして不正な定義
    #[error("シナリオの定義が不正です: {0}")]
    Validation(String),
}

/// ストレージ関連のエラー
#[derive(Debug, Error)]
pub enum StorageError {
    /// ファイルの入出力に失敗
    #[error("ストレージの入出力に失敗しました: {0}")]
    Io(#[from] io::Error),

    /// JSON の変換に失敗
    #[error("ストレージの JSON 変換に失敗しました: {0}")]
    Json(#[from] serde_json::Error),

    /// 配列として初期化されていない ID への追加
    #[error("ID '{id}' は配列として初期化されていません")]
    NotAnArray {
        /// 対象の ID
        id: String,
    },
}
