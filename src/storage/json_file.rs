//! JSON ファイルを使用するストレージ実装
//!
//! # 責務
//!
//! - 回答と訪問履歴を 1 つの JSON ファイルに保存
//! - プロセスが中断しても、同じパスで開き直せば会話を再開できる
//! - 会話終了時（[`Storage::release`]）にファイルを削除
//!
//! # ファイル形式
//!
//! ```text
//! {
//!   "data": { "name": "Ann", "colors": ["red", "blue"] },
//!   "history": ["main", "name", "colors", "colors.1"]
//! }
//! ```
//!
//! 変更のたびにファイル全体を書き直します。書き込みは同じディレクトリの
//! 一時ファイル（`<ファイル名>.tmp`）を経由し、置き換えで反映します。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{AnswerValue, Snapshot, Storage};
use crate::error::StorageError;

/// ファイルに保存されるドキュメント
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    data: Snapshot,
    history: Vec<String>,
}

/// JSON ファイルに回答と訪問履歴を保存するストレージ
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    cache: Document,
    readonly: bool,
}

impl JsonFileStorage {
    /// ファイルを開く
    ///
    /// ファイルが存在すれば内容を読み込み、存在しなければ空のドキュメントを作成して書き込みます。
    ///
    /// # エラー
    ///
    /// - [`StorageError::Io`] - ファイルの読み書きに失敗
    /// - [`StorageError::Json`] - 既存ファイルの内容が不正
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let cache: Document = serde_json::from_str(&content)?;
            debug!(
                path = %path.display(),
                answers = cache.data.len(),
                visits = cache.history.len(),
                "existing state loaded"
            );

            return Ok(Self {
                path,
                cache,
                readonly: false,
            });
        }

        let storage = Self {
            path,
            cache: Document::default(),
            readonly: false,
        };
        storage.write()?;

        Ok(storage)
    }

    /// 保存先のパス
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 一時ファイルに書き込んでから置き換える
    ///
    /// 書き込み途中で中断しても、保存先には直前の完全な内容が残ります。
    fn write(&self) -> Result<(), StorageError> {
        let content = serde_json::to_string(&self.cache)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for JsonFileStorage {
    fn record(&mut self, id: &str, value: &str) -> Result<(), StorageError> {
        if self.readonly {
            return Ok(());
        }

        self.cache.data.insert(id.to_string(), AnswerValue::from(value));
        self.write()
    }

    fn start_array(&mut self, id: &str) -> Result<(), StorageError> {
        if self.readonly {
            return Ok(());
        }

        self.cache.data.insert(id.to_string(), AnswerValue::List(Vec::new()));
        self.write()
    }

    fn append_array(&mut self, id: &str, value: &str) -> Result<(), StorageError> {
        if self.readonly {
            return Ok(());
        }

        match self.cache.data.get_mut(id) {
            Some(AnswerValue::List(items)) => items.push(value.to_string()),
            _ => return Err(StorageError::NotAnArray { id: id.to_string() }),
        }
        self.write()
    }

    fn lookup(&self, id: &str) -> Option<AnswerValue> {
        self.cache.data.get(id).cloned()
    }

    fn snapshot(&self) -> Snapshot {
        self.cache.data.clone()
    }

    fn clear_history(&mut self) -> Result<(), StorageError> {
        self.cache.history.clear();
        self.write()
    }

    fn record_visit(&mut self, id: &str) -> Result<(), StorageError> {
        self.cache.history.push(id.to_string());
        self.write()
    }

    fn last_visited(&self) -> Option<String> {
        self.cache.history.last().cloned()
    }

    fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    fn release(&mut self) -> Result<(), StorageError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        debug!(path = %self.path.display(), "state file removed");
        Ok(())
    }
}
