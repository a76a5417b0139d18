//! インメモリのストレージ実装
//!
//! テストや、永続化が不要な一時的な会話で使用します。

use super::traits::{AnswerValue, Snapshot, Storage};
use crate::error::StorageError;

/// マップとベクタで回答と訪問履歴を保持するストレージ
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    data: Snapshot,
    history: Vec<String>,
    readonly: bool,
}

impl MemoryStorage {
    /// 空のストレージを生成
    pub fn new() -> Self {
        Self::default()
    }

    /// 訪問履歴（訪問順）
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl Storage for MemoryStorage {
    fn record(&mut self, id: &str, value: &str) -> Result<(), StorageError> {
        if !self.readonly {
            self.data.insert(id.to_string(), AnswerValue::from(value));
        }
        Ok(())
    }

    fn start_array(&mut self, id: &str) -> Result<(), StorageError> {
        if !self.readonly {
            self.data.insert(id.to_string(), AnswerValue::List(Vec::new()));
        }
        Ok(())
    }

    fn append_array(&mut self, id: &str, value: &str) -> Result<(), StorageError> {
        if self.readonly {
            return Ok(());
        }

        match self.data.get_mut(id) {
            Some(AnswerValue::List(items)) => {
                items.push(value.to_string());
                Ok(())
            }
            _ => Err(StorageError::NotAnArray { id: id.to_string() }),
        }
    }

    fn lookup(&self, id: &str) -> Option<AnswerValue> {
        self.data.get(id).cloned()
    }

    fn snapshot(&self) -> Snapshot {
        self.data.clone()
    }

    fn clear_history(&mut self) -> Result<(), StorageError> {
        self.history.clear();
        Ok(())
    }

    fn record_visit(&mut self, id: &str) -> Result<(), StorageError> {
        self.history.push(id.to_string());
        Ok(())
    }

    fn last_visited(&self) -> Option<String> {
        self.history.last().cloned()
    }

    fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    fn release(&mut self) -> Result<(), StorageError> {
        self.data.clear();
        self.history.clear();
        Ok(())
    }
}
