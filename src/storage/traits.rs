//! ストレージの共通インターフェース定義
//!
//! # 責務
//!
//! - 回答ストレージの共通トレイト [`Storage`] を定義
//! - 保存される値の型 [`AnswerValue`] と全体スナップショット [`Snapshot`] を提供
//!
//! セッションは 1 つのストレージに対して単一のライターとして逐次アクセスします。
//! そのため、トレイトは内部ロックを要求しません。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// ストレージ全体のスナップショット（ID → 値）
pub type Snapshot = BTreeMap<String, AnswerValue>;

/// ストレージに保存される値
///
/// JSON 上は文字列または文字列の配列としてそのまま表現されます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// 単一の回答
    Scalar(String),

    /// 回答の配列（ListAsk が使用）
    List(Vec<String>),
}

impl AnswerValue {
    /// 単一の回答であれば文字列として取り出す
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            AnswerValue::Scalar(value) => Some(value),
            AnswerValue::List(_) => None,
        }
    }

    /// 配列であればスライスとして取り出す
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AnswerValue::Scalar(_) => None,
            AnswerValue::List(items) => Some(items),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Scalar(value.to_string())
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(items: Vec<String>) -> Self {
        AnswerValue::List(items)
    }
}

/// 回答ストレージの共通インターフェース
///
/// # 実装要件
///
/// - 変更系メソッドは I/O 失敗を [`StorageError`] として返す
/// - `append_array` は `start_array` 済みの ID に対してのみ呼ばれる。
///   未初期化の ID への追加は呼び出し側の契約違反であり、即座にエラーにしてよい
/// - `set_readonly(true)` の間は回答の書き込み（`record` / `start_array` /
///   `append_array`）を無視する。訪問履歴の操作は読み取り専用中も有効
pub trait Storage {
    /// 単一の回答を記録（既存の値は上書き）
    fn record(&mut self, id: &str, value: &str) -> Result<(), StorageError>;

    /// 空の配列を初期化
    fn start_array(&mut self, id: &str) -> Result<(), StorageError>;

    /// 配列の末尾に回答を追加
    fn append_array(&mut self, id: &str, value: &str) -> Result<(), StorageError>;

    /// ID に対応する値を取得
    fn lookup(&self, id: &str) -> Option<AnswerValue>;

    /// 全回答のスナップショットを取得
    fn snapshot(&self) -> Snapshot;

    /// 訪問履歴のみを消去（回答は保持）
    fn clear_history(&mut self) -> Result<(), StorageError>;

    /// 訪問した ID を履歴の末尾に追加
    fn record_visit(&mut self, id: &str) -> Result<(), StorageError>;

    /// 最後に訪問した ID
    fn last_visited(&self) -> Option<String>;

    /// 読み取り専用モードの切り替え（既定では何もしない）
    fn set_readonly(&mut self, _readonly: bool) {}

    /// 背後のリソースを解放（会話終了時に一度だけ呼ばれる）
    fn release(&mut self) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_value_accessors() {
        let scalar = AnswerValue::from("Ann");
        let list = AnswerValue::from(vec!["red".to_string(), "blue".to_string()]);

        assert_eq!(scalar.as_scalar(), Some("Ann"));
        assert!(scalar.as_list().is_none());
        assert!(list.as_scalar().is_none());
        assert_eq!(list.as_list().map(<[String]>::len), Some(2));
    }

    #[test]
    fn test_answer_value_json_shape() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("name".to_string(), AnswerValue::from("Ann"));
        snapshot.insert("colors".to_string(), AnswerValue::from(vec!["red".to_string()]));

        let json = serde_json::to_string(&snapshot).expect("JSON変換に失敗");
        assert_eq!(json, r#"{"colors":["red"],"name":"Ann"}"#);

        let restored: Snapshot = serde_json::from_str(&json).expect("JSON読み込みに失敗");
        assert_eq!(restored, snapshot);
    }
}
