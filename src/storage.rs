//! 回答ストレージ抽象化レイヤー
//!
//! # 責務
//!
//! - 会話の回答（ID → 値 / 値の配列）を永続化する共通インターフェースを提供
//! - 訪問済みノード ID の履歴を保持し、再開時に最後の訪問 ID を返す
//! - リファレンス実装としてインメモリ版と JSON ファイル版を提供
//!
//! # モジュール構成
//!
//! - `traits` - 共通インターフェース（[`Storage`]トレイト等）
//! - `memory` - インメモリ実装 [`MemoryStorage`]
//! - `json_file` - JSON ファイル実装 [`JsonFileStorage`]
//!
//! # 使用例
//!
//! ```rust
//! use scripted_dialog::storage::{AnswerValue, MemoryStorage, Storage};
//!
//! let mut storage = MemoryStorage::new();
//! storage.record_visit("name").unwrap();
//! storage.record("name", "Ann").unwrap();
//!
//! assert_eq!(storage.lookup("name"), Some(AnswerValue::from("Ann")));
//! assert_eq!(storage.last_visited().as_deref(), Some("name"));
//! ```

pub mod traits;
pub mod memory;
pub mod json_file;

// 公開APIの再エクスポート
pub use traits::{AnswerValue, Snapshot, Storage};
pub use memory::MemoryStorage;
pub use json_file::JsonFileStorage;
