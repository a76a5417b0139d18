//! シナリオ設定
//!
//! - [`scenario`][]: シナリオ定義（ドメインモデル）
//! - `dto`: TOML 読み書き用の DTO（内部専用）

mod dto;
pub mod scenario;

pub use scenario::Scenario;
