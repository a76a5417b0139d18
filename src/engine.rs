//! 会話ツリー実行エンジン
//!
//! # 責務
//!
//! - メッセージノードのツリーを辿り、プロンプトと回答を 1 つずつやり取りする
//! - 分岐（Switch）、回数付き／無制限のループ（ListAsk）、部分的な打ち切り（TerminateGroup）
//! - 保存済みの回答と訪問履歴だけを使って、中断した会話を同じ地点から再開する
//!
//! # モジュール構成
//!
//! - [`transfer`][]: 走査 1 回分の送信単位
//! - [`node`][]: メッセージノード（ツリー）
//! - [`traversal`][]: 中断可能な走査カーソル
//! - [`session`][]: 会話セッションの制御（再開・進行・終了）
//! - [`result`][]: 進行状況とエラー型
//!
//! # 使用例
//!
//! ```rust,no_run
//! use scripted_dialog::config::scenario::Scenario;
//! use scripted_dialog::engine::Session;
//! use scripted_dialog::storage::JsonFileStorage;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. シナリオを読み込む
//!     let scenario = Scenario::from_file("scenarios/example.toml")?;
//!
//!     // 2. 状態ファイルを開く（存在すれば前回の続きから再開）
//!     let storage = JsonFileStorage::open("example.state.json")?;
//!
//!     // 3. セッションを開始
//!     let mut session = Session::start(
//!         scenario.root(),
//!         storage,
//!         |text: &str| -> std::io::Result<()> {
//!             println!("{text}");
//!             Ok(())
//!         },
//!         scenario.session_config(),
//!     )?;
//!
//!     // 4. 回答を渡して進める
//!     session.advance(None)?;
//!     session.advance(Some("Ann"))?;
//!
//!     // 5. 終了したら結果を取得
//!     if session.is_finished() {
//!         let snapshot = session.finalize()?;
//!         println!("{}", serde_json::to_string_pretty(&snapshot)?);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod transfer;
pub mod node;
pub mod traversal;
pub mod session;
pub mod result;

// 公開APIの再エクスポート
pub use transfer::Transfer;
pub use node::{Ask, Group, ListAsk, MessageNode, Switch, TerminateGroup, Text};
pub use traversal::Traversal;
pub use session::{Session, SessionConfig, Transport};
pub use result::{SessionError, SessionOutcome};
