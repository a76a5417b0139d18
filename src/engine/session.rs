//! 会話セッションの制御
//!
//! # 責務
//!
//! このモジュールは、1 つの会話を進行させる [`Session`] を提供します。
//! ツリーの走査を 1 つ所有し、ストレージの履歴から中断地点を復元したうえで、
//! 外部から届く回答を走査へ渡し、生成されたテキストを送信先へ転送します。
//!
//! # 主要な型
//!
//! - [`Session`][]: 会話制御の中核となる構造体
//! - [`SessionConfig`][]: 見出しと停止コマンドの設定
//! - [`Transport`][]: テキストの送信先
//!
//! # 実行フロー
//!
//! 1. 見出しを送信（設定されていれば、再開時も必ず）
//! 2. ストレージの最後の訪問 ID を取得し、訪問履歴を消去
//! 3. 記録済みの回答だけで走査を進め、最後の訪問 ID に到達したら止める（送信なし）
//! 4. 止まった地点の [`Transfer`] を再送対象として保持
//! 5. [`Session::advance`] のたびに回答を走査へ渡し、回答待ちになるまで送信を続ける
//! 6. [`Session::finalize`] で走査を閉じ、結果を取得してストレージを解放
//!
//! # 使用例
//!
//! ```rust
//! use scripted_dialog::engine::node::{Ask, Group, MessageNode, Text};
//! use scripted_dialog::engine::session::{Session, SessionConfig};
//! use scripted_dialog::storage::{AnswerValue, MemoryStorage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree: MessageNode = Group::new("main")
//!     .with_child(Ask::new("name", "What's your name?"))
//!     .with_child(Text::new("bye", "Goodbye"))
//!     .into();
//!
//! let mut sent = Vec::new();
//! let mut session = Session::start(
//!     &tree,
//!     MemoryStorage::new(),
//!     |text: &str| -> std::io::Result<()> {
//!         sent.push(text.to_string());
//!         Ok(())
//!     },
//!     SessionConfig::new(),
//! )?;
//!
//! session.advance(None)?;
//! session.advance(Some("Ann"))?;
//! assert!(session.is_finished());
//!
//! let snapshot = session.finalize()?;
//! assert_eq!(snapshot.get("name"), Some(&AnswerValue::from("Ann")));
//! assert_eq!(sent, ["What's your name?", "Goodbye"]);
//! # Ok(())
//! # }
//! ```

use std::io;
use std::mem;

use tracing::{debug, info, warn};

use super::node::MessageNode;
use super::result::{SessionError, SessionOutcome};
use super::transfer::{Transfer, matches_command};
use super::traversal::Traversal;
use crate::error::StorageError;
use crate::storage::{AnswerValue, Snapshot, Storage};

/// テキストの送信先
///
/// 送信は同期的に、生成順に呼ばれます。`FnMut(&str) -> io::Result<()>` を満たす
/// クロージャはそのまま送信先として使えます。
pub trait Transport {
    /// テキストを 1 つ送信
    fn send(&mut self, text: &str) -> io::Result<()>;
}

impl<F> Transport for F
where
    F: FnMut(&str) -> io::Result<()>,
{
    fn send(&mut self, text: &str) -> io::Result<()> {
        self(text)
    }
}

/// セッションの設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    headline: Option<String>,
    stop_command: Option<String>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 開始時に必ず送る見出しを設定
    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = Some(headline.into());
        self
    }

    /// 会話全体を打ち切る停止コマンドを設定（大文字小文字を区別しない）
    pub fn with_stop_command(mut self, command: impl Into<String>) -> Self {
        self.stop_command = Some(command.into());
        self
    }

    pub fn headline(&self) -> Option<&str> {
        self.headline.as_deref()
    }

    pub fn stop_command(&self) -> Option<&str> {
        self.stop_command.as_deref()
    }
}

/// 再送待ちの状態
#[derive(Debug, Default)]
enum Pending {
    #[default]
    Idle,
    /// 前回のプロセスで訪問は記録されたが、送信が確認できていない
    Resend(Transfer),
}

/// 1 つの会話を進行させるセッション
///
/// # フィールド
///
/// - `traversal`: ルートノードからの走査
/// - `storage`: 回答と訪問履歴の保存先
/// - `transport`: テキストの送信先
/// - `pending`: 再開直後に再送する [`Transfer`]
pub struct Session<'a, S, T> {
    traversal: Traversal<'a>,
    storage: S,
    transport: T,
    stop_command: Option<String>,
    pending: Pending,
    finished: bool,
    terminated: bool,
}

impl<'a, S, T> Session<'a, S, T>
where
    S: Storage,
    T: Transport,
{
    /// セッションを開始
    ///
    /// 見出しを送信し、ストレージに履歴があれば中断地点まで走査を復元します。
    /// 復元中は送信を行いません。
    ///
    /// # 戻り値
    ///
    /// - `Ok(Session)`: 開始成功（履歴がツリーと矛盾する場合も、終了済みとして返す）
    /// - `Err(SessionError)`: 見出しの送信またはストレージ操作に失敗
    pub fn start(
        root: &'a MessageNode,
        storage: S,
        transport: T,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let SessionConfig {
            headline,
            stop_command,
        } = config;

        let mut session = Self {
            traversal: Traversal::new(root),
            storage,
            transport,
            stop_command,
            pending: Pending::Idle,
            finished: false,
            terminated: false,
        };

        if let Some(headline) = headline.as_deref() {
            session.deliver(Some(headline))?;
        }
        session.resume()?;

        info!(
            root = root.id(),
            resend = matches!(session.pending, Pending::Resend(_)),
            finished = session.finished,
            "session started"
        );

        Ok(session)
    }

    /// 外部からの回答を 1 つ受け取り、次の回答待ちまで進める
    ///
    /// 最初の呼び出しは `None` で行い、最初のプロンプト（または再送）を送らせます。
    ///
    /// # 処理フロー
    ///
    /// 1. 停止コマンドと一致すれば、終了・打ち切り状態にして戻る（終了後でも同じ）
    /// 2. 終了済みなら何もしない
    /// 3. 再送待ちがあれば送信する。回答待ちなら戻る
    /// 4. 回答を走査へ渡し、回答待ちの [`Transfer`] が出るまで送信を続ける
    /// 5. 走査が終われば終了状態にする
    pub fn advance(&mut self, answer: Option<&str>) -> Result<(), SessionError> {
        let stopped = match (self.stop_command.as_deref(), answer) {
            (Some(command), Some(answer)) => matches_command(answer, command),
            _ => false,
        };
        if stopped {
            info!(finished = self.finished, "session terminated by stop command");
            self.finished = true;
            self.terminated = true;
            return Ok(());
        }

        if self.finished {
            return Ok(());
        }

        let mut input = answer;

        if let Pending::Resend(transfer) = mem::take(&mut self.pending) {
            debug!(id = %transfer.id, "resending pending transfer");
            self.deliver(transfer.text.as_deref())?;
            if !transfer.skip {
                return Ok(());
            }
            input = None;
        }

        loop {
            let Some(transfer) = self.traversal.next(&mut self.storage, input.take())? else {
                info!("session completed");
                self.finished = true;
                return Ok(());
            };

            self.deliver(transfer.text.as_deref())?;
            if !transfer.skip {
                debug!(id = %transfer.id, "awaiting answer");
                return Ok(());
            }
        }
    }

    /// 会話を終了し、回答のスナップショットを返す
    ///
    /// 走査を強制終了し、ストレージを解放します。自然終了後でも途中放棄でも呼べます。
    pub fn finalize(mut self) -> Result<Snapshot, SessionError> {
        self.traversal.close();

        let snapshot = self.storage.snapshot();
        self.storage.release()?;
        info!(answers = snapshot.len(), "session finalized");

        Ok(snapshot)
    }

    /// 会話が終了したか
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 停止コマンドで打ち切られたか
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// 現在の進行状況
    pub fn outcome(&self) -> SessionOutcome {
        match (self.finished, self.terminated) {
            (_, true) => SessionOutcome::Terminated,
            (true, false) => SessionOutcome::Completed,
            (false, false) => SessionOutcome::Running,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// ストレージの履歴から中断地点を復元（プライベートメソッド）
    fn resume(&mut self) -> Result<(), SessionError> {
        let last_id = self.storage.last_visited();
        self.storage.clear_history()?;

        let Some(last_id) = last_id else {
            return Ok(());
        };

        self.storage.set_readonly(true);
        let replayed = self.replay(&last_id);
        self.storage.set_readonly(false);

        replayed
    }

    /// 記録済みの回答だけで `last_id` まで走査を進める（プライベートメソッド）
    ///
    /// `last_id` と同じ ID の [`Transfer`] に到達したら止まり、それを再送対象にします。
    /// `last_id` が Group のように自身の [`Transfer`] を持たないノードの場合は、
    /// その訪問の後に出る最初の [`Transfer`] で止まります。
    /// 到達前に走査が終わった場合は、履歴が現在のツリーと矛盾しているため終了扱いにします。
    fn replay(&mut self, last_id: &str) -> Result<(), SessionError> {
        let mut storage = VisitWatch::new(&mut self.storage, last_id);
        let mut input: Option<String> = None;
        let mut replayed = 0usize;

        loop {
            let Some(transfer) = self.traversal.next(&mut storage, input.as_deref())? else {
                if storage.visited {
                    debug!(last_id, replayed, "nothing left after last visited node");
                } else {
                    warn!(last_id, replayed, "stored history does not match the tree, cannot resume");
                }
                self.finished = true;
                return Ok(());
            };

            if transfer.id == last_id || storage.visited {
                debug!(last_id, id = %transfer.id, replayed, "replay reached last visited node");
                self.pending = Pending::Resend(transfer);
                return Ok(());
            }

            replayed += 1;
            input = storage
                .lookup(&transfer.id)
                .and_then(|value| value.as_scalar().map(str::to_string));
        }
    }

    fn deliver(&mut self, text: Option<&str>) -> Result<(), SessionError> {
        if let Some(text) = text {
            self.transport.send(text).map_err(SessionError::Transport)?;
        }
        Ok(())
    }
}

/// 再生中に `target` の訪問を検出するストレージのラッパー
struct VisitWatch<'s, S> {
    inner: &'s mut S,
    target: &'s str,
    visited: bool,
}

impl<'s, S: Storage> VisitWatch<'s, S> {
    fn new(inner: &'s mut S, target: &'s str) -> Self {
        Self {
            inner,
            target,
            visited: false,
        }
    }
}

impl<S: Storage> Storage for VisitWatch<'_, S> {
    fn record(&mut self, id: &str, value: &str) -> Result<(), StorageError> {
        self.inner.record(id, value)
    }

    fn start_array(&mut self, id: &str) -> Result<(), StorageError> {
        self.inner.start_array(id)
    }

    fn append_array(&mut self, id: &str, value: &str) -> Result<(), StorageError> {
        self.inner.append_array(id, value)
    }

    fn lookup(&self, id: &str) -> Option<AnswerValue> {
        self.inner.lookup(id)
    }

    fn snapshot(&self) -> Snapshot {
        self.inner.snapshot()
    }

    fn clear_history(&mut self) -> Result<(), StorageError> {
        self.inner.clear_history()
    }

    fn record_visit(&mut self, id: &str) -> Result<(), StorageError> {
        if id == self.target {
            self.visited = true;
        }
        self.inner.record_visit(id)
    }

    fn last_visited(&self) -> Option<String> {
        self.inner.last_visited()
    }

    fn set_readonly(&mut self, readonly: bool) {
        self.inner.set_readonly(readonly);
    }

    fn release(&mut self) -> Result<(), StorageError> {
        self.inner.release()
    }
}
