//! メッセージツリーの中断可能な走査
//!
//! # 責務
//!
//! - ノードを辿りながら [`Transfer`] を 1 つずつ生成する
//! - 回答を受け取ると、保留中の最も内側の地点から走査を再開する
//! - ノードごとの訪問を、そのノードの最初の [`Transfer`] より前にストレージの履歴へ記録する
//!
//! # 状態の持ち方
//!
//! 走査の位置はすべて [`Traversal`] の状態として保持されます。
//! 複合ノード（Group / Switch / TerminateGroup）は子ノードの `Traversal` を
//! `Box` で所有し、`next` の呼び出しを子へ委譲します。ノード自体は変更されません。
//!
//! # 使用例
//!
//! ```rust
//! use scripted_dialog::engine::node::{Ask, Group, MessageNode, Text};
//! use scripted_dialog::engine::traversal::Traversal;
//! use scripted_dialog::storage::MemoryStorage;
//!
//! let tree: MessageNode = Group::new("main")
//!     .with_child(Ask::new("name", "What's your name?"))
//!     .with_child(Text::new("bye", "Goodbye"))
//!     .into();
//!
//! let mut storage = MemoryStorage::new();
//! let mut traversal = Traversal::new(&tree);
//!
//! let ask = traversal.next(&mut storage, None).unwrap().unwrap();
//! assert_eq!(ask.id, "name");
//!
//! let bye = traversal.next(&mut storage, Some("Ann")).unwrap().unwrap();
//! assert_eq!(bye.text.as_deref(), Some("Goodbye"));
//!
//! assert!(traversal.next(&mut storage, None).unwrap().is_none());
//! ```

use std::mem;

use tracing::debug;

use super::node::{Ask, Group, ListAsk, MessageNode, Switch, TerminateGroup};
use super::transfer::{Transfer, matches_command};
use crate::error::StorageError;
use crate::storage::Storage;

/// 1 つのノード（とその子孫）に対する走査カーソル
#[derive(Debug)]
pub struct Traversal<'a> {
    node: &'a MessageNode,
    state: State<'a>,
}

/// 走査の位置
#[derive(Debug)]
enum State<'a> {
    /// まだ訪問していない
    Start,

    /// Ask: 回答待ち
    Asked(&'a Ask),

    /// ListAsk: 見出しを送った直後
    ListHeader(&'a ListAsk),
    /// ListAsk: `number` 回目の回答を求める前
    ListNext { node: &'a ListAsk, number: usize },
    /// ListAsk: `number` 回目の回答待ち
    ListAsked { node: &'a ListAsk, number: usize },

    /// Switch: 回答待ち
    Choosing(&'a Switch),
    /// Switch: 回答に対応する子へ委譲中
    Branch(Box<Traversal<'a>>),
    /// Switch: fallback へ委譲中
    Fallback {
        node: &'a Switch,
        child: Box<Traversal<'a>>,
        repeat: bool,
    },

    /// Group: `index` 番目の子を開始する前
    GroupNext { node: &'a Group, index: usize },
    /// Group: `index` 番目の子へ委譲中
    Member {
        node: &'a Group,
        index: usize,
        child: Box<Traversal<'a>>,
    },

    /// TerminateGroup: 子へ委譲中
    Wrapped {
        node: &'a TerminateGroup,
        child: Box<Traversal<'a>>,
    },
    /// TerminateGroup: 打ち切りシグナルを送る前
    Signal(&'a TerminateGroup),

    Done,
}

impl<'a> Traversal<'a> {
    /// ノードの先頭から走査を開始するカーソルを生成
    pub fn new(node: &'a MessageNode) -> Self {
        Self {
            node,
            state: State::Start,
        }
    }

    /// 走査対象のノード
    pub fn node(&self) -> &'a MessageNode {
        self.node
    }

    /// 走査が終了しているか
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// 次の [`Transfer`] を取得
    ///
    /// `input` は直前に返した [`Transfer`] への回答です。最も内側の保留地点で消費され、
    /// それ以降の処理には渡りません。最初の呼び出しでは無視されます。
    ///
    /// # 戻り値
    ///
    /// - `Ok(Some(Transfer))`: 次の送信単位
    /// - `Ok(None)`: 走査の終了
    /// - `Err(StorageError)`: ストレージへの書き込みに失敗
    pub fn next(
        &mut self,
        storage: &mut dyn Storage,
        input: Option<&str>,
    ) -> Result<Option<Transfer>, StorageError> {
        let mut input = input;

        loop {
            match mem::replace(&mut self.state, State::Done) {
                State::Done => return Ok(None),

                State::Start => {
                    let id = self.node.id();
                    storage.record_visit(id)?;
                    debug!(id, "node visited");

                    match self.node {
                        MessageNode::Text(node) => {
                            return Ok(Some(Transfer::notice(&node.id, Some(node.text.clone()))));
                        }
                        MessageNode::Ask(node) => {
                            self.state = State::Asked(node);
                            return Ok(Some(Transfer::prompt(&node.id, &node.text)));
                        }
                        MessageNode::ListAsk(node) => {
                            self.state = State::ListHeader(node);
                            return Ok(Some(Transfer::notice(&node.id, Some(node.text.clone()))));
                        }
                        MessageNode::Switch(node) => {
                            self.state = State::Choosing(node);
                            return Ok(Some(Transfer::prompt(&node.id, &node.text)));
                        }
                        MessageNode::Group(node) => {
                            self.state = State::GroupNext { node, index: 0 };
                        }
                        MessageNode::TerminateGroup(node) => {
                            self.state = match node.child.as_deref() {
                                Some(child) => State::Wrapped {
                                    node,
                                    child: Box::new(Traversal::new(child)),
                                },
                                None => State::Signal(node),
                            };
                        }
                    }
                }

                State::Asked(node) => {
                    if let Some(answer) = input.take() {
                        storage.record(&node.id, answer)?;
                    }
                }

                State::ListHeader(node) => {
                    input = None;
                    storage.start_array(&node.id)?;
                    self.state = State::ListNext { node, number: 1 };
                }

                State::ListNext { node, number } => {
                    if node.max_count.is_some_and(|max| number > max) {
                        continue;
                    }

                    let item_id = node.item_id(number);
                    storage.record_visit(&item_id)?;
                    self.state = State::ListAsked { node, number };
                    return Ok(Some(Transfer::input(item_id)));
                }

                State::ListAsked { node, number } => {
                    let Some(answer) = input.take().filter(|answer| !answer.is_empty()) else {
                        continue;
                    };

                    storage.record(&node.item_id(number), answer)?;
                    if matches_command(answer, &node.stop_command) {
                        debug!(id = %node.id, count = number - 1, "list stopped by command");
                        continue;
                    }

                    storage.append_array(&node.id, answer)?;
                    self.state = State::ListNext {
                        node,
                        number: number + 1,
                    };
                }

                State::Choosing(node) => match input.take() {
                    Some(answer) => {
                        storage.record(&node.id, answer)?;
                        self.state = match node.answers.get(answer) {
                            Some(branch) => State::Branch(Box::new(Traversal::new(branch))),
                            None => Self::fallback(node, node.repeat_on_fallback),
                        };
                    }
                    // 回答がなければ聞き直しても得られないため、繰り返さない
                    None => self.state = Self::fallback(node, false),
                },

                State::Branch(mut child) => {
                    if let Some(transfer) = child.next(storage, input.take())? {
                        self.state = State::Branch(child);
                        return Ok(Some(transfer));
                    }
                }

                State::Fallback {
                    node,
                    mut child,
                    repeat,
                } => match child.next(storage, input.take())? {
                    Some(transfer) => {
                        self.state = State::Fallback {
                            node,
                            child,
                            repeat,
                        };
                        return Ok(Some(transfer));
                    }
                    None if repeat => self.state = State::Start,
                    None => {}
                },

                State::GroupNext { node, index } => {
                    if let Some(member) = node.children.get(index) {
                        self.state = State::Member {
                            node,
                            index,
                            child: Box::new(Traversal::new(member)),
                        };
                    }
                }

                State::Member {
                    node,
                    index,
                    mut child,
                } => match child.next(storage, input.take())? {
                    Some(transfer) if transfer.terminate_group => {
                        debug!(group = %node.id, by = %transfer.id, "group terminated");
                        return Ok(Some(transfer.released()));
                    }
                    Some(transfer) => {
                        self.state = State::Member { node, index, child };
                        return Ok(Some(transfer));
                    }
                    None => {
                        self.state = State::GroupNext {
                            node,
                            index: index + 1,
                        };
                    }
                },

                State::Wrapped { node, mut child } => match child.next(storage, input.take())? {
                    Some(transfer) => {
                        self.state = State::Wrapped { node, child };
                        return Ok(Some(transfer));
                    }
                    None => self.state = State::Signal(node),
                },

                State::Signal(node) => return Ok(Some(Transfer::terminate(&node.id))),
            }
        }
    }

    /// 走査を強制終了し、保留中の子の状態をすべて破棄する
    pub fn close(&mut self) {
        self.state = State::Done;
    }

    fn fallback(node: &'a Switch, repeat: bool) -> State<'a> {
        match node.fallback.as_deref() {
            Some(fallback) => State::Fallback {
                node,
                child: Box::new(Traversal::new(fallback)),
                repeat,
            },
            None if repeat => State::Start,
            None => State::Done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::node::Text;
    use crate::storage::{AnswerValue, MemoryStorage};

    /// 回答を順番に与えて最後まで走査するヘルパー関数
    ///
    /// 回答待ちの [`Transfer`] に対して `answers` を先頭から 1 つずつ渡します。
    /// 回答が尽きたらそこで止めます。
    fn drive(node: &MessageNode, answers: &[&str]) -> (Vec<Transfer>, MemoryStorage) {
        let mut storage = MemoryStorage::new();
        let mut traversal = Traversal::new(node);
        let mut answers = answers.iter().copied();
        let mut transfers = Vec::new();
        let mut input = None;

        while let Some(transfer) = traversal.next(&mut storage, input).unwrap() {
            input = if transfer.skip { None } else { answers.next() };
            let waiting = !transfer.skip;
            transfers.push(transfer);
            if waiting && input.is_none() {
                break;
            }
        }

        (transfers, storage)
    }

    fn ids(transfers: &[Transfer]) -> Vec<&str> {
        transfers.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_text_yields_single_skip_transfer() {
        let node: MessageNode = Text::new("hello", "Hello!").into();
        let (transfers, storage) = drive(&node, &[]);

        assert_eq!(transfers, vec![Transfer::notice("hello", Some("Hello!".to_string()))]);
        assert!(storage.snapshot().is_empty());
        assert_eq!(storage.history(), ["hello"]);
    }

    #[test]
    fn test_ask_records_answer() {
        let node: MessageNode = Ask::new("name", "What's your name?").into();
        let (transfers, storage) = drive(&node, &["Ann"]);

        assert_eq!(transfers, vec![Transfer::prompt("name", "What's your name?")]);
        assert_eq!(storage.lookup("name"), Some(AnswerValue::from("Ann")));
    }

    #[test]
    fn test_ask_tolerates_missing_answer() {
        let node: MessageNode = Ask::new("name", "?").into();
        let mut storage = MemoryStorage::new();
        let mut traversal = Traversal::new(&node);

        traversal.next(&mut storage, None).unwrap();
        assert!(traversal.next(&mut storage, None).unwrap().is_none());
        assert!(storage.lookup("name").is_none());
    }

    #[test]
    fn test_list_ask_bounded() {
        let node: MessageNode = ListAsk::new("colors", "Name colors", "done")
            .with_max_count(3)
            .into();
        let (transfers, storage) = drive(&node, &["red", "green", "blue", "extra"]);

        assert_eq!(ids(&transfers), ["colors", "colors.1", "colors.2", "colors.3"]);
        assert!(transfers[0].skip);
        assert!(transfers[1..].iter().all(|t| !t.skip && t.text.is_none()));
        assert_eq!(
            storage.lookup("colors"),
            Some(AnswerValue::List(vec![
                "red".to_string(),
                "green".to_string(),
                "blue".to_string(),
            ]))
        );
        assert_eq!(storage.lookup("colors.2"), Some(AnswerValue::from("green")));
    }

    #[test]
    fn test_list_ask_stop_command() {
        let node: MessageNode = ListAsk::new("colors", "Name colors", "done")
            .with_max_count(3)
            .into();
        let (transfers, storage) = drive(&node, &["red", "DONE"]);

        assert_eq!(ids(&transfers), ["colors", "colors.1", "colors.2"]);
        assert_eq!(
            storage.lookup("colors"),
            Some(AnswerValue::List(vec!["red".to_string()]))
        );
        // 停止コマンド自体も項目 ID で記録される
        assert_eq!(storage.lookup("colors.2"), Some(AnswerValue::from("DONE")));
    }

    #[test]
    fn test_list_ask_stops_on_missing_answer() {
        let node: MessageNode = ListAsk::new("colors", "Name colors", "done").into();
        let mut storage = MemoryStorage::new();
        let mut traversal = Traversal::new(&node);

        traversal.next(&mut storage, None).unwrap();
        let first = traversal.next(&mut storage, None).unwrap().unwrap();
        assert_eq!(first.id, "colors.1");
        assert!(traversal.next(&mut storage, None).unwrap().is_none());
        assert_eq!(storage.lookup("colors"), Some(AnswerValue::List(Vec::new())));
    }

    #[test]
    fn test_list_ask_records_item_visits() {
        let node: MessageNode = ListAsk::new("colors", "Name colors", "done").into();
        let (_, storage) = drive(&node, &["red", "done"]);

        assert_eq!(storage.history(), ["colors", "colors.1", "colors.2"]);
    }

    #[test]
    fn test_switch_branches_on_exact_match() {
        let node: MessageNode = Switch::new("mood", "Good day?")
            .with_answer("yes", Text::new("glad", "Glad!"))
            .with_answer("no", Text::new("sorry", "Sorry!"))
            .into();

        let (transfers, storage) = drive(&node, &["no"]);
        assert_eq!(ids(&transfers), ["mood", "sorry"]);
        assert_eq!(storage.lookup("mood"), Some(AnswerValue::from("no")));

        // 大文字小文字は区別される
        let (transfers, _) = drive(&node, &["YES"]);
        assert_eq!(ids(&transfers), ["mood"]);
    }

    #[test]
    fn test_switch_fallback_without_repeat() {
        let node: MessageNode = Switch::new("mood", "Good day?")
            .with_answer("yes", Text::new("glad", "Glad!"))
            .with_fallback(Text::new("unknown", "I see."))
            .into();

        let (transfers, _) = drive(&node, &["maybe"]);
        assert_eq!(ids(&transfers), ["mood", "unknown"]);
    }

    #[test]
    fn test_switch_repeats_prompt_on_miss() {
        let node: MessageNode = Switch::new("mood", "Good day?")
            .with_answer("yes", Text::new("glad", "Glad!"))
            .repeat_on_fallback()
            .into();

        let (transfers, storage) = drive(&node, &["maybe", "yes"]);
        assert_eq!(ids(&transfers), ["mood", "mood", "glad"]);
        assert_eq!(transfers[0], transfers[1]);
        assert_eq!(storage.lookup("mood"), Some(AnswerValue::from("yes")));
        assert_eq!(storage.history(), ["mood", "mood", "glad"]);
    }

    #[test]
    fn test_switch_fallback_then_repeat() {
        let node: MessageNode = Switch::new("mood", "Good day?")
            .with_answer("yes", Text::new("glad", "Glad!"))
            .with_fallback(Text::new("hint", "Please answer yes."))
            .repeat_on_fallback()
            .into();

        let (transfers, _) = drive(&node, &["what", "yes"]);
        assert_eq!(ids(&transfers), ["mood", "hint", "mood", "glad"]);
    }

    #[test]
    fn test_switch_without_answer_does_not_repeat() {
        let node: MessageNode = Switch::new("mood", "Good day?")
            .repeat_on_fallback()
            .into();
        let mut storage = MemoryStorage::new();
        let mut traversal = Traversal::new(&node);

        traversal.next(&mut storage, None).unwrap();
        assert!(traversal.next(&mut storage, None).unwrap().is_none());
    }

    #[test]
    fn test_group_visits_children_in_order() {
        let node: MessageNode = Group::new("main")
            .with_child(Text::new("hi", "Hi"))
            .with_child(Ask::new("name", "Name?"))
            .with_child(Text::new("bye", "Bye"))
            .into();

        let (transfers, storage) = drive(&node, &["Ann"]);
        assert_eq!(ids(&transfers), ["hi", "name", "bye"]);
        assert_eq!(storage.history(), ["main", "hi", "name", "bye"]);
    }

    #[test]
    fn test_group_early_termination() {
        let node: MessageNode = Group::new("main")
            .with_child(Text::new("a", "A"))
            .with_child(TerminateGroup::new("stop").with_child(Text::new("b", "B")))
            .with_child(Text::new("c", "C"))
            .into();

        let (transfers, storage) = drive(&node, &[]);
        assert_eq!(ids(&transfers), ["a", "b", "stop"]);

        let released = &transfers[2];
        assert!(released.skip);
        assert!(!released.terminate_group);
        assert!(released.text.is_none());
        assert!(!storage.history().iter().any(|id| id == "c"));
    }

    #[test]
    fn test_nested_group_only_terminates_innermost() {
        let node: MessageNode = Group::new("outer")
            .with_child(
                Group::new("inner")
                    .with_child(TerminateGroup::new("stop"))
                    .with_child(Text::new("skipped", "never")),
            )
            .with_child(Text::new("after", "After"))
            .into();

        let (transfers, _) = drive(&node, &[]);
        assert_eq!(ids(&transfers), ["stop", "after"]);
    }

    #[test]
    fn test_terminate_passes_through_switch() {
        let node: MessageNode = Group::new("main")
            .with_child(
                Switch::new("continue", "Continue?")
                    .with_answer("no", TerminateGroup::new("quit")),
            )
            .with_child(Text::new("next", "Next"))
            .into();

        let (transfers, _) = drive(&node, &["no"]);
        assert_eq!(ids(&transfers), ["continue", "quit"]);

        let (transfers, _) = drive(&node, &["yes"]);
        assert_eq!(ids(&transfers), ["continue", "next"]);
    }

    #[test]
    fn test_terminate_outside_group_reaches_driver() {
        let node: MessageNode = TerminateGroup::new("stop").into();
        let (transfers, _) = drive(&node, &[]);

        assert_eq!(transfers, vec![Transfer::terminate("stop")]);
    }

    #[test]
    fn test_visit_recorded_before_descendants() {
        let node: MessageNode = Group::new("main")
            .with_child(TerminateGroup::new("wrap").with_child(Ask::new("q", "?")))
            .into();

        let (_, storage) = drive(&node, &["x"]);
        assert_eq!(storage.history(), ["main", "wrap", "q"]);
    }

    #[test]
    fn test_close_discards_pending_state() {
        let node: MessageNode = Group::new("main")
            .with_child(Ask::new("name", "Name?"))
            .with_child(Text::new("bye", "Bye"))
            .into();
        let mut storage = MemoryStorage::new();
        let mut traversal = Traversal::new(&node);

        traversal.next(&mut storage, None).unwrap();
        traversal.close();

        assert!(traversal.is_done());
        assert!(traversal.next(&mut storage, Some("Ann")).unwrap().is_none());
        assert!(storage.lookup("name").is_none());
    }

    #[test]
    fn test_tree_is_reusable_across_traversals() {
        let node: MessageNode = Group::new("main")
            .with_child(Ask::new("name", "Name?"))
            .into();

        let (first, _) = drive(&node, &["Ann"]);
        let (second, _) = drive(&node, &["Bob"]);
        assert_eq!(first, second);
    }
}
