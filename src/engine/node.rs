//! 会話ツリーを構成するメッセージノード
//!
//! # 責務
//!
//! - 6 種類のノード（Text / Ask / ListAsk / Switch / Group / TerminateGroup）の定義
//! - ツリーの構築用コンストラクタ
//!
//! ノードは構築後に変更されません。走査ごとの状態はすべて
//! [`Traversal`](super::traversal::Traversal) 側が保持するため、
//! 同じツリーを複数の会話で使い回せます。
//!
//! # 使用例
//!
//! ```rust
//! use scripted_dialog::engine::node::{Ask, Group, MessageNode, Switch, Text};
//!
//! let tree: MessageNode = Group::new("main")
//!     .with_child(Ask::new("name", "What's your name?"))
//!     .with_child(
//!         Switch::new("mood", "Good day?")
//!             .with_answer("yes", Text::new("glad", "Glad to hear!"))
//!             .with_fallback(Text::new("sorry", "Sorry to hear."))
//!     )
//!     .into();
//!
//! assert_eq!(tree.id(), "main");
//! ```

use std::collections::BTreeMap;

/// 会話ツリーのノード
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageNode {
    Text(Text),
    Ask(Ask),
    ListAsk(ListAsk),
    Switch(Switch),
    Group(Group),
    TerminateGroup(TerminateGroup),
}

impl MessageNode {
    /// ノードの ID
    pub fn id(&self) -> &str {
        match self {
            MessageNode::Text(node) => &node.id,
            MessageNode::Ask(node) => &node.id,
            MessageNode::ListAsk(node) => &node.id,
            MessageNode::Switch(node) => &node.id,
            MessageNode::Group(node) => &node.id,
            MessageNode::TerminateGroup(node) => &node.id,
        }
    }

    /// 直下の子ノード
    pub fn children(&self) -> Vec<&MessageNode> {
        match self {
            MessageNode::Text(_) | MessageNode::Ask(_) | MessageNode::ListAsk(_) => Vec::new(),
            MessageNode::Switch(node) => node
                .answers
                .values()
                .chain(node.fallback.as_deref())
                .collect(),
            MessageNode::Group(node) => node.children.iter().collect(),
            MessageNode::TerminateGroup(node) => node.child.as_deref().into_iter().collect(),
        }
    }
}

/// テキストを送るだけのノード（回答を求めない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub(crate) id: String,
    pub(crate) text: String,
}

impl Text {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// 質問して回答を 1 つ記録するノード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ask {
    pub(crate) id: String,
    pub(crate) text: String,
}

impl Ask {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// 回答を繰り返し集めて配列に記録するノード
///
/// 見出しのテキストを送った後、`{id}.1`, `{id}.2`, ... の ID で回答を待ちます。
/// 停止コマンド（大文字小文字を区別しない）、空の回答、または上限回数で終了します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListAsk {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) stop_command: String,
    pub(crate) max_count: Option<usize>,
}

impl ListAsk {
    /// 上限なしのリスト質問を生成
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        stop_command: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            stop_command: stop_command.into(),
            max_count: None,
        }
    }

    /// 回答数の上限を設定
    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = Some(max_count);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn stop_command(&self) -> &str {
        &self.stop_command
    }

    pub fn max_count(&self) -> Option<usize> {
        self.max_count
    }

    /// `number` 回目（1 始まり）の回答の ID
    pub fn item_id(&self, number: usize) -> String {
        format!("{}.{}", self.id, number)
    }
}

/// 回答によって分岐するノード
///
/// 回答は完全一致で `answers` から引かれます。見つからなければ `fallback` に委譲し、
/// `repeat_on_fallback` が有効なら最初から質問し直します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) answers: BTreeMap<String, MessageNode>,
    pub(crate) fallback: Option<Box<MessageNode>>,
    pub(crate) repeat_on_fallback: bool,
}

impl Switch {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            answers: BTreeMap::new(),
            fallback: None,
            repeat_on_fallback: false,
        }
    }

    /// 回答と分岐先を追加
    pub fn with_answer(mut self, answer: impl Into<String>, node: impl Into<MessageNode>) -> Self {
        self.answers.insert(answer.into(), node.into());
        self
    }

    /// 該当なしの場合の分岐先を設定
    pub fn with_fallback(mut self, node: impl Into<MessageNode>) -> Self {
        self.fallback = Some(Box::new(node.into()));
        self
    }

    /// 該当なしの場合に質問をやり直す
    pub fn repeat_on_fallback(mut self) -> Self {
        self.repeat_on_fallback = true;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn answers(&self) -> &BTreeMap<String, MessageNode> {
        &self.answers
    }

    pub fn fallback(&self) -> Option<&MessageNode> {
        self.fallback.as_deref()
    }

    pub fn repeats_on_fallback(&self) -> bool {
        self.repeat_on_fallback
    }
}

/// 子ノードを順番に辿るノード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub(crate) id: String,
    pub(crate) children: Vec<MessageNode>,
}

impl Group {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, node: impl Into<MessageNode>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn with_children(mut self, nodes: impl IntoIterator<Item = MessageNode>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn children(&self) -> &[MessageNode] {
        &self.children
    }
}

/// 外側の Group の残りを打ち切るノード
///
/// 子ノードがあれば先に辿り、その後に打ち切りシグナルを送ります。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminateGroup {
    pub(crate) id: String,
    pub(crate) child: Option<Box<MessageNode>>,
}

impl TerminateGroup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            child: None,
        }
    }

    pub fn with_child(mut self, node: impl Into<MessageNode>) -> Self {
        self.child = Some(Box::new(node.into()));
        self
    }

    pub fn child(&self) -> Option<&MessageNode> {
        self.child.as_deref()
    }
}

impl From<Text> for MessageNode {
    fn from(node: Text) -> Self {
        MessageNode::Text(node)
    }
}

impl From<Ask> for MessageNode {
    fn from(node: Ask) -> Self {
        MessageNode::Ask(node)
    }
}

impl From<ListAsk> for MessageNode {
    fn from(node: ListAsk) -> Self {
        MessageNode::ListAsk(node)
    }
}

impl From<Switch> for MessageNode {
    fn from(node: Switch) -> Self {
        MessageNode::Switch(node)
    }
}

impl From<Group> for MessageNode {
    fn from(node: Group) -> Self {
        MessageNode::Group(node)
    }
}

impl From<TerminateGroup> for MessageNode {
    fn from(node: TerminateGroup) -> Self {
        MessageNode::TerminateGroup(node)
    }
}
