//! シナリオ定義の読み込みと管理を行うモジュール
//!
//! # 責務
//!
//! このモジュールは、会話ツリーを TOML 形式で定義し、
//! それを Rust の型として扱うための機能を提供します。
//!
//! ## 主な機能
//!
//! - **TOML パース**: シナリオファイルを読み込み、[`Scenario`] に変換
//! - **バリデーション**: ID の重複や空の ID など、ツリーとして不正な定義を検出
//! - **セッション設定**: 見出しと停止コマンドを [`SessionConfig`] として提供
//!
//! ## 使用例
//!
//! ```toml
//! [scenario]
//! name = "greeting"
//! headline = "Hello!"
//! stop_command = "/stop"
//!
//! [root]
//! type = "group"
//! id = "main"
//!
//! [[root.children]]
//! type = "ask"
//! id = "name"
//! text = "What's your name?"
//!
//! [[root.children]]
//! type = "text"
//! id = "bye"
//! text = "Goodbye"
//! ```
//!
//! ## 関連モジュール
//!
//! - [`crate::engine::node`]: ツリーを構成するノード
//! - [`crate::engine::session`]: シナリオを実行するセッション

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use super::dto::{NodeDto, ScenarioDto, ScenarioMetadataDto};
use crate::engine::node::{Ask, Group, ListAsk, MessageNode, Switch, TerminateGroup, Text};
use crate::engine::session::SessionConfig;
use crate::error::ConfigError;

/// シナリオ定義（ドメインモデル）
///
/// バリデーション済みのツリーとセッション設定を保持します。
///
/// ## DTO との違い
///
/// - [`ScenarioDto`]: TOML デシリアライズ専用、バリデーション前の生データ
/// - [`Scenario`]: バリデーション済み、ツリーとして実行可能
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    name: String,
    description: Option<String>,
    headline: Option<String>,
    stop_command: Option<String>,
    root: MessageNode,
}

impl Scenario {
    /// TOML ファイルからシナリオを読み込む
    ///
    /// # 処理フロー
    ///
    /// 1. ファイル読み込み
    /// 2. TOML デシリアライズ → [`ScenarioDto`]
    /// 3. バリデーション & 変換 → [`Scenario`]
    ///
    /// # 戻り値
    ///
    /// * `Ok(Scenario)` - 読み込みに成功した場合
    /// * `Err(ConfigError)` - ファイルの読み込み、パース、バリデーションに失敗した場合
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// TOML 文字列からシナリオを読み込む
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let dto: ScenarioDto = toml::from_str(toml)?;
        Scenario::try_from(dto)
    }

    /// シナリオを TOML 文字列に変換
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let dto = ScenarioDto::from(self.clone());
        Ok(toml::to_string(&dto)?)
    }

    /// シナリオを TOML ファイルに保存
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        fs::write(path, self.to_toml()?).map_err(|source| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// 会話ツリーのルート
    pub fn root(&self) -> &MessageNode {
        &self.root
    }

    /// 見出しと停止コマンドからセッション設定を作る
    pub fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new();
        if let Some(headline) = &self.headline {
            config = config.with_headline(headline.clone());
        }
        if let Some(command) = &self.stop_command {
            config = config.with_stop_command(command.clone());
        }
        config
    }
}

/// DTO からドメインモデルへの変換（読み込み方向）
///
/// バリデーションを実施し、不正なデータの場合は [`ConfigError::Validation`] を返します。
///
/// # 処理フロー
///
/// 1. メタデータのバリデーション
/// 2. ノードの再帰的な変換（`NodeDto` → `MessageNode`）と ID の重複チェック
/// 3. ListAsk が生成する回答 ID（`<id>.<n>`）と他のノード ID の衝突チェック
/// 4. `Scenario` の構築
impl TryFrom<ScenarioDto> for Scenario {
    type Error = ConfigError;

    fn try_from(dto: ScenarioDto) -> Result<Self, Self::Error> {
        let ScenarioDto { scenario, root } = dto;

        if scenario.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "シナリオ名が空です".to_string(),
            ));
        }

        let mut registry = IdRegistry::default();
        let root = convert_node(root, &mut registry)?;
        registry.check_list_items()?;

        Ok(Self {
            name: scenario.name,
            description: scenario.description,
            headline: scenario.headline,
            stop_command: scenario.stop_command,
            root,
        })
    }
}

/// ドメインモデルから DTO への変換（書き込み方向）
///
/// バリデーション済みのドメインモデルから DTO を生成するため、
/// この変換は失敗しません（`From` トレイトを使用）。
impl From<Scenario> for ScenarioDto {
    fn from(scenario: Scenario) -> Self {
        Self {
            scenario: ScenarioMetadataDto {
                name: scenario.name,
                description: scenario.description,
                headline: scenario.headline,
                stop_command: scenario.stop_command,
            },
            root: NodeDto::from(scenario.root),
        }
    }
}

impl From<MessageNode> for NodeDto {
    fn from(node: MessageNode) -> Self {
        match node {
            MessageNode::Text(Text { id, text }) => NodeDto::Text { id, text },
            MessageNode::Ask(Ask { id, text }) => NodeDto::Ask { id, text },
            MessageNode::ListAsk(ListAsk {
                id,
                text,
                stop_command,
                max_count,
            }) => NodeDto::ListAsk {
                id,
                text,
                stop_command,
                max_count,
            },
            MessageNode::Switch(Switch {
                id,
                text,
                answers,
                fallback,
                repeat_on_fallback,
            }) => NodeDto::Switch {
                id,
                text,
                repeat_on_fallback,
                answers: answers
                    .into_iter()
                    .map(|(answer, node)| (answer, NodeDto::from(node)))
                    .collect(),
                fallback: fallback.map(|node| Box::new(NodeDto::from(*node))),
            },
            MessageNode::Group(Group { id, children }) => NodeDto::Group {
                id,
                children: children.into_iter().map(NodeDto::from).collect(),
            },
            MessageNode::TerminateGroup(TerminateGroup { id, child }) => NodeDto::TerminateGroup {
                id,
                child: child.map(|node| Box::new(NodeDto::from(*node))),
            },
        }
    }
}

/// 変換中に見つかった ID の登録簿
///
/// 走査中に現れる ID はすべて一意でなければなりません。
/// ListAsk は `<id>.1`, `<id>.2`, ... を生成するため、その範囲も記録しておき、
/// 全ノードの登録後にまとめて照合します。
#[derive(Debug, Default)]
struct IdRegistry {
    seen: HashSet<String>,
    lists: Vec<(String, Option<usize>)>,
}

impl IdRegistry {
    /// ID を検証して登録
    fn claim(&mut self, id: &str) -> Result<(), ConfigError> {
        if id.trim().is_empty() {
            return Err(ConfigError::Validation("ノード ID が空です".to_string()));
        }
        if !self.seen.insert(id.to_string()) {
            return Err(ConfigError::Validation(format!(
                "ノード ID '{id}' が重複しています"
            )));
        }
        Ok(())
    }

    fn claim_list(&mut self, id: &str, max_count: Option<usize>) -> Result<(), ConfigError> {
        self.claim(id)?;
        self.lists.push((id.to_string(), max_count));
        Ok(())
    }

    /// ListAsk の回答 ID と衝突するノード ID を検出
    ///
    /// 上限のない ListAsk は `<id>.<正の整数>` の形の ID をすべて予約します。
    fn check_list_items(&self) -> Result<(), ConfigError> {
        for (list_id, max_count) in &self.lists {
            let prefix = format!("{list_id}.");

            for id in &self.seen {
                let Some(number) = id.strip_prefix(&prefix).and_then(item_number) else {
                    continue;
                };
                if max_count.is_none_or(|max| number <= max) {
                    return Err(ConfigError::Validation(format!(
                        "ノード ID '{id}' が ListAsk '{list_id}' の回答 ID と重複しています"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// `"3"` のような回答番号を解釈（`"03"` や `"0"` は番号として扱わない）
fn item_number(suffix: &str) -> Option<usize> {
    let number: usize = suffix.parse().ok()?;
    (number >= 1 && number.to_string() == suffix).then_some(number)
}

/// ノード DTO を再帰的に変換（プライベート関数）
fn convert_node(dto: NodeDto, registry: &mut IdRegistry) -> Result<MessageNode, ConfigError> {
    let node = match dto {
        NodeDto::Text { id, text } => {
            registry.claim(&id)?;
            Text::new(id, text).into()
        }
        NodeDto::Ask { id, text } => {
            registry.claim(&id)?;
            Ask::new(id, text).into()
        }
        NodeDto::ListAsk {
            id,
            text,
            stop_command,
            max_count,
        } => {
            registry.claim_list(&id, max_count)?;
            if stop_command.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "ListAsk '{id}' の停止コマンドが空です"
                )));
            }

            let list = ListAsk::new(id, text, stop_command);
            match max_count {
                Some(0) => {
                    return Err(ConfigError::Validation(format!(
                        "ListAsk '{}' の max_count は 1 以上にしてください",
                        list.id
                    )));
                }
                Some(max) => list.with_max_count(max).into(),
                None => list.into(),
            }
        }
        NodeDto::Switch {
            id,
            text,
            repeat_on_fallback,
            answers,
            fallback,
        } => {
            registry.claim(&id)?;

            let answers = answers
                .into_iter()
                .map(|(answer, child)| Ok::<_, ConfigError>((answer, convert_node(child, registry)?)))
                .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;
            let fallback = fallback
                .map(|child| convert_node(*child, registry).map(Box::new))
                .transpose()?;

            MessageNode::Switch(Switch {
                id,
                text,
                answers,
                fallback,
                repeat_on_fallback,
            })
        }
        NodeDto::Group { id, children } => {
            registry.claim(&id)?;

            let children = children
                .into_iter()
                .map(|child| convert_node(child, registry))
                .collect::<Result<Vec<_>, _>>()?;

            Group::new(id).with_children(children).into()
        }
        NodeDto::TerminateGroup { id, child } => {
            registry.claim(&id)?;

            let child = child
                .map(|child| convert_node(*child, registry).map(Box::new))
                .transpose()?;

            MessageNode::TerminateGroup(TerminateGroup { id, child })
        }
    };

    Ok(node)
}
