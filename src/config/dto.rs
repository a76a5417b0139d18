//! TOML デシリアライズ用の DTO (Data Transfer Object)
//!
//! # 責務
//!
//! このモジュールは、シナリオファイルの読み書き専用の構造体を提供します。
//! DTO はバリデーション前の「生データ」を表現し、ドメインモデルとは分離されています。
//!
//! ## 変換フロー
//!
//! ```text
//! TOML ファイル
//!   ↓ (デシリアライズ)
//! ScenarioDto
//!   ↓ (TryFrom でバリデーション)
//! Scenario (ドメインモデル)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// シナリオ DTO
///
/// TOML の `[scenario]` セクションと `[root]` ノードをデシリアライズ/シリアライズします。
///
/// **注**: この構造体は config モジュール内部の実装詳細です。
/// 外部からは [`Scenario`](super::scenario::Scenario) を使用してください。
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ScenarioDto {
    /// シナリオのメタデータ
    pub(super) scenario: ScenarioMetadataDto,
    /// ルートノード
    pub(super) root: NodeDto,
}

/// シナリオメタデータ DTO
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ScenarioMetadataDto {
    pub(super) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) stop_command: Option<String>,
}

/// ノード DTO
///
/// `type` フィールドでノードの種類を区別します。
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(super) enum NodeDto {
    Text {
        id: String,
        text: String,
    },
    Ask {
        id: String,
        text: String,
    },
    ListAsk {
        id: String,
        text: String,
        stop_command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_count: Option<usize>,
    },
    Switch {
        id: String,
        text: String,
        #[serde(default)]
        repeat_on_fallback: bool,
        #[serde(default)]
        answers: BTreeMap<String, NodeDto>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<Box<NodeDto>>,
    },
    Group {
        id: String,
        #[serde(default)]
        children: Vec<NodeDto>,
    },
    TerminateGroup {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        child: Option<Box<NodeDto>>,
    },
}
