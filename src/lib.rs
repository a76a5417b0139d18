//! Scripted Dialog
//!
//! メッセージノードのツリーとして定義された会話を、プロンプトと回答を
//! 1 つずつやり取りしながら実行するエンジンです。
//! 保存済みの回答と訪問履歴だけから、中断した会話を同じ地点で再開できます。
//!
//! # モジュール構成
//!
//! - [`engine`][]: ツリーの走査とセッション制御
//! - [`storage`][]: 回答ストレージ（インメモリ / JSON ファイル）
//! - [`config`][]: TOML シナリオの読み込み
//! - [`error`][]: エラー型

pub mod config;
pub mod engine;
pub mod error;
pub mod storage;
