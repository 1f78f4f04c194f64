//! Infrastructure 層
//!
//! 外部とのやり取り（通信フォーマット、永続化）を担当するレイヤー。

pub mod dto;
pub mod repository;
