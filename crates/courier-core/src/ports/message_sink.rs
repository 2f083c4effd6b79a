//! MessageSink port - 受信したメッセージの下流
//!
//! # 実装
//! - ChannelSink: tokio mpsc へ流す（CLI 用）
//! - CollectingSink: 受け取ったバッチを保持する（テスト用）

use async_trait::async_trait;

use crate::domain::{ReceivedMessage, SinkError};

/// MessageSink は 1 サイクル分のメッセージをまとめて受け取る
///
/// # エラー
/// - エラーはコアでは捕捉しない（ホスト側の責務）
/// - すぐに返ることを想定（長時間ブロックしない）
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn emit(&self, batch: Vec<ReceivedMessage>) -> Result<(), SinkError>;
}
