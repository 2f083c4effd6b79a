//! QueueTransport port - リモートキューへのクライアント
//!
//! receive / delete / list をそれぞれ 1 回のリクエスト/レスポンスとして扱います。
//! 認証・エンドポイント解決・ワイヤーフォーマットは実装側の責務です。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{DeleteBatchEntry, ReceiveRequest, ReceivedMessage, TransportError};

/// A queue visible to the transport, as returned by `list_queues`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDescriptor {
    pub name: String,
    pub url: String,
}

/// QueueTransport はキューサービスへの操作を抽象化
///
/// # 設計原則
/// - receive は常に順序付きの `Vec` を返す（0 件・1 件・複数件を区別しない）
/// - receipt handle は呼び出し側でエンコード済みのものが渡される
/// - `Send + Sync` を要求（スケジューラのタスクから共有される）
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Queues visible to this transport, optionally filtered by name prefix.
    async fn list_queues(&self, prefix: Option<&str>) -> Result<Vec<QueueDescriptor>, TransportError>;

    /// Receive up to `request.max_number_of_messages` messages, in queue order.
    async fn receive_messages(
        &self,
        request: &ReceiveRequest,
    ) -> Result<Vec<ReceivedMessage>, TransportError>;

    /// Delete one message by its (encoded) receipt handle.
    async fn delete_message(&self, queue: &str, receipt_handle: &str) -> Result<(), TransportError>;

    /// Delete several messages in one call.
    async fn delete_message_batch(
        &self,
        queue: &str,
        entries: &[DeleteBatchEntry],
    ) -> Result<(), TransportError>;
}
