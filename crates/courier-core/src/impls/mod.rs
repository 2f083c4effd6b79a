//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryQueueTransport**: visibility timeout と long polling を再現する開発用キュー
//! - **ChannelSink**: tokio mpsc へ流す MessageSink
//! - **CollectingSink**: 受け取ったバッチを保持する MessageSink
//!
//! # 本番用実装
//! 実際のキューサービス向けの QueueTransport は別クレートに配置します。

pub mod inmem_transport;
pub mod sink;

#[cfg(test)]
pub(crate) mod scripted;

// 主要な型を再エクスポート
pub use self::inmem_transport::InMemoryQueueTransport;
pub use self::sink::{ChannelSink, CollectingSink};
