//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! キューサービス（SQS 互換など）と下流の consumer へのインターフェースを
//! trait として提供し、ポーリングループから実装の詳細を隠蔽します。

pub mod message_sink;
pub mod queue_transport;

// 主要な trait を再エクスポート
pub use self::message_sink::MessageSink;
pub use self::queue_transport::{QueueDescriptor, QueueTransport};
