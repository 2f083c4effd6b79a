//! courier-core
//!
//! Core building blocks for the Courier queue poller.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（config, message, request, outcome, errors）
//! - **ports**: 抽象化レイヤー（QueueTransport, MessageSink）
//! - **app**: アプリケーションロジック（builder, scheduler, cycle, status）
//! - **impls**: 実装（InMemoryQueueTransport, ChannelSink など開発用）
//! - **observability**: tracing の初期化

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{BuildError, CycleExecutor, PollHandle, PollScheduler, Poller, PollerBuilder};
pub use domain::{
    ConfigurationError, CycleOutcome, IntervalUnit, PollConfig, PollOptions, ReceivedMessage,
    SinkError, TransportError, ValidationError,
};
pub use observability::init_tracing;
