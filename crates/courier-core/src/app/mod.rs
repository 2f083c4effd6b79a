//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてポーリングループを実装します。
//!
//! # 主要コンポーネント
//! - **PollerBuilder**: ポーラーの構築とワイヤリング
//! - **PollScheduler**: 自己再アームするタイマー（in_flight ガード + stop）
//! - **CycleExecutor**: 1 サイクル分の receive → deliver → delete
//! - **PollStats**: 実行統計

pub mod builder;
pub mod cycle;
pub mod scheduler;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, Poller, PollerBuilder};
pub use self::cycle::CycleExecutor;
pub use self::scheduler::{PollHandle, PollScheduler};
pub use self::status::{PollStats, PollStatsSnapshot};
