//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! scheduler はここにある trait だけに依存し、実装（impls）は起動時に注入します。

pub mod clock;
pub mod executor;
pub mod id_generator;
pub mod store;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock, TokioClock};
pub use self::executor::CallbackExecutor;
pub use self::id_generator::{IdGenerator, SequenceIdGenerator, UlidGenerator};
pub use self::store::{CallbackStore, Subscription};
