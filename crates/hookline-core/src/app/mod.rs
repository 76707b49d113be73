//! App - アプリケーション層
//!
//! ports を組み合わせて deferred dispatch を実装します。
//!
//! # 主要コンポーネント
//! - **Scheduler**: subscription を消費し、callback ごとに待機→実行→リトライ→finalize
//! - **SchedulerHandle**: shutdown 要求と終了待ち
//! - **RetryPolicy**: 配送リトライの間隔（任意）

pub mod retry;
pub mod scheduler;

// 主要な型を再エクスポート
pub use self::retry::RetryPolicy;
pub use self::scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};
