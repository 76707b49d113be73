//! Errors - エラー型と分類
//!
//! | 種類 | 型 | 扱い |
//! |---|---|---|
//! | 入力不正 | `ValidationError` | 呼び出し元へ即返す（リトライなし） |
//! | ストア障害 | `StorageError` | subscribe は固定間隔でリトライ、save は即返す |
//! | 配送失敗 | `ExecuteError` | scheduler が無制限にリトライ |
//! | finalize 失敗 | `StorageError` | 有限回リトライ後ログして諦める |

use thiserror::Error;

use super::CallbackId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("callback already saved with id {0}")]
    AlreadySaved(CallbackId),
}

/// One delivery attempt did not succeed.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote endpoint responded with status {0}")]
    Status(u16),

    /// Aborted by shutdown. Not retried.
    #[error("execution cancelled")]
    Cancelled,
}

/// Rejected create-callback request. `Display` is the client-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid url: \"{0}\"")]
    InvalidUrl(String),

    #[error("invalid duration: \"{0}\"")]
    InvalidDuration(String),

    #[error("invalid duration: \"{0}\" is less than a minute in the future")]
    TooSoon(String),
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler stopped before subscribing to callbacks")]
    Stopped,

    #[error("scheduler task failed: {0}")]
    TaskFailed(String),
}
