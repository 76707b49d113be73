//! CallbackExecutor port - 1 回分の配送（純粋な I/O）
//!
//! リトライ・待機のポリシーは持たない。それは scheduler の責務。

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{Callback, ExecuteError};

/// CallbackExecutor は callback の remote URL を 1 回呼び出す
///
/// # 約束
/// - 成功 / 失敗だけを返す
/// - `cancel` が発火したら `ExecuteError::Cancelled` で早期に戻ってよい
#[async_trait]
pub trait CallbackExecutor: Send + Sync {
    async fn execute(&self, callback: &Callback, cancel: &CancellationToken) -> Result<(), ExecuteError>;
}
