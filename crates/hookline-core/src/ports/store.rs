//! CallbackStore port - callback の保存先と新着通知
//!
//! CallbackStore は以下を管理します：
//! - 永続化（save）と ID の払い出し
//! - 新着 callback の配信（subscribe）
//! - 完了処理（finalize）
//!
//! # 実装
//! - **InMemoryStore**: 揮発性（クラッシュで全て失われる）
//! - 永続化が必要なら同じ trait を別実装で差し替える

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::domain::{Callback, CallbackId, StorageError};

/// CallbackStore is the home of active callbacks.
///
/// # 配信の意味論
/// - 同じ store から作った `Subscription` は一つのキューを共有する（competing consumers）
/// - 保存された callback はちょうど一つの subscriber に届く（fan-out はしない）
#[async_trait]
pub trait CallbackStore: Send + Sync {
    /// Assign an id, persist, and publish to subscribers.
    ///
    /// May wait for room in the publish buffer; never treat it as non-blocking.
    async fn save(&self, callback: Arc<Callback>) -> Result<CallbackId, StorageError>;

    /// Stream of saved callbacks. Ends once `cancel` fires.
    async fn subscribe(&self, cancel: CancellationToken) -> Result<Subscription, StorageError>;

    /// Mark the callback done and drop it from active storage.
    ///
    /// Finalizing an id that is no longer active succeeds.
    async fn finalize(&self, id: &CallbackId) -> Result<(), StorageError>;

    /// Active (not yet finalized) callback by id.
    async fn get(&self, id: &CallbackId) -> Option<Arc<Callback>>;

    /// Number of active callbacks.
    async fn pending(&self) -> usize;
}

/// Receiving end of a store's publish queue.
pub struct Subscription {
    queue: Arc<Mutex<mpsc::Receiver<Arc<Callback>>>>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn new(queue: Arc<Mutex<mpsc::Receiver<Arc<Callback>>>>, cancel: CancellationToken) -> Self {
        Self { queue, cancel }
    }

    /// Next saved callback, or `None` once cancelled or the store is gone.
    ///
    /// Cancel safe: dropping the future never loses a callback.
    pub async fn recv(&self) -> Option<Arc<Callback>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            callback = async { self.queue.lock().await.recv().await } => callback,
        }
    }
}
