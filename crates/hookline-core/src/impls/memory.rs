//! InMemoryStore - 揮発性の callback ストア
//!
//! プロセスが落ちると全て忘れる。テストと単一プロセス運用向け。
//!
//! # 実装詳細
//! - `HashMap<CallbackId, Arc<Callback>>` が active な callback の正本
//! - 有界の mpsc が publish バッファ（満杯なら save が待つ = backpressure）
//! - Receiver は `Arc<Mutex<..>>` で全 Subscription が共有する

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::{Callback, CallbackId, StorageError};
use crate::ports::{CallbackStore, IdGenerator, Subscription};

/// Publish buffer capacity when none is configured.
pub const DEFAULT_BUFFER: usize = 10;

pub struct InMemoryStore {
    callbacks: Mutex<HashMap<CallbackId, Arc<Callback>>>,
    publish: mpsc::Sender<Arc<Callback>>,
    queue: Arc<Mutex<mpsc::Receiver<Arc<Callback>>>>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryStore {
    /// `buffer` is clamped to at least 1.
    pub fn new(ids: Arc<dyn IdGenerator>, buffer: usize) -> Self {
        let (publish, queue) = mpsc::channel(buffer.max(1));
        Self {
            callbacks: Mutex::new(HashMap::new()),
            publish,
            queue: Arc::new(Mutex::new(queue)),
            ids,
        }
    }
}

#[async_trait]
impl CallbackStore for InMemoryStore {
    async fn save(&self, callback: Arc<Callback>) -> Result<CallbackId, StorageError> {
        // 採番前に弾く（sequence に欠番を作らない）
        if let Some(existing) = callback.id() {
            return Err(StorageError::AlreadySaved(existing));
        }

        // Wait for buffer room before touching the map: a full buffer must not block finalize.
        // The store owns the receiver, so this only fails once the store itself is gone.
        let permit = self
            .publish
            .reserve()
            .await
            .map_err(|_| StorageError::Unavailable("publish queue closed".to_string()))?;

        let id = self.ids.next_id();
        callback
            .assign_id(id.clone())
            .map_err(StorageError::AlreadySaved)?;

        self.callbacks
            .lock()
            .await
            .insert(id.clone(), Arc::clone(&callback));
        permit.send(callback);

        debug!(callback_id = %id, "saved callback");
        Ok(id)
    }

    async fn subscribe(&self, cancel: CancellationToken) -> Result<Subscription, StorageError> {
        Ok(Subscription::new(Arc::clone(&self.queue), cancel))
    }

    async fn finalize(&self, id: &CallbackId) -> Result<(), StorageError> {
        let mut callbacks = self.callbacks.lock().await;
        match callbacks.remove(id) {
            Some(callback) => {
                callback.mark_done();
                debug!(callback_id = %id, "finalized callback");
            }
            None => debug!(callback_id = %id, "callback already finalized"),
        }
        Ok(())
    }

    async fn get(&self, id: &CallbackId) -> Option<Arc<Callback>> {
        self.callbacks.lock().await.get(id).cloned()
    }

    async fn pending(&self) -> usize {
        self.callbacks.lock().await.len()
    }
}
