//! hookline-core
//!
//! Deferred webhook dispatch: a callback is a remote URL plus a deadline.
//! The store persists it and publishes it, the scheduler waits for the
//! deadline, POSTs the URL until one attempt succeeds, then finalizes it.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（Callback, CallbackId, errors, request validation）
//! - **ports**: 抽象化レイヤー（CallbackStore, CallbackExecutor, IdGenerator, Clock）
//! - **impls**: 実装（InMemoryStore, HttpExecutor）
//! - **app**: Scheduler と RetryPolicy

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
