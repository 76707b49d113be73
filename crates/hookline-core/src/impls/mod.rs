//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryStore**: 揮発性の CallbackStore（再起動で全て失われる）
//! - **HttpExecutor**: reqwest による CallbackExecutor
//!
//! 永続ストアは同じ `CallbackStore` trait を実装した別クレートに置く想定。

pub mod http;
pub mod memory;

// 主要な型を再エクスポート
pub use self::http::HttpExecutor;
pub use self::memory::{DEFAULT_BUFFER, InMemoryStore};
