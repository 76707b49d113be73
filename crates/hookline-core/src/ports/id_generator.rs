//! IdGenerator port - ID 生成の抽象化
//!
//! store の構築時に注入します（プロセス全体のグローバルカウンタは持たない）。
//!
//! # 実装
//! - **SequenceIdGenerator**: 1 から始まる連番（10 進文字列）。インスタンス内でのみ一意
//! - **UlidGenerator**: ULID ベース（再起動をまたいでも衝突しない）

use std::sync::atomic::{AtomicU64, Ordering};

use ulid::Ulid;

use crate::domain::CallbackId;
use crate::ports::Clock;

/// IdGenerator は callback の ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数の save から同時に呼ばれる）
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> CallbackId;
}

/// Monotonically increasing counter formatted as decimal.
#[derive(Debug, Default)]
pub struct SequenceIdGenerator {
    last: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn next_id(&self) -> CallbackId {
        let n = self.last.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        CallbackId::from(n.to_string())
    }
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// これにより、テスト時に FixedClock を使って timestamp 部分を固定できます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn next_id(&self) -> CallbackId {
        let timestamp_ms = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        CallbackId::from(ulid.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn sequence_starts_at_one_and_increments() {
        let ids = SequenceIdGenerator::new();
        assert_eq!(ids.next_id().as_str(), "1");
        assert_eq!(ids.next_id().as_str(), "2");
        assert_eq!(ids.next_id().as_str(), "3");
    }

    #[test]
    fn sequence_is_unique_across_threads() {
        let ids = Arc::new(SequenceIdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..250).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.next_id();
        let id2 = id_gen.next_id();
        let id3 = id_gen.next_id();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn ulid_generator_with_fixed_clock_shares_timestamp() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.next_id();
        let id2 = id_gen.next_id();

        // ランダム部分があるので ID は異なる
        assert_ne!(id1, id2);

        // ただし、timestamp 部分は同じはず
        let ts1 = Ulid::from_string(id1.as_str()).unwrap().timestamp_ms();
        let ts2 = Ulid::from_string(id2.as_str()).unwrap().timestamp_ms();
        assert_eq!(ts1, ts2);
        assert_eq!(ts1, fixed_time.timestamp_millis() as u64);
    }
}
