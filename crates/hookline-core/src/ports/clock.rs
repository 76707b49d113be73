//! Clock port - 時刻の抽象化
//!
//! - **SystemClock**: 本番用（`Utc::now()`）
//! - **FixedClock**: テスト用（常に同じ時刻）
//! - **TokioClock**: tokio のタイマー時計で進む壁時計（`tokio::time::pause` に追従）

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::Instant;

/// Clock は現在時刻を提供
///
/// scheduler は deadline までの待ち時間を `deadline - clock.now()` で計算します。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}

/// Wall clock anchored at construction and advanced by `tokio::time::Instant`.
///
/// Under a paused tokio runtime, deadlines expressed in wall time line up
/// with tokio timers exactly.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    anchor: DateTime<Utc>,
    origin: Instant,
}

impl TokioClock {
    pub fn new(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.origin.elapsed()).unwrap_or(TimeDelta::MAX);
        self.anchor
            .checked_add_signed(elapsed)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
