use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CallbackId;

/// Fields that change after construction. Guarded by the per-callback lock.
#[derive(Debug, Default)]
struct CallbackState {
    id: Option<CallbackId>,
    done: bool,
}

/// A registered request to POST `remote_url` once, no earlier than `deadline`.
///
/// `remote_url` and `deadline` are immutable. `id` is written once by the
/// store on save, `done` flips false -> true once on finalize. Both sit
/// behind an `RwLock` so a status reader never blocks on another reader.
#[derive(Debug)]
pub struct Callback {
    remote_url: String,
    deadline: DateTime<Utc>,
    state: RwLock<CallbackState>,
}

impl Callback {
    pub fn new(remote_url: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            remote_url: remote_url.into(),
            deadline,
            state: RwLock::new(CallbackState::default()),
        }
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// `None` until the first successful save.
    pub fn id(&self) -> Option<CallbackId> {
        self.read().id.clone()
    }

    pub fn is_done(&self) -> bool {
        self.read().done
    }

    /// Assign the store identifier.
    ///
    /// Returns the already assigned id as `Err` if this callback was saved before.
    pub fn assign_id(&self, id: CallbackId) -> Result<(), CallbackId> {
        let mut state = self.write();
        match &state.id {
            Some(existing) => Err(existing.clone()),
            None => {
                state.id = Some(id);
                Ok(())
            }
        }
    }

    /// Mark as done. Returns `true` only for the call that made the transition.
    pub fn mark_done(&self) -> bool {
        let mut state = self.write();
        let transitioned = !state.done;
        state.done = true;
        transitioned
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn wait_from(&self, now: DateTime<Utc>) -> Duration {
        (self.deadline - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Consistent read of all fields.
    pub fn snapshot(&self) -> CallbackView {
        let state = self.read();
        CallbackView {
            id: state.id.clone(),
            remote_url: self.remote_url.clone(),
            deadline: self.deadline,
            done: state.done,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CallbackState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CallbackState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Serializable view of a callback (status endpoint, logs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackView {
    pub id: Option<CallbackId>,
    pub remote_url: String,
    pub deadline: DateTime<Utc>,
    pub done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn deadline() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn new_callback_has_no_id_and_is_not_done() {
        let cb = Callback::new("https://example.com/hook", deadline());
        assert_eq!(cb.id(), None);
        assert!(!cb.is_done());
        assert_eq!(cb.remote_url(), "https://example.com/hook");
        assert_eq!(cb.deadline(), deadline());
    }

    #[test]
    fn id_is_assigned_only_once() {
        let cb = Callback::new("https://example.com/hook", deadline());
        cb.assign_id(CallbackId::from("1")).unwrap();

        let err = cb.assign_id(CallbackId::from("2")).unwrap_err();
        assert_eq!(err, CallbackId::from("1"));
        assert_eq!(cb.id(), Some(CallbackId::from("1")));
    }

    #[test]
    fn mark_done_transitions_once() {
        let cb = Callback::new("https://example.com/hook", deadline());
        assert!(cb.mark_done());
        assert!(!cb.mark_done());
        assert!(cb.is_done());
    }

    #[test]
    fn wait_from_clamps_past_deadline_to_zero() {
        let cb = Callback::new("https://example.com/hook", deadline());

        let before = deadline() - TimeDelta::seconds(90);
        assert_eq!(cb.wait_from(before), Duration::from_secs(90));

        let after = deadline() + TimeDelta::seconds(5);
        assert_eq!(cb.wait_from(after), Duration::ZERO);
    }

    #[test]
    fn snapshot_serializes_all_fields() {
        let cb = Callback::new("https://example.com/hook", deadline());
        cb.assign_id(CallbackId::from("3")).unwrap();

        let v = serde_json::to_value(cb.snapshot()).unwrap();
        assert_eq!(v["id"], "3");
        assert_eq!(v["remote_url"], "https://example.com/hook");
        assert_eq!(v["deadline"], "2024-01-01T12:00:00Z");
        assert_eq!(v["done"], false);
    }
}
