//! Domain model (callback, ids, errors, request validation).

pub mod callback;
pub mod duration;
pub mod errors;
pub mod ids;
pub mod request;

pub use callback::{Callback, CallbackView};
pub use duration::{InvalidDuration, parse_duration};
pub use errors::{ExecuteError, SchedulerError, StorageError, ValidationError};
pub use ids::CallbackId;
pub use request::{CreateCallbackRequest, MIN_DELAY};
