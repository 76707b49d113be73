//! HttpExecutor - reqwest で remote URL に POST する

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::{Callback, ExecuteError};
use crate::ports::CallbackExecutor;

/// POSTs an empty `text/plain` body. Any non-2xx status is a failure.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
}

impl HttpExecutor {
    /// `timeout` bounds one attempt; `None` leaves it to the remote end.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?))
    }

    /// Use a caller-configured client (proxy, TLS roots, timeouts).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CallbackExecutor for HttpExecutor {
    async fn execute(&self, callback: &Callback, cancel: &CancellationToken) -> Result<(), ExecuteError> {
        info!(
            callback_id = %callback.id().unwrap_or_default(),
            remote_url = %callback.remote_url(),
            "executing callback"
        );

        let request = self
            .client
            .post(callback.remote_url())
            .header(CONTENT_TYPE, "text/plain")
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ExecuteError::Cancelled),
            response = request => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ExecuteError::Status(status.as_u16()));
        }
        Ok(())
    }
}
