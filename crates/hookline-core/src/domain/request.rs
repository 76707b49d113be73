//! Create-callback request and its validation.

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{Callback, ValidationError, parse_duration};

/// Smallest accepted delay between the request and the deadline.
pub const MIN_DELAY: TimeDelta = TimeDelta::minutes(1);

/// Body of `POST /callback`.
///
/// Missing fields decode as empty strings and are rejected by `into_callback`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateCallbackRequest {
    #[serde(default)]
    pub remote_url: String,

    #[serde(default, rename = "in")]
    pub delay: String,
}

impl CreateCallbackRequest {
    /// Validate and build a callback whose deadline is `now + delay`.
    pub fn into_callback(self, now: DateTime<Utc>) -> Result<Callback, ValidationError> {
        let url = Url::parse(&self.remote_url)
            .map_err(|_| ValidationError::InvalidUrl(self.remote_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidUrl(self.remote_url));
        }

        let delay = parse_duration(&self.delay)
            .map_err(|_| ValidationError::InvalidDuration(self.delay.clone()))?;
        if delay < MIN_DELAY {
            return Err(ValidationError::TooSoon(self.delay));
        }

        let deadline = now
            .checked_add_signed(delay)
            .ok_or_else(|| ValidationError::InvalidDuration(self.delay.clone()))?;
        Ok(Callback::new(self.remote_url, deadline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn request(remote_url: &str, delay: &str) -> CreateCallbackRequest {
        CreateCallbackRequest {
            remote_url: remote_url.to_string(),
            delay: delay.to_string(),
        }
    }

    #[test]
    fn builds_callback_with_deadline_from_now() {
        let cb = request("https://example.com/hook", "90s")
            .into_callback(now())
            .unwrap();

        assert_eq!(cb.remote_url(), "https://example.com/hook");
        assert_eq!(cb.deadline(), now() + TimeDelta::seconds(90));
        assert_eq!(cb.id(), None);
    }

    #[test]
    fn exactly_one_minute_is_accepted() {
        assert!(request("http://localhost:9000/cb", "1m").into_callback(now()).is_ok());
    }

    #[rstest]
    #[case::empty("")]
    #[case::relative("/hook")]
    #[case::no_scheme("example.com/hook")]
    #[case::not_http("ftp://example.com/file")]
    fn rejects_bad_urls(#[case] url: &str) {
        let err = request(url, "5m").into_callback(now()).unwrap_err();
        assert_eq!(err, ValidationError::InvalidUrl(url.to_string()));
    }

    #[rstest]
    #[case::empty("")]
    #[case::words("tomorrow")]
    #[case::missing_unit("120")]
    fn rejects_malformed_durations(#[case] delay: &str) {
        let err = request("https://example.com/hook", delay)
            .into_callback(now())
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidDuration(delay.to_string()));
    }

    #[rstest]
    #[case::seconds("59s")]
    #[case::zero("0")]
    #[case::negative("-5m")]
    fn rejects_durations_below_a_minute(#[case] delay: &str) {
        let err = request("https://example.com/hook", delay)
            .into_callback(now())
            .unwrap_err();
        assert_eq!(err, ValidationError::TooSoon(delay.to_string()));
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let req: CreateCallbackRequest = serde_json::from_str(r#"{"in": "2m"}"#).unwrap();
        assert_eq!(req.remote_url, "");
        assert_eq!(req.delay, "2m");
    }
}
