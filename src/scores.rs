//! Score submission
//!
//! On game over the final score is posted for the signed-in player and the
//! server answers with their best score so far. Submission never blocks the
//! game; the reply lands in a shared cell whenever it arrives.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreSubmission {
    pub user_id: u64,
    pub score: u64,
}

/// Reply body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScoreResponse {
    /// Best score on record for the player
    pub score: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Request could not be built or sent
    Network(String),
    /// Server answered with a non-success status
    Status(u16),
    /// Reply body was not the expected JSON
    Decode(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Network(msg) => write!(f, "network error: {msg}"),
            SubmitError::Status(code) => write!(f, "server returned status {code}"),
            SubmitError::Decode(msg) => write!(f, "bad response: {msg}"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Player id from the host page's `data-user-id`. Guests have none, and
/// anything that isn't a number is treated as a guest.
pub fn parse_user_id(raw: Option<&str>) -> Option<u64> {
    let raw = raw.map(str::trim).filter(|id| !id.is_empty())?;
    match raw.parse() {
        Ok(id) => Some(id),
        Err(e) => {
            log::warn!("Ignoring user id {raw:?}: {e}");
            None
        }
    }
}

/// Build the request body, or `None` for a guest
pub fn submission(user_id: Option<u64>, score: u64) -> Option<ScoreSubmission> {
    Some(ScoreSubmission {
        user_id: user_id?,
        score,
    })
}

/// Extract the best score from a reply body
pub fn parse_response(body: &str) -> Result<u64, SubmitError> {
    serde_json::from_str::<ScoreResponse>(body)
        .map(|r| r.score)
        .map_err(|e| SubmitError::Decode(e.to_string()))
}

/// Best score as last reported by the server
pub type BestScore = Rc<Cell<Option<u64>>>;

/// Receives final scores
pub trait ScoreSink {
    /// Fire-and-forget submission of a finished run
    fn submit(&mut self, score: u64);
    fn best_score(&self) -> Option<u64>;
}

/// Sink for guests and headless runs
#[derive(Debug, Default)]
pub struct NoScores;

impl ScoreSink for NoScores {
    fn submit(&mut self, score: u64) {
        log::debug!("Not submitting {score}: no signed-in player");
    }

    fn best_score(&self) -> Option<u64> {
        None
    }
}

#[cfg(target_arch = "wasm32")]
pub use http::HttpScores;

#[cfg(target_arch = "wasm32")]
mod http {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    use super::{BestScore, ScoreSink, ScoreSubmission, SubmitError, parse_response, submission};

    fn network(e: JsValue) -> SubmitError {
        SubmitError::Network(format!("{e:?}"))
    }

    /// Posts to the score endpoint with `fetch`
    pub struct HttpScores {
        endpoint: String,
        user_id: Option<u64>,
        best: BestScore,
    }

    impl HttpScores {
        pub fn new(endpoint: impl Into<String>, user_id: Option<u64>) -> Self {
            Self {
                endpoint: endpoint.into(),
                user_id,
                best: BestScore::default(),
            }
        }
    }

    async fn post(endpoint: &str, body: &ScoreSubmission) -> Result<u64, SubmitError> {
        let json = serde_json::to_string(body).map_err(|e| SubmitError::Decode(e.to_string()))?;

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::SameOrigin);
        opts.set_body(&JsValue::from_str(&json));

        let request = Request::new_with_str_and_init(endpoint, &opts).map_err(network)?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(network)?;

        let window =
            web_sys::window().ok_or_else(|| SubmitError::Network("no window".to_string()))?;
        let reply = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(network)?;
        let response: Response = reply.dyn_into().map_err(network)?;
        if !response.ok() {
            return Err(SubmitError::Status(response.status()));
        }

        let text = JsFuture::from(response.text().map_err(network)?)
            .await
            .map_err(network)?;
        let text = text
            .as_string()
            .ok_or_else(|| SubmitError::Decode("body is not text".to_string()))?;
        parse_response(&text)
    }

    impl ScoreSink for HttpScores {
        fn submit(&mut self, score: u64) {
            let Some(body) = submission(self.user_id, score) else {
                log::debug!("Not submitting {score}: no signed-in player");
                return;
            };
            let endpoint = self.endpoint.clone();
            let best = self.best.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match post(&endpoint, &body).await {
                    Ok(score) => {
                        log::info!("Best score is now {score}");
                        best.set(Some(score));
                    }
                    Err(e) => log::warn!("Score submission failed: {e}"),
                }
            });
        }

        fn best_score(&self) -> Option<u64> {
            self.best.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_has_no_submission() {
        assert_eq!(submission(None, 900), None);
        assert_eq!(submission(parse_user_id(Some("")), 900), None);
    }

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id(Some("7")), Some(7));
        assert_eq!(parse_user_id(Some(" 42 ")), Some(42));
        assert_eq!(parse_user_id(Some("")), None);
        assert_eq!(parse_user_id(Some("player-7")), None);
        assert_eq!(parse_user_id(None), None);
    }

    #[test]
    fn test_submission_sends_numeric_user_id() {
        let body = submission(parse_user_id(Some("7")), 1200).unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "user_id": 7, "score": 1200 }));
        assert!(json["user_id"].is_u64());
    }

    #[test]
    fn test_parse_response() {
        assert_eq!(parse_response(r#"{"score": 4500}"#), Ok(4500));
        // Extra fields are fine
        assert_eq!(parse_response(r#"{"score": 10, "month": "2026-10"}"#), Ok(10));
        assert!(matches!(parse_response("<html>"), Err(SubmitError::Decode(_))));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(SubmitError::Status(502).to_string(), "server returned status 502");
        assert!(SubmitError::Network("offline".into()).to_string().contains("offline"));
    }

    #[test]
    fn test_no_scores_sink() {
        let mut sink = NoScores;
        sink.submit(300);
        assert_eq!(sink.best_score(), None);
    }
}
