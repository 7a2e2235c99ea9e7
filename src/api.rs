use std::{borrow::Cow, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::post,
};
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::queue::SubmissionQueue;

pub const REJECTED_MESSAGE: &str = "submission rejected";
pub const MALFORMED_MESSAGE: &str = "malformed submission body";

pub fn routes<Q: SubmissionQueue>() -> Router<Arc<GatewayState<Q>>> {
    Router::new().route("/submit", post(submit::<Q>))
}

#[derive(Debug)]
pub struct GatewayState<Q> {
    pub queue: Q,
    /// Answer push failures with 503 instead of 200.
    pub strict_status: bool,
}

impl<Q: SubmissionQueue> GatewayState<Q> {
    pub fn new(queue: Q, strict_status: bool) -> Self {
        Self {
            queue,
            strict_status,
        }
    }

    fn rejection(&self) -> Response {
        let status = if self.strict_status {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::OK
        };
        message(status, REJECTED_MESSAGE)
    }
}

/// One attempt at a problem, exactly as the client sent it.
///
/// Fields missing from the request stay `None` and are left out of the queue
/// entry. An explicit `null` is kept as `Some(Value::Null)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub problem_id: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub language: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl Submission {
    pub fn new(
        problem_id: impl Into<Value>,
        code: impl Into<Value>,
        language: impl Into<Value>,
    ) -> Self {
        Self {
            problem_id: Some(problem_id.into()),
            code: Some(code.into()),
            language: Some(language.into()),
        }
    }

    /// The per-request diagnostic lines, in the order they are written.
    pub fn diagnostic_lines(&self) -> [Cow<'_, str>; 3] {
        [
            log_field(&self.problem_id),
            log_field(&self.code),
            log_field(&self.language),
        ]
    }
}

fn log_field(field: &Option<Value>) -> Cow<'_, str> {
    match field {
        None => Cow::Borrowed("undefined"),
        Some(Value::String(s)) => Cow::Borrowed(s),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

impl<S: Send + Sync> FromRequest<S> for Submission {
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // non-JSON bodies are never read and leave every field absent
        if !has_json_content_type(req.headers()) {
            return Ok(Self::default());
        }
        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        if body.is_empty() {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(&body) {
            Ok(fields @ Value::Object(_)) => serde_json::from_value(fields)
                .map_err(|_| message(StatusCode::BAD_REQUEST, MALFORMED_MESSAGE)),
            Ok(Value::Array(_)) => Ok(Self::default()),
            Ok(_) | Err(_) => Err(message(StatusCode::BAD_REQUEST, MALFORMED_MESSAGE)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

fn message(status: StatusCode, text: &str) -> Response {
    let body = Message {
        message: text.to_owned(),
    };
    (status, Json(body)).into_response()
}

/// Body of a `/submit` answer: the queue length on success, a message otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmitResponse {
    Queued(i64),
    Rejected(Message),
}

pub async fn submit<Q: SubmissionQueue>(
    State(state): State<Arc<GatewayState<Q>>>,
    submission: Submission,
) -> Response {
    for line in submission.diagnostic_lines() {
        info!("{line}");
    }
    let entry = match serde_json::to_string(&submission) {
        Ok(entry) => entry,
        Err(err) => {
            warn!("Could not encode submission: {err}");
            return state.rejection();
        }
    };
    match state.queue.push(entry).await {
        Ok(len) => (StatusCode::OK, Json(len)).into_response(),
        Err(err) => {
            warn!("Submission rejected: {err}");
            state.rejection()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use serde_json::json;

    use super::*;

    #[test]
    fn entry_keeps_field_order() {
        let submission = Submission::new("1", "print(1)", "python");
        assert_eq!(
            serde_json::to_string(&submission).unwrap(),
            r#"{"problemId":"1","code":"print(1)","language":"python"}"#
        );
    }

    #[test]
    fn missing_fields_are_left_out() {
        let submission: Submission = serde_json::from_value(json!({"code": "x"})).unwrap();
        assert_eq!(submission.problem_id, None);
        assert_eq!(serde_json::to_string(&submission).unwrap(), r#"{"code":"x"}"#);
        assert_eq!(serde_json::to_string(&Submission::default()).unwrap(), "{}");
    }

    #[test]
    fn explicit_null_is_kept() {
        let submission: Submission =
            serde_json::from_value(json!({"problemId": null, "language": "c"})).unwrap();
        assert_eq!(submission.problem_id, Some(Value::Null));
        assert_eq!(
            serde_json::to_string(&submission).unwrap(),
            r#"{"problemId":null,"language":"c"}"#
        );
    }

    #[test]
    fn numeric_problem_id_passes_through() {
        let submission: Submission =
            serde_json::from_value(json!({"problemId": 42, "extra": true})).unwrap();
        assert_eq!(serde_json::to_string(&submission).unwrap(), r#"{"problemId":42}"#);
    }

    #[test]
    fn diagnostic_lines_follow_field_order() {
        let submission = Submission {
            problem_id: Some(json!(7)),
            code: Some(json!("fn main() {}")),
            language: None,
        };
        let lines = submission.diagnostic_lines();
        assert_eq!(lines[0], "7");
        assert_eq!(lines[1], "fn main() {}");
        assert_eq!(lines[2], "undefined");
    }

    #[test]
    fn json_content_type_detection() {
        let mut headers = HeaderMap::new();
        assert!(!has_json_content_type(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!has_json_content_type(&headers));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("Application/JSON; charset=utf-8"),
        );
        assert!(has_json_content_type(&headers));
    }

    #[test]
    fn submit_response_reads_both_shapes() {
        assert_eq!(
            serde_json::from_str::<SubmitResponse>("3").unwrap(),
            SubmitResponse::Queued(3)
        );
        assert_eq!(
            serde_json::from_str::<SubmitResponse>(r#"{"message":"submission rejected"}"#).unwrap(),
            SubmitResponse::Rejected(Message {
                message: REJECTED_MESSAGE.to_owned()
            })
        );
    }
}
