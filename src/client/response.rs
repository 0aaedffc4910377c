use crate::error::{DingTalkError, Result};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Per-call options layered over the configured request defaults
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Use this token instead of the cached one
    pub access_token: Option<String>,
    /// Return non-zero envelopes instead of failing
    pub ignore_error: bool,
    pub timeout: Option<Duration>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn ignore_error(mut self) -> Self {
        self.ignore_error = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Body of an outbound request
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(reqwest::multipart::Form),
}

/// Response whose body was not a JSON envelope (media streams, redirects, empty bodies)
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_redirect(&self) -> bool {
        self.status == StatusCode::MOVED_PERMANENTLY || self.status == StatusCode::FOUND
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Clone)]
pub enum ApiResponse {
    /// Successful envelope, or any envelope when errors are ignored
    Json(Value),
    Raw(RawResponse),
}

impl ApiResponse {
    /// The envelope, failing if the server sent a raw body
    pub fn into_json(self) -> Result<Value> {
        match self {
            ApiResponse::Json(value) => Ok(value),
            ApiResponse::Raw(raw) => Err(DingTalkError::UnexpectedResponse(raw.status)),
        }
    }

    /// Deserialize the envelope into `T`
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.into_json()?)?)
    }

    pub fn errcode(&self) -> Option<i64> {
        match self {
            ApiResponse::Json(value) => Some(envelope_code(value)),
            ApiResponse::Raw(_) => None,
        }
    }
}

/// `errcode` of an envelope; a missing field counts as success
pub fn envelope_code(envelope: &Value) -> i64 {
    match envelope.get("errcode") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(-1),
        Some(Value::String(s)) => s.parse().unwrap_or(-1),
        _ => 0,
    }
}

pub(crate) fn envelope_message(envelope: &Value) -> String {
    envelope
        .get("errmsg")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Flatten a serialized object into query pairs; nulls are dropped, nested values JSON-encoded
pub(crate) fn query_pairs(value: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = value else {
        return Vec::new();
    };

    map.iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}
