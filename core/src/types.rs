//! Payload selection and decoded results.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::http::Response;

/// How a successful response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Json,
    Text,
    /// Raw body bytes. Also accepts `arraybuffer` and `blob`.
    #[serde(alias = "arraybuffer", alias = "blob")]
    Bytes,
    /// Bare mode: no status check, the response is handed back as-is.
    Raw,
}

/// Result of a completed call.
#[derive(Debug, Clone)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
    Bytes(Bytes),
    Raw(Response),
}

impl Payload {
    pub fn data_type(&self) -> DataType {
        match self {
            Payload::Json(_) => DataType::Json,
            Payload::Text(_) => DataType::Text,
            Payload::Bytes(_) => DataType::Bytes,
            Payload::Raw(_) => DataType::Raw,
        }
    }

    /// Deserialize a JSON payload (or the body of a raw response) into `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        match self {
            Payload::Json(value) => {
                serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))
            }
            Payload::Raw(response) => response.json(),
            other => Err(unexpected("json", &other)),
        }
    }

    pub fn into_text(self) -> Result<String, FetchError> {
        match self {
            Payload::Text(text) => Ok(text),
            Payload::Raw(response) => response.text(),
            other => Err(unexpected("text", &other)),
        }
    }

    pub fn into_bytes(self) -> Result<Bytes, FetchError> {
        match self {
            Payload::Bytes(bytes) => Ok(bytes),
            Payload::Raw(response) => Ok(response.bytes()),
            other => Err(unexpected("bytes", &other)),
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Payload::Raw(response) => Some(response),
            _ => None,
        }
    }
}

fn unexpected(wanted: &str, got: &Payload) -> FetchError {
    FetchError::Decode(format!("expected {wanted} payload, got {:?}", got.data_type()))
}
