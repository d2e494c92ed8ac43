//! Success/error decision and payload extraction for terminal responses.

use crate::error::{FetchError, Result};
use crate::http::Response;
use crate::types::{DataType, Payload};

/// Classify a terminal response and decode it as `data_type`.
///
/// `DataType::Raw` skips the status check entirely and hands the response
/// back for the caller to decode.
pub fn classify(response: Response, data_type: DataType) -> Result<Payload> {
    if data_type == DataType::Raw {
        return Ok(Payload::Raw(response));
    }
    check_status(&response)?;
    decode(response, data_type)
}

/// Map non-2xx statuses to `FetchError::HttpResponse`.
fn check_status(response: &Response) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    tracing::debug!(status = response.status, "non-success response");
    Err(FetchError::HttpResponse {
        status: response.status,
        headers: response.headers.clone(),
    })
}

fn decode(response: Response, data_type: DataType) -> Result<Payload> {
    match data_type {
        DataType::Json => {
            if response.body.iter().all(u8::is_ascii_whitespace) {
                return Ok(Payload::Json(serde_json::Value::Null));
            }
            response.json().map(Payload::Json)
        }
        DataType::Text => response.text().map(Payload::Text),
        DataType::Bytes => Ok(Payload::Bytes(response.bytes())),
        DataType::Raw => Ok(Payload::Raw(response)),
    }
}
