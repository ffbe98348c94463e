//! Parsing of submission and status responses.
//!
//! Status bodies arrive either wrapped in a JSON:API envelope
//! (`{"data": {"id", "type", "attributes": {"status", "type", "result"}}}`)
//! or flat (`{"status", "result"}`). Both are accepted.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use serde_json::value::RawValue;

use crate::error::{ClientError, Result};
use crate::models::job::{JobHandle, JobStatus};
use crate::transport::ApiResponse;

/// Extract the job handle from a successful submission response.
///
/// The `status_url` body field wins; the `Location` header is the fallback.
pub fn parse_status_url(response: &ApiResponse) -> Result<JobHandle> {
    let from_body = serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|v| v.get("status_url").and_then(Value::as_str).map(str::to_string))
        .and_then(JobHandle::new);

    from_body
        .or_else(|| response.location.clone().and_then(JobHandle::new))
        .ok_or_else(|| {
            ClientError::Protocol(format!(
                "submission response has no status_url (HTTP {}): {}",
                response.status,
                truncate(&response.body_text(), 200)
            ))
        })
}

/// One decoded status poll.
#[derive(Debug)]
pub struct StatusReport {
    pub status: JobStatus,
    pub id: Option<String>,
    pub job_type: Option<String>,
    pub result: Option<Box<RawValue>>,
    pub diagnostic: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<EnvelopeData>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result: Option<Box<RawValue>>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

#[derive(Deserialize)]
struct EnvelopeData {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    attributes: Option<Attributes>,
}

#[derive(Deserialize)]
struct Attributes {
    status: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    job_type: Option<String>,
    result: Option<Box<RawValue>>,
    error: Option<Value>,
    message: Option<Value>,
}

/// Metadata fields never decide whether a body is usable: `"id": 77` reads
/// as `"77"` and anything null reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Decode a status body. `Err` carries the reason the body was unusable.
pub fn parse_status(body: &[u8]) -> std::result::Result<StatusReport, String> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| format!("invalid JSON: {}", e))?;

    let (id, attributes) = match envelope.data {
        Some(EnvelopeData { id, attributes: Some(attributes) }) => (id, attributes),
        Some(EnvelopeData { id, attributes: None }) => (
            id,
            Attributes {
                status: envelope.status,
                job_type: None,
                result: envelope.result,
                error: envelope.error,
                message: envelope.message,
            },
        ),
        None => (
            None,
            Attributes {
                status: envelope.status,
                job_type: None,
                result: envelope.result,
                error: envelope.error,
                message: envelope.message,
            },
        ),
    };

    let raw_status = attributes.status.ok_or_else(|| "missing status field".to_string())?;
    let status =
        JobStatus::parse(&raw_status).ok_or_else(|| format!("unknown status {:?}", raw_status))?;

    let diagnostic = if status == JobStatus::Failed {
        diagnostic_from(
            attributes.error.as_ref(),
            attributes.message.as_ref(),
            attributes.result.as_deref(),
        )
    } else {
        None
    };

    Ok(StatusReport {
        status,
        id,
        job_type: attributes.job_type,
        result: attributes.result,
        diagnostic,
    })
}

fn diagnostic_from(
    error: Option<&Value>,
    message: Option<&Value>,
    result: Option<&RawValue>,
) -> Option<String> {
    let text = |v: &Value| match v {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    };

    error
        .and_then(text)
        .or_else(|| message.and_then(text))
        .or_else(|| {
            result
                .and_then(|raw| serde_json::from_str::<Value>(raw.get()).ok())
                .and_then(|v| v.as_str().filter(|s| !s.trim().is_empty()).map(str::to_string))
        })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(body: &str, location: Option<&str>) -> ApiResponse {
        ApiResponse {
            status: 202,
            location: location.map(str::to_string),
            retry_after: None,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_status_url_from_body() {
        let handle = parse_status_url(&response(
            r#"{"status_url": "https://sharpapi.com/api/v1/job/status/abc", "job_id": "abc"}"#,
            None,
        ))
        .unwrap();
        assert_eq!(handle.as_str(), "https://sharpapi.com/api/v1/job/status/abc");
    }

    #[test]
    fn test_status_url_prefers_body_over_location() {
        let handle = parse_status_url(&response(
            r#"{"status_url": "https://a/job/1"}"#,
            Some("https://b/job/1"),
        ))
        .unwrap();
        assert_eq!(handle.as_str(), "https://a/job/1");
    }

    #[test]
    fn test_status_url_from_location_header() {
        let handle = parse_status_url(&response("accepted", Some("https://b/job/1"))).unwrap();
        assert_eq!(handle.as_str(), "https://b/job/1");
    }

    #[test]
    fn test_missing_status_url_is_protocol_error() {
        for body in ["", "{}", r#"{"status_url": ""}"#, r#"{"status_url": 12}"#, "<html>"] {
            let err = parse_status_url(&response(body, None)).unwrap_err();
            assert!(matches!(err, ClientError::Protocol(_)), "body {:?}", body);
        }
    }

    #[test]
    fn test_parse_envelope_success() {
        let body = r#"{"data":{"type":"api_job_result","id":"5de4887a","attributes":{"status":"success","type":"finance_parse_invoice","result":{"invoice_number":"FV/1/2024","total":  123.40}}}}"#;
        let report = parse_status(body.as_bytes()).unwrap();

        assert_eq!(report.status, JobStatus::Success);
        assert_eq!(report.id.as_deref(), Some("5de4887a"));
        assert_eq!(report.job_type.as_deref(), Some("finance_parse_invoice"));
        assert_eq!(
            report.result.unwrap().get(),
            r#"{"invoice_number":"FV/1/2024","total":  123.40}"#
        );
    }

    #[test]
    fn test_parse_flat_body() {
        let report = parse_status(br#"{"status":"processing"}"#).unwrap();
        assert_eq!(report.status, JobStatus::Processing);
        assert!(report.result.is_none());
    }

    #[test]
    fn test_failed_diagnostic_sources() {
        let report = parse_status(
            br#"{"data":{"attributes":{"status":"failed","error":"corrupt file"}}}"#,
        )
        .unwrap();
        assert_eq!(report.diagnostic.as_deref(), Some("corrupt file"));

        let report =
            parse_status(br#"{"data":{"attributes":{"status":"failed","message":"too large"}}}"#)
                .unwrap();
        assert_eq!(report.diagnostic.as_deref(), Some("too large"));

        let report =
            parse_status(br#"{"data":{"attributes":{"status":"failed","result":"bad scan"}}}"#)
                .unwrap();
        assert_eq!(report.diagnostic.as_deref(), Some("bad scan"));

        let report = parse_status(br#"{"status":"failed"}"#).unwrap();
        assert_eq!(report.diagnostic, None);
    }

    #[test]
    fn test_metadata_types_do_not_hide_status() {
        let report = parse_status(
            br#"{"data":{"id":77,"attributes":{"status":"success","type":null,"result":{"ok":true}}}}"#,
        )
        .unwrap();
        assert_eq!(report.status, JobStatus::Success);
        assert_eq!(report.id.as_deref(), Some("77"));
        assert_eq!(report.job_type, None);
        assert_eq!(report.result.unwrap().get(), r#"{"ok":true}"#);

        let report =
            parse_status(br#"{"data":{"id":"j1","attributes":{"status":"pending","type":3}}}"#)
                .unwrap();
        assert_eq!(report.status, JobStatus::Pending);
        assert_eq!(report.job_type.as_deref(), Some("3"));
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(parse_status(b"").is_err());
        assert!(parse_status(b"not json").is_err());
        assert!(parse_status(br#"{"data":{"attributes":{}}}"#).is_err());
        assert!(parse_status(br#"{"status":"queued"}"#).is_err());
        assert!(parse_status(br#"{"status":5}"#).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
