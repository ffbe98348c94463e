//! HTTP transport abstraction.
//!
//! The job protocol only needs to send a request and read back the status,
//! a couple of headers and the body. Keeping that behind [`Transport`] lets
//! the submit/poll logic run against an in-memory service in tests.

mod http;

pub use http::HttpTransport;

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// HTTP method used by the job protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A file attached to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// File name sent in the part's content disposition.
    pub file_name: String,
    /// MIME type of the file.
    pub mime_type: &'static str,
    /// File contents, unmodified.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Build an upload from a path and its already-read contents.
    pub fn from_path(path: &Path, bytes: Vec<u8>) -> Self {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();

        Self {
            mime_type: mime_for_path(path),
            file_name,
            bytes,
        }
    }
}

/// Guess a MIME type from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "tif" | "tiff" => "image/tiff",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON document.
    Json(serde_json::Value),
    /// Multipart form with text fields and one file.
    Multipart {
        fields: Vec<(String, String)>,
        file: FileUpload,
    },
}

/// A single outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: RequestBody,
}

impl ApiRequest {
    /// A body-less GET.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: RequestBody::Empty,
        }
    }

    /// A POST with the given body.
    pub fn post(url: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body,
        }
    }
}

/// The parts of a response the job protocol reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Location` header, if present.
    pub location: Option<String>,
    /// `Retry-After` header in seconds, if present and numeric.
    pub retry_after: Option<Duration>,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Whether the status code is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests to the service.
///
/// Implementations inject the credential, the `Accept` header and the user
/// agent. A transport never retries; faults are returned as errors.
pub trait Transport: Send + Sync {
    /// Send one request and return the response, whatever its status.
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse>> + Send;
}
