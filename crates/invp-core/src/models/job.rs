//! Asynchronous job data model.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Opaque reference to a pending job, as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    /// Wrap a status URL. Returns `None` for a blank string.
    pub fn new(status_url: impl Into<String>) -> Option<Self> {
        let status_url = status_url.into();
        if status_url.trim().is_empty() {
            None
        } else {
            Some(Self(status_url.trim().to_string()))
        }
    }

    /// The status URL to poll.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job state as reported by a status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

impl JobStatus {
    /// Parse a status string, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "success" => Some(JobStatus::Success),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Whether no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result data of a successful job, kept exactly as the service sent it.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ResultPayload(Box<RawValue>);

impl ResultPayload {
    pub(crate) fn new(raw: Box<RawValue>) -> Self {
        Self(raw)
    }

    /// JSON `null`, for a successful job that carried no result.
    pub(crate) fn null() -> Self {
        Self(RawValue::NULL.to_owned())
    }

    /// The JSON text exactly as received.
    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    /// Consume the payload, returning its JSON text.
    pub fn into_string(self) -> String {
        self.0.get().to_string()
    }

    /// Deserialize the payload into a caller-chosen type.
    pub fn deserialize<'a, T: Deserialize<'a>>(&'a self) -> serde_json::Result<T> {
        serde_json::from_str(self.0.get())
    }
}

impl PartialEq for ResultPayload {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// A finished job and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    /// Job identifier, if the service reported one.
    pub id: Option<String>,
    /// Job type, if the service reported one.
    pub job_type: Option<String>,
    /// Always [`JobStatus::Success`] for a returned result.
    pub status: JobStatus,
    /// The result data.
    pub payload: ResultPayload,
}
