//! Job submission.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::models::config::ClientConfig;
use crate::models::job::JobHandle;
use crate::transport::{ApiRequest, FileUpload, RequestBody, Transport};

use super::status::parse_status_url;

/// Sends the initial request for a job and returns its handle.
///
/// Exactly one request per call. Nothing is retried here.
pub struct JobSubmitter<'a, T> {
    config: &'a ClientConfig,
    transport: &'a T,
}

impl<'a, T: Transport> JobSubmitter<'a, T> {
    pub fn new(config: &'a ClientConfig, transport: &'a T) -> Self {
        Self { config, transport }
    }

    /// Submit a job to `endpoint`.
    ///
    /// With a file, the request is multipart and `params` become text
    /// fields. Without one, `params` are sent as a JSON object. The file is
    /// read before anything goes over the wire.
    pub async fn submit(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        file: Option<&Path>,
    ) -> Result<JobHandle> {
        if endpoint.trim_matches('/').trim().is_empty() {
            return Err(ClientError::Config("endpoint path must not be empty".to_string()));
        }

        let body = match file {
            Some(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!("Read {} bytes from {}", bytes.len(), path.display());

                RequestBody::Multipart {
                    fields: params
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                    file: FileUpload::from_path(path, bytes),
                }
            }
            None => RequestBody::Json(serde_json::Value::Object(
                params
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                    .collect(),
            )),
        };

        let url = self.config.endpoint_url(endpoint);
        let response = self.transport.send(ApiRequest::post(&url, body)).await?;

        if !response.is_success() {
            return Err(ClientError::Http {
                status: response.status,
                body: response.body_text(),
            });
        }

        let handle = parse_status_url(&response)?;
        info!("Submitted job to {}, status at {}", url, handle);

        Ok(handle)
    }
}
