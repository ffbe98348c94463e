//! reqwest-backed transport.

use std::time::Duration;

use reqwest::header::{ACCEPT, LOCATION, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::error::Result;
use crate::models::config::ClientConfig;

use super::{ApiRequest, ApiResponse, Method, RequestBody, Transport};

/// Transport that talks to the real service over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_key: String,
}

impl HttpTransport {
    /// Build a transport from a validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key().to_string(),
        })
    }

    fn build(&self, request: ApiRequest) -> Result<reqwest::RequestBuilder> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        }
        .bearer_auth(&self.api_key)
        .header(ACCEPT, "application/json");

        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { fields, file } => {
                let part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(file.mime_type)?;

                let form = fields
                    .into_iter()
                    .fold(Form::new(), |form, (name, value)| form.text(name, value))
                    .part("file", part);

                builder.multipart(form)
            }
        };

        Ok(builder)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!("{:?} {}", request.method, request.url);

        let response = self.build(request)?.send().await?;

        let status = response.status().as_u16();
        let headers = response.headers();
        let location = headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response.bytes().await?.to_vec();

        debug!("HTTP {} ({} bytes)", status, body.len());

        Ok(ApiResponse {
            status,
            location,
            retry_after,
            body,
        })
    }
}
