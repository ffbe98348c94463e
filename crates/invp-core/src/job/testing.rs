//! In-memory transport for protocol tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::Result;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Replays a fixed list of responses and records every request.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<ApiResponse>>>,
    fallback: Option<ApiResponse>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    /// Answer with `script` in order. Running past the end panics.
    pub fn new(script: Vec<Result<ApiResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with `response`.
    pub fn repeating(response: ApiResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None => Ok(self
                .fallback
                .clone()
                .expect("scripted transport ran out of responses")),
        }
    }
}

/// A 200 response with the given body.
pub fn status_body(body: &str) -> ApiResponse {
    ApiResponse {
        status: 200,
        body: body.as_bytes().to_vec(),
        ..ApiResponse::default()
    }
}
