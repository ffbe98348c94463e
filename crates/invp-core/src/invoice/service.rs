//! Invoice parser service.

use std::future::Future;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::job::{JobPoller, JobSubmitter};
use crate::models::config::ClientConfig;
use crate::models::job::{JobHandle, JobResult};
use crate::transport::{HttpTransport, Transport};

/// Endpoint that accepts invoice files.
pub const PARSE_INVOICE_ENDPOINT: &str = "/finance/parse_invoice";

/// Parses invoice files (PDF/TIFF/JPG/PNG) through the remote service.
///
/// Each call is an independent submit-then-wait; the service holds only its
/// configuration and transport.
pub struct InvoiceParserService<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
}

impl InvoiceParserService<HttpTransport> {
    /// Create a service that talks HTTP.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

impl<T: Transport> InvoiceParserService<T> {
    /// Create a service on top of a custom transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Parse an invoice and return the result JSON exactly as the service sent it.
    #[tracing::instrument(skip(self), fields(file = %file_path.display()))]
    pub async fn parse_invoice(&self, file_path: &Path) -> Result<String> {
        let job = self.parse_invoice_job(file_path).await?;
        Ok(job.payload.into_string())
    }

    /// Parse an invoice, keeping the job metadata.
    pub async fn parse_invoice_job(&self, file_path: &Path) -> Result<JobResult> {
        self.parse_invoice_until(file_path, std::future::pending()).await
    }

    /// Parse an invoice, giving up when `cancel` resolves.
    pub async fn parse_invoice_until<C>(&self, file_path: &Path, cancel: C) -> Result<JobResult>
    where
        C: Future<Output = ()>,
    {
        let handle = self.submit_invoice(file_path).await?;
        let job = self.fetch_results_until(&handle, cancel).await?;
        info!("Parsed {}", file_path.display());
        Ok(job)
    }

    /// Upload an invoice and return the job handle without waiting.
    pub async fn submit_invoice(&self, file_path: &Path) -> Result<JobHandle> {
        JobSubmitter::new(&self.config, &self.transport)
            .submit(PARSE_INVOICE_ENDPOINT, &[], Some(file_path))
            .await
    }

    /// Wait for a previously submitted job.
    pub async fn fetch_results(&self, handle: &JobHandle) -> Result<JobResult> {
        self.fetch_results_until(handle, std::future::pending()).await
    }

    /// Wait for a previously submitted job, giving up when `cancel` resolves.
    pub async fn fetch_results_until<C>(&self, handle: &JobHandle, cancel: C) -> Result<JobResult>
    where
        C: Future<Output = ()>,
    {
        JobPoller::new(&self.config, &self.transport)
            .await_completion_until(handle, cancel)
            .await
    }
}
