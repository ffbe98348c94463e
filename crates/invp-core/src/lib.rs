//! Core library for the invoice parsing API.
//!
//! This crate provides:
//! - Typed client configuration with fail-fast validation
//! - Job submission (multipart upload or JSON) returning a status handle
//! - Bounded, cancellable polling of that handle until the job finishes
//! - An invoice parser service composing the two
//!
//! ```no_run
//! use std::path::Path;
//! use invp_core::{ClientConfig, InvoiceParserService};
//!
//! # async fn example() -> invp_core::Result<()> {
//! let config = ClientConfig::builder("your-api-key").build()?;
//! let service = InvoiceParserService::new(config)?;
//! let json = service.parse_invoice(Path::new("invoice.pdf")).await?;
//! println!("{}", json);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod invoice;
pub mod job;
pub mod models;
pub mod transport;

pub use error::{ClientError, Result};
pub use invoice::{InvoiceParserService, PARSE_INVOICE_ENDPOINT};
pub use job::{JobPoller, JobSubmitter};
pub use models::config::{ClientConfig, ClientConfigBuilder, MaxWait, Settings};
pub use models::job::{JobHandle, JobResult, JobStatus, ResultPayload};
pub use transport::{HttpTransport, Transport};
