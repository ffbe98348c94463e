//! Invoice parsing on top of the job protocol.

mod service;

pub use service::{InvoiceParserService, PARSE_INVOICE_ENDPOINT};
