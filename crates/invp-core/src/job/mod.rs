//! Asynchronous job protocol: submit, then poll until done.

mod poller;
pub mod status;
mod submitter;

#[cfg(test)]
pub(crate) mod testing;

pub use poller::{JobPoller, NO_DIAGNOSTIC};
pub use submitter::JobSubmitter;
