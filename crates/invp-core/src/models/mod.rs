//! Data models for configuration and jobs.

pub mod config;
pub mod job;
