//! Integration tests for the harvester
//!
//! These tests use wiremock to serve fake storefronts and run complete jobs
//! end-to-end through the HTTP engine and a SQLite job store.

mod common;
mod fallback_tests;
mod job_tests;
mod registry_tests;
