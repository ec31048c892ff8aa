//! Endpoint and environment configuration shared by the library and the CLI.

/// The public Wayback Availability JSON API endpoint.
pub static DEFAULT_ENDPOINT: &str = "http://archive.org/wayback/available";

pub static ENDPOINT_ENV_VAR: &str = "WAYBACK_ENDPOINT";
pub static TIMEOUT_ENV_VAR: &str = "WAYBACK_TIMEOUT";
