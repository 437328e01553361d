//! Fake spine configuration.

use std::env;

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8443";

/// Fake spine server configuration.
#[derive(Clone, Debug)]
pub struct FakeSpineConfig {
    /// Socket address to listen on.
    pub bind_address: String,
}

impl Default for FakeSpineConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

impl FakeSpineConfig {
    /// Read `FAKE_SPINE_BIND_ADDRESS`, falling back to [`DEFAULT_BIND_ADDRESS`].
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var("FAKE_SPINE_BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
        }
    }
}
