//! Thin REST clients for the two fulfillment vendors.
//!
//! Each client translates a small set of vendor endpoints into typed
//! responses. A single attempt is made per call; the only resilience lives
//! in the Printful comprehensive fetch, which falls back to a simpler
//! endpoint chain with reduced fidelity when the rich one fails.

pub mod printful;
pub mod printify;

pub use printful::PrintfulClient;
pub use printify::PrintifyClient;

use thiserror::Error;

/// Failure of a vendor API call.
///
/// Callers at the service boundary treat these as non-fatal and degrade to
/// empty or partial results instead of failing the whole operation.
#[derive(Debug, Error)]
pub enum VendorError {
    /// Non-2xx response from the vendor
    #[error("{vendor} API error: status {status}: {message}")]
    Api {
        vendor: &'static str,
        status: u16,
        message: String,
    },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("{vendor} request failed: {source}")]
    Transport {
        vendor: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// 2xx response whose body did not match any accepted shape
    #[error("{vendor} returned an unexpected payload: {detail}")]
    Decode {
        vendor: &'static str,
        detail: String,
    },
}

impl VendorError {
    pub fn vendor(&self) -> &'static str {
        match self {
            VendorError::Api { vendor, .. }
            | VendorError::Transport { vendor, .. }
            | VendorError::Decode { vendor, .. } => vendor,
        }
    }
}
