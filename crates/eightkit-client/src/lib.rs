//! HTTP access to the 8kit API
//!
//! - `transport`: the [`HttpTransport`] seam and its reqwest implementation
//! - `credentials`: where host URL and API key come from
//! - `client`: [`ApiClient`], timeout + bounded retry + error classification
//! - `existence`: "does this set/lookup exist" and auto-create
//! - `testing`: scripted [`testing::MockTransport`] (feature `testing`)

pub mod client;
pub mod credentials;
pub mod existence;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{ApiClient, API_KEY_HEADER};
pub use credentials::CredentialProvider;
pub use existence::Provisioned;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
