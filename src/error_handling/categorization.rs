//! Error categorization.
//!
//! This module maps `reqwest` failures onto [`TransportErrorKind`].

use super::types::TransportErrorKind;

/// Categorizes a `reqwest::Error` into a `TransportErrorKind`.
///
/// Status errors never reach this function in practice: the transport hands
/// non-2xx responses back as ordinary responses. They fall into `Other`.
///
/// # Arguments
///
/// * `error` - The `reqwest::Error` to categorize
///
/// # Returns
///
/// The appropriate `TransportErrorKind` for the error.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> TransportErrorKind {
    if error.is_builder() {
        TransportErrorKind::Builder
    } else if error.is_redirect() {
        TransportErrorKind::Redirect
    } else if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_request() {
        TransportErrorKind::Request
    } else if error.is_body() {
        TransportErrorKind::Body
    } else if error.is_decode() {
        TransportErrorKind::Decode
    } else {
        TransportErrorKind::Other
    }
}
