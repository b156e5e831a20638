//! HTTP header name constants.
//!
//! The chain only ever forces two headers onto outgoing requests; everything
//! else comes from the caller.

use reqwest::header::{HeaderName, CONTENT_TYPE, USER_AGENT};

/// Identity header, always applied last so it wins over caller headers.
pub const HEADER_IDENTITY: HeaderName = USER_AGENT;

/// Content type header, forced to form-url-encoded on POST steps.
pub const HEADER_CONTENT_TYPE: HeaderName = CONTENT_TYPE;
