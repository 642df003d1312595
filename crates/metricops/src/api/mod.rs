//! Access to the management REST API.
//!
//! Everything above this module talks to [`Client`] and the
//! [`ResourceApi`] capabilities it hands out. The wire is behind the
//! [`Transport`] trait; [`HttpTransport`] is the production implementation.

pub mod client;
pub mod error;
pub mod http;
pub mod pagination;
pub mod resource;
pub mod transport;

pub use client::Client;
pub use error::{parse_field_errors, ApiError, FieldError};
pub use http::{
    ClientConfig, HttpTransport, DEFAULT_API_URL, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT,
};
pub use pagination::{Keyset, Offset, Page, Pagination, Unpaged};
pub use resource::ResourceApi;
pub use transport::{ApiRequest, Method, Query, Transport};
