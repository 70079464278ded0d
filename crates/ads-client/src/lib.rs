//! Google Ads API query and report client
//!
//! [`AdsClient`] signs each request through a [`RequestSigner`] (OAuth or
//! service-account bearer token, developer token, optional manager account)
//! and talks to the REST surface of the API: `googleAds:search`,
//! `googleAds:mutate` and plain resource GETs. Responses come back as nested
//! JSON rows; [`flatten`] turns them into dot-path records for JSON, CSV or
//! table output, and [`reports`] wraps common GAQL queries in typed records.

pub mod config;
pub mod error;
pub mod executor;
pub mod flatten;
pub mod reports;
pub mod signer;

#[cfg(test)]
mod test_support;

pub use config::{ApiConfig, ClientConfig};
pub use error::{Error, Result};
pub use executor::{AdsClient, QueryResult, Row};
pub use flatten::{FlattenedField, OutputFormat, Rendered};
pub use signer::RequestSigner;
