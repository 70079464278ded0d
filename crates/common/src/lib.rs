//! Common types shared by the Google Ads client crates

mod customer_id;
mod error;
mod secret;

pub use customer_id::format_customer_id;
pub use error::{Error, Result};
pub use secret::Secret;
