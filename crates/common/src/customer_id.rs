//! Customer ID normalization
//!
//! Google Ads customer IDs are displayed as `123-456-7890` but the API
//! expects ten bare digits in URL paths and in the `login-customer-id`
//! header.

/// Width of a normalized customer ID.
const CUSTOMER_ID_DIGITS: usize = 10;

/// Normalize a customer ID to exactly the digit characters of the input,
/// left-padded with zeros to ten digits.
///
/// Quotes, dashes and any other non-digit noise are dropped. Inputs with more
/// than ten digits are returned unpadded and untruncated.
pub fn format_customer_id(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{digits:0>width$}", width = CUSTOMER_ID_DIGITS)
}
