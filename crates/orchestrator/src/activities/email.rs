//! Recipient email normalization.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .unwrap_or_else(|e| panic!("invalid email pattern: {e}"))
});

/// Returns true if the address matches the `local@domain.tld` pattern.
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_PATTERN.is_match(email)
}

/// Normalizes a recipient address: a syntactically valid address
/// passes through, anything else (empty included) is replaced by the
/// configured fallback address.
///
/// Both activity adapters apply this same rule, so invalid input never
/// fails a charge or a notification send.
pub fn normalize_email(email: &str, fallback: &str) -> String {
    if is_valid_email(email) {
        email.to_string()
    } else {
        tracing::info!(rejected = email, "substituting fallback recipient email");
        fallback.to_string()
    }
}
