//! Recognition of `vault:<key>` references in environment values

use crate::config::SECRET_REFERENCE_PREFIX;

/// Lookup key of a secret reference, or `None` for a literal value
pub fn parse(value: &str) -> Option<&str> {
    value.strip_prefix(SECRET_REFERENCE_PREFIX)
}

/// Whether a value must be resolved from Vault at container start
pub fn is_reference(value: &str) -> bool {
    parse(value).is_some()
}
