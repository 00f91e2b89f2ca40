//! Host name syntax checks.
//!
//! Shared by the address decoder, which falls back to the unspecified
//! address for text that is not a host name, and by resolvers, which reject
//! such names before doing any work.
//!
//! Names are parsed with hickory's [`Name`], which applies IDNA mapping and
//! the wire-format length limits. The label rules below are checked on the
//! parsed ASCII form.

use hickory_resolver::proto::rr::Name;

/// Checks `domain` for host name syntax, returning the reason it is invalid.
///
/// Accepts letters (including non-ASCII letters for IDNs), digits, `-` and
/// `_`. Labels may not be empty or start/end with `-`. A single trailing dot
/// (fully qualified form) is allowed.
pub fn validate_domain(domain: &str) -> Result<(), String> {
    let relative = domain.strip_suffix('.').unwrap_or(domain);
    if relative.is_empty() {
        return Err("empty domain".to_string());
    }
    if relative.split('.').any(str::is_empty) {
        return Err("empty label".to_string());
    }

    let name = Name::from_utf8(domain).map_err(|e| e.to_string())?;

    for label in name.iter() {
        if label.starts_with(b"-") || label.ends_with(b"-") {
            return Err("label starts or ends with a hyphen".to_string());
        }
        if !label
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_')
        {
            return Err("invalid character".to_string());
        }
    }

    Ok(())
}

/// Returns true if `domain` is a syntactically valid host name.
#[inline]
pub fn is_valid_domain(domain: &str) -> bool {
    validate_domain(domain).is_ok()
}
