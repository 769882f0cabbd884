/// Canonical form of a label or profile key: lowercase, with everything but
/// letters and digits removed. "Email Address*" and "email_address" both
/// become `emailaddress`. Applying it twice changes nothing.
pub fn normalize_label(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Trim a rendered label for display: drop required-asterisks and collapse
/// runs of whitespace.
pub fn clean_label(raw: &str) -> String {
    raw.replace('*', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
