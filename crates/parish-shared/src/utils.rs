//! Utility functions

/// Masks a secret for log output, keeping only whether it was set.
pub fn mask_secret(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "********"
    }
}
