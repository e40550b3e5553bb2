/// Canonical form of an email address for storage and lookup.
/// Prevents `A@x.com` and `a@x.com` from registering as two accounts.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
