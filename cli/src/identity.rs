use std::env;

/// Identity used when nothing names the user
pub const GUEST_IDENTITY: &str = "guest";

/// Resolve the identity that owns the conversation.
///
/// Signing a user in and out is the host application's concern; this CLI
/// only needs a stable owner key for the stored conversation. Precedence:
/// `--user` flag, `PROBOT_USER`, the OS `USER`, then guest.
pub fn resolve_identity(flag: Option<String>) -> String {
    non_blank(flag)
        .or_else(|| non_blank(env::var("PROBOT_USER").ok()))
        .or_else(|| non_blank(env::var("USER").ok()))
        .unwrap_or_else(|| GUEST_IDENTITY.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
