use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = campus_common::id::prefixed_ulid("msg");
/// assert!(id.starts_with("msg_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const USER: &str = "usr";
    pub const GROUP: &str = "grp";
    pub const MESSAGE: &str = "msg";
    pub const POST: &str = "pst";
    pub const EVENT: &str = "evt";
    pub const ANNOUNCEMENT: &str = "ann";
    pub const NOTIFICATION: &str = "ntf";
    pub const CONNECTION: &str = "gw";
}
