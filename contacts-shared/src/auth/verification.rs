/// Email verification tokens and links

use uuid::Uuid;

/// Path under which verification links are served
pub const VERIFY_PATH: &str = "/api/auth/verify";

/// Generates a fresh single-use verification token
pub fn generate_verification_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Builds the link a user follows to confirm their address
///
/// A trailing slash on `base_url` is ignored.
pub fn verification_link(base_url: &str, token: &str) -> String {
    format!("{}{}/{}", base_url.trim_end_matches('/'), VERIFY_PATH, token)
}
