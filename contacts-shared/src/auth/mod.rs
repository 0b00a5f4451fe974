/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: bcrypt password hashing
/// - [`jwt`]: session token issuance and verification
/// - [`middleware`]: the bearer-token guard producing an [`middleware::AuthContext`]
/// - [`verification`]: email verification tokens and links

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod verification;
