/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the registration password policy
/// - [`jwt`]: access-token signing/validation and refresh-token generation
/// - [`middleware`]: bearer-token extraction and the per-request [`middleware::AuthContext`]
/// - [`authorization`]: owner/admin checks
///
/// # Example
///
/// ```no_run
/// use taskmanager_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("S3cret!pass")?;
/// assert!(verify_password("S3cret!pass", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
