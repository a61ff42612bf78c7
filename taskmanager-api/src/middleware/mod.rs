/// Middleware modules for the API server
///
/// - `security`: OWASP response headers
/// - `request_log`: request IDs, per-request spans and slow-request warnings

pub mod request_log;
pub mod security;
