//! API constants

/// Path the database webhook is pointed at when the service is not mounted at `/`
pub const STORAGE_HOOK_PATH: &str = "/hooks/storage";

/// Notifications carry a single row; anything larger is not a webhook payload
pub const MAX_WEBHOOK_BODY_BYTES: usize = 1024 * 1024;

/// Headers the hosted backend's clients send on cross-origin invocations
pub const CORS_ALLOWED_HEADERS: [&str; 4] = ["authorization", "x-client-info", "apikey", "content-type"];

/// Timeout for each readiness dependency check
pub const READINESS_TIMEOUT_SECS: u64 = 5;
