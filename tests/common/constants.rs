//! Shared constants for end-to-end tests

// ============================================================================
// Test Auth Material
// ============================================================================

/// Shared secret the test servers validate client tokens against
pub const TEST_CLIENT_TOKEN_SECRET: &str = "e2e-test-secret";

/// Bearer token the stub userinfo endpoint accepts
pub const TEST_OAUTH_TOKEN: &str = "good-oauth-token";

/// Email returned by the stub userinfo endpoint
pub const TEST_OAUTH_EMAIL: &str = "user@example.com";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Per-call child round-trip timeout used by test servers (seconds)
pub const CHILD_CALL_TIMEOUT_SECS: u64 = 10;
