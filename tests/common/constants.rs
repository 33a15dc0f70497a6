//! Shared constants for end-to-end tests
//!
//! When the test data changes, update only this file.

// ============================================================================
// Test Users
// ============================================================================

/// Regular test user, likes Abbey Road
pub const TEST_USER_EMAIL: &str = "testuser@example.com";
pub const TEST_USER_NAME: &str = "Test User";
pub const TEST_PASS: &str = "testpass123";

/// Second user, likes nothing
pub const OTHER_USER_EMAIL: &str = "other@example.com";
pub const OTHER_PASS: &str = "otherpass123";

// ============================================================================
// Seeded Catalog
// ============================================================================

/// Ids follow the seeding order of the default albums.
pub const ABBEY_ROAD_ID: i64 = 1;
pub const THRILLER_ID: i64 = 2;
pub const DARK_SIDE_ID: i64 = 3;
pub const BACK_TO_BLACK_ID: i64 = 4;
pub const RUMOURS_ID: i64 = 5;
pub const READY_TO_DIE_ID: i64 = 6;
pub const CONFESSIONS_ID: i64 = 7;

pub const SEEDED_ALBUMS_COUNT: usize = 7;

/// Album id that is never seeded
pub const MISSING_ALBUM_ID: i64 = 999;

// ============================================================================
// Metadata Provider
// ============================================================================

/// The only album the fake metadata provider knows about
pub const LOOKUP_ARTIST: &str = "Radiohead";
pub const LOOKUP_TITLE: &str = "OK Computer";
pub const LOOKUP_TRACKS_COUNT: usize = 3;

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
