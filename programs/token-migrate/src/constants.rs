/// Seed for the migration authority PDA: ["authority", state]
pub const AUTHORITY_SEED: &[u8] = b"authority";

/// Seed for a migrator's record PDA: ["record", state, migrator]
pub const RECORD_SEED: &[u8] = b"record";

/// Maximum accounts held by a single role
pub const MAX_ROLE_MEMBERS: usize = 16;

/// Marker prefixed to every event log line
pub const EVENT_LOG_MARKER: &str = "TOKEN_MIGRATE_EVENT";
