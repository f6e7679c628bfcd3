// Centralized Protocol Constants

// Tiers & Rewards
// ===============

/// Number of box tiers (`BoxTier::Free` .. `BoxTier::Gold`).
pub const TIER_COUNT: usize = 4;

/// Upper bound on distinct tokens credited by a single open.
/// Also bounds `UserProfile::last_reward`.
pub const MAX_REWARD_COUNT: u8 = 10;

/// Upper bound on the eligible reward token set.
pub const MAX_REWARD_MINTS: usize = 100;

/// Token range overrides accepted by one `set_token_ranges` call.
pub const MAX_RANGE_BATCH: usize = 16;

/// Reward balances settled by one `claim_all` call.
/// Each entry costs four accounts (balance, reward vault record, vault, destination).
pub const MAX_CLAIM_BATCH: usize = 8;

// Admission Control
// =================

/// Minimum time between two free opens, per wallet and per identity.
pub const COOLDOWN_SECONDS: i64 = 24 * 60 * 60;

/// Maximum length (bytes) of an external identity string.
pub const MAX_IDENTITY_LEN: usize = 64;

// Randomness Defaults
// ===================

/// Confirmations the oracle should wait for before answering.
pub const DEFAULT_MIN_CONFIRMATIONS: u16 = 3;

/// Compute budget the oracle should attach to `fulfill_randomness`.
pub const DEFAULT_CALLBACK_COMPUTE_LIMIT: u32 = 400_000;

/// The engine only ever consumes a single random word per request.
pub const RANDOM_WORDS_PER_REQUEST: u32 = 1;

/// Initial version for account structures.
pub const INITIAL_VERSION: u16 = 1;

/// First request id handed out after initialization.
pub const INITIAL_REQUEST_ID: u64 = 1;
