use anchor_lang::prelude::*;

#[error_code]
pub enum LootboxError {
    #[msg("Unauthorized")]
    Unauthorized,
    #[msg("Protocol paused")]
    Paused,
    #[msg("Reentrant call")]
    Reentrancy,
    #[msg("Caller is not the pending owner")]
    NotPendingOwner,

    // -----------------
    // Configuration
    // -----------------
    #[msg("Invalid range (max must be >= min, tier min must be > 0)")]
    InvalidRange,
    #[msg("Invalid reward count")]
    InvalidRewardCount,
    #[msg("Reward token cannot be the default pubkey")]
    ZeroToken,
    #[msg("Too many reward mints")]
    TooManyRewardMints,
    #[msg("Free tier price must be zero")]
    InvalidPrice,
    #[msg("Invalid tier")]
    InvalidTier,
    #[msg("Too many entries")]
    TooManyEntries,

    // -----------------
    // Open / admission
    // -----------------
    #[msg("Tier disabled")]
    TierDisabled,
    #[msg("No reward tokens configured")]
    NoRewardTokens,
    #[msg("Insufficient payment")]
    InsufficientPayment,
    #[msg("Free tier requires a signed authorization")]
    FreeTierRequiresAuthorization,
    #[msg("Signer not set")]
    SignerNotSet,
    #[msg("Oracle not set")]
    OracleNotSet,
    #[msg("Nonce already used")]
    NonceAlreadyUsed,
    #[msg("Cooldown active")]
    CooldownActive,
    #[msg("Invalid identity")]
    InvalidIdentity,

    #[msg("Missing or invalid ed25519 verify instruction")]
    MissingOrInvalidEd25519Ix,
    #[msg("Ed25519 signer mismatch")]
    SignerMismatch,
    #[msg("Ed25519 message mismatch")]
    MessageMismatch,

    // -----------------
    // Randomness
    // -----------------
    #[msg("Caller is not the provider captured for this request")]
    NotProvider,
    #[msg("Random words must not be empty")]
    EmptyRandomWords,
    #[msg("Request id mismatch")]
    RequestIdMismatch,
    #[msg("Pending count underflow")]
    PendingCountUnderflow,
    #[msg("Oracle config is locked while requests are pending")]
    PendingRequestsOutstanding,

    // -----------------
    // Ledger / claims
    // -----------------
    #[msg("Nothing to claim")]
    NothingToClaim,
    #[msg("No rewards claimed")]
    NoRewardsClaimed,
    #[msg("Insufficient vault funds")]
    InsufficientVaultFunds,
    #[msg("Account does not match the expected PDA")]
    AccountMismatch,
    #[msg("Failed to borrow account data")]
    AccountBorrowFailed,
    #[msg("Invalid amount")]
    InvalidAmount,

    #[msg("Math overflow")]
    MathOverflow,
}
