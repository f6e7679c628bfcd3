// Audit trail. Field order is part of the wire format (Borsh); append only.

use anchor_lang::prelude::*;

use crate::state::{BoxTier, RewardEntry};

#[event]
pub struct ConfigInitialized {
    pub owner: Pubkey,
    pub domain_id: u64,
    pub treasury_sol: Pubkey,
}

#[event]
pub struct TierConfigUpdated {
    pub tier: BoxTier,
    pub min_amount: u64,
    pub max_amount: u64,
    pub reward_count: u8,
    pub enabled: bool,
}

#[event]
pub struct PriceUpdated {
    pub tier: BoxTier,
    pub old_price: u64,
    pub new_price: u64,
}

#[event]
pub struct TokenRangeUpdated {
    pub tier: BoxTier,
    pub mint: Pubkey,
    pub min_amount: u64,
    pub max_amount: u64,
    pub enabled: bool,
}

#[event]
pub struct RewardMintsUpdated {
    pub mints: Vec<Pubkey>,
}

#[event]
pub struct BoxOpened {
    pub request_id: u64,
    pub user: Pubkey,
    pub tier: BoxTier,
    pub price: u64,
    pub refund: u64,
}

/// Outbound request to the randomness provider.
#[event]
pub struct RandomnessRequested {
    pub request_id: u64,
    pub provider: Pubkey,
    pub key_hash: [u8; 32],
    pub min_confirmations: u16,
    pub callback_compute_limit: u32,
    pub num_words: u32,
}

#[event]
pub struct RewardQueued {
    pub request_id: u64,
    pub user: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
}

#[event]
pub struct RequestFulfilled {
    pub request_id: u64,
    pub user: Pubkey,
    pub tier: BoxTier,
    pub reward_count: u8,
}

#[event]
pub struct RewardClaimed {
    pub user: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
}

#[event]
pub struct ClaimAllSettled {
    pub user: Pubkey,
    pub claimed: Vec<RewardEntry>,
    pub failed: Vec<Pubkey>,
}

#[event]
pub struct OwnershipTransferStarted {
    pub previous_owner: Pubkey,
    pub new_owner: Pubkey,
}

#[event]
pub struct OwnershipTransferred {
    pub previous_owner: Pubkey,
    pub new_owner: Pubkey,
}

#[event]
pub struct Paused {
    pub by: Pubkey,
}

#[event]
pub struct Unpaused {
    pub by: Pubkey,
}

#[event]
pub struct SignerUpdated {
    pub old_signer: Pubkey,
    pub new_signer: Pubkey,
}

#[event]
pub struct OracleConfigUpdated {
    pub oracle: Pubkey,
    pub key_hash: [u8; 32],
    pub min_confirmations: u16,
    pub callback_compute_limit: u32,
}

#[event]
pub struct PendingCancelled {
    pub request_id: u64,
    pub user: Pubkey,
}

/// `mint == Pubkey::default()` means native lamports.
#[event]
pub struct EmergencyWithdrawal {
    pub mint: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
    pub total_withdrawn: u64,
}

#[event]
pub struct RewardVaultInitialized {
    pub mint: Pubkey,
    pub vault: Pubkey,
}

#[event]
pub struct VaultFunded {
    pub mint: Pubkey,
    pub funder: Pubkey,
    pub amount: u64,
}
