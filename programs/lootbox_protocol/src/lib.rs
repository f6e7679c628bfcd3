use anchor_lang::prelude::*;

pub mod errors;
pub mod instructions;
pub mod state;
pub mod utils;
pub mod contexts;
pub mod constants;
pub mod events;
pub mod guards;
pub mod selection;

pub use utils::*;
pub use instructions::*;
pub use state::*;
pub use errors::*;
pub use contexts::*;
pub use constants::*;

declare_id!("96hDQhM8gmoPG4qQkQjsCEHuERYtfjQGp6gPSUUMLoXn");

#[program]
pub mod lootbox_protocol {
    use super::*;
    use crate::instructions::{admin, claim, config, fulfill, open, vault, views};

    // ----------------------------
    // Setup
    // ----------------------------
    pub fn initialize_config(ctx: Context<InitializeConfig>, domain_id: u64) -> Result<()> {
        admin::initialize_config(ctx, domain_id)
    }

    pub fn init_reward_vault(ctx: Context<InitRewardVault>) -> Result<()> {
        vault::init_reward_vault(ctx)
    }

    pub fn fund_reward_vault(ctx: Context<FundRewardVault>, amount: u64) -> Result<()> {
        vault::fund_reward_vault(ctx, amount)
    }

    // ----------------------------
    // Open / fulfill
    // ----------------------------
    pub fn open_box(ctx: Context<OpenBox>, tier: BoxTier, payment: u64) -> Result<u64> {
        open::open_box(ctx, tier, payment)
    }

    pub fn open_free_box(
        ctx: Context<OpenFreeBox>,
        identity: String,
        identity_key: [u8; 32],
        nonce: u64,
    ) -> Result<u64> {
        open::open_free_box(ctx, identity, identity_key, nonce)
    }

    pub fn fulfill_randomness<'info>(
        ctx: Context<'_, '_, 'info, 'info, FulfillRandomness<'info>>,
        request_id: u64,
        random_words: Vec<[u8; 32]>,
    ) -> Result<()> {
        fulfill::fulfill_randomness(ctx, request_id, random_words)
    }

    // ----------------------------
    // Claims
    // ----------------------------
    pub fn claim(ctx: Context<Claim>) -> Result<()> {
        claim::claim(ctx)
    }

    pub fn claim_all<'info>(ctx: Context<'_, '_, 'info, 'info, ClaimAll<'info>>) -> Result<()> {
        claim::claim_all(ctx)
    }

    // ----------------------------
    // Configuration (owner)
    // ----------------------------
    pub fn set_tier_config(
        ctx: Context<AdminAction>,
        tier: BoxTier,
        min_amount: u64,
        max_amount: u64,
        reward_count: u8,
        enabled: bool,
    ) -> Result<()> {
        config::set_tier_config(ctx, tier, min_amount, max_amount, reward_count, enabled)
    }

    pub fn set_price(ctx: Context<AdminAction>, tier: BoxTier, price: u64) -> Result<()> {
        config::set_price(ctx, tier, price)
    }

    pub fn set_token_range(
        ctx: Context<SetTokenRange>,
        tier: BoxTier,
        mint: Pubkey,
        min_amount: u64,
        max_amount: u64,
        enabled: bool,
    ) -> Result<()> {
        config::set_token_range(ctx, tier, mint, min_amount, max_amount, enabled)
    }

    pub fn set_token_ranges<'info>(
        ctx: Context<'_, '_, 'info, 'info, SetTokenRanges<'info>>,
        tier: BoxTier,
        entries: Vec<TokenRangeEntry>,
    ) -> Result<()> {
        config::set_token_ranges(ctx, tier, entries)
    }

    pub fn set_reward_mints(ctx: Context<AdminAction>, mints: Vec<Pubkey>) -> Result<()> {
        config::set_reward_mints(ctx, mints)
    }

    pub fn set_signer(ctx: Context<AdminAction>, signer: Pubkey) -> Result<()> {
        admin::set_signer(ctx, signer)
    }

    pub fn set_randomness_config(
        ctx: Context<AdminAction>,
        oracle: Pubkey,
        key_hash: [u8; 32],
        min_confirmations: u16,
        callback_compute_limit: u32,
    ) -> Result<()> {
        admin::set_randomness_config(ctx, oracle, key_hash, min_confirmations, callback_compute_limit)
    }

    // ----------------------------
    // Lifecycle (owner)
    // ----------------------------
    pub fn transfer_ownership(ctx: Context<AdminAction>, new_owner: Pubkey) -> Result<()> {
        admin::transfer_ownership(ctx, new_owner)
    }

    pub fn accept_ownership(ctx: Context<AcceptOwnership>) -> Result<()> {
        admin::accept_ownership(ctx)
    }

    pub fn pause(ctx: Context<AdminAction>) -> Result<()> {
        admin::set_pause(ctx, true)
    }

    pub fn unpause(ctx: Context<AdminAction>) -> Result<()> {
        admin::set_pause(ctx, false)
    }

    pub fn cancel_pending(ctx: Context<CancelPending>, request_id: u64) -> Result<()> {
        admin::cancel_pending(ctx, request_id)
    }

    pub fn emergency_withdraw_sol(ctx: Context<EmergencyWithdrawSol>, amount: u64) -> Result<()> {
        admin::emergency_withdraw_sol(ctx, amount)
    }

    pub fn emergency_withdraw_token(ctx: Context<EmergencyWithdrawToken>, amount: u64) -> Result<()> {
        admin::emergency_withdraw_token(ctx, amount)
    }

    // ----------------------------
    // Views
    // ----------------------------
    pub fn engine_state(ctx: Context<EngineStateView>) -> Result<EngineSnapshot> {
        views::engine_state(ctx)
    }

    pub fn pending_rewards<'info>(
        ctx: Context<'_, '_, 'info, 'info, PendingRewardsView<'info>>,
    ) -> Result<Vec<RewardEntry>> {
        views::pending_rewards(ctx)
    }

    pub fn cooldown_remaining(
        ctx: Context<CooldownView>,
        identity_key: [u8; 32],
    ) -> Result<CooldownStatus> {
        views::cooldown(ctx, identity_key)
    }

    pub fn last_reward(ctx: Context<LastRewardView>) -> Result<LastRewardInfo> {
        views::last_reward(ctx)
    }
}
