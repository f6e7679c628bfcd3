// programs/lootbox_protocol/src/contexts.rs

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::state::{
    BoxTier, Config, IdentityRecord, PendingRequest, RewardBalance, RewardVault, TokenRange,
    UserProfile,
};

// ----------------------------
// Setup
// ----------------------------

#[derive(Accounts)]
pub struct InitializeConfig<'info> {
    #[account(
        init,
        payer = owner,
        space = 8 + Config::INIT_SPACE,
        seeds = [crate::CONFIG_SEED],
        bump
    )]
    pub config: Account<'info, Config>,

    /// CHECK: system-owned PDA (owner = system program). Address enforced by seeds/bump.
    #[account(
        init,
        payer = owner,
        space = 0,
        owner = anchor_lang::solana_program::system_program::ID,
        seeds = [crate::TREASURY_SOL_SEED],
        bump
    )]
    pub treasury_sol: UncheckedAccount<'info>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct InitRewardVault<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    pub mint: Account<'info, Mint>,

    #[account(
        init,
        payer = owner,
        space = 8 + RewardVault::INIT_SPACE,
        seeds = [crate::REWARD_VAULT_SEED, mint.key().as_ref()],
        bump
    )]
    pub reward_vault: Account<'info, RewardVault>,

    /// Vault = TokenAccount PDA controlled by the program (authority = config PDA)
    #[account(
        init,
        payer = owner,
        seeds = [crate::VAULT_SEED, mint.key().as_ref()],
        bump,
        token::mint = mint,
        token::authority = config
    )]
    pub vault: Account<'info, TokenAccount>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[derive(Accounts)]
pub struct FundRewardVault<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    pub mint: Account<'info, Mint>,

    #[account(
        mut,
        seeds = [crate::REWARD_VAULT_SEED, mint.key().as_ref()],
        bump = reward_vault.bump
    )]
    pub reward_vault: Account<'info, RewardVault>,

    #[account(mut, address = reward_vault.vault)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = funder_token_account.mint == mint.key(),
        constraint = funder_token_account.owner == funder.key()
    )]
    pub funder_token_account: Account<'info, TokenAccount>,

    pub funder: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

// ----------------------------
// Admin (config-only mutations)
// ----------------------------

#[derive(Accounts)]
pub struct AdminAction<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    pub owner: Signer<'info>,
}

#[derive(Accounts)]
pub struct AcceptOwnership<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    pub new_owner: Signer<'info>,
}

#[derive(Accounts)]
#[instruction(tier: BoxTier, mint: Pubkey)]
pub struct SetTokenRange<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + TokenRange::INIT_SPACE,
        seeds = [crate::TOKEN_RANGE_SEED, &[tier as u8], mint.as_ref()],
        bump
    )]
    pub token_range: Account<'info, TokenRange>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct SetTokenRanges<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(request_id: u64)]
pub struct CancelPending<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        close = requester,
        seeds = [crate::PENDING_SEED, request_id.to_le_bytes().as_ref()],
        bump = pending.bump
    )]
    pub pending: Account<'info, PendingRequest>,

    /// CHECK: rent refund destination, must be the user that opened the box.
    #[account(mut, address = pending.user)]
    pub requester: UncheckedAccount<'info>,

    pub owner: Signer<'info>,
}

#[derive(Accounts)]
pub struct EmergencyWithdrawSol<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    /// CHECK: system-owned PDA. Address enforced by seeds/bump + address=config.treasury_sol
    #[account(
        mut,
        address = config.treasury_sol,
        seeds = [crate::TREASURY_SOL_SEED],
        bump = config.treasury_sol_bump
    )]
    pub treasury_sol: UncheckedAccount<'info>,

    /// CHECK: arbitrary lamport destination chosen by the owner.
    #[account(mut)]
    pub destination: UncheckedAccount<'info>,

    pub owner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct EmergencyWithdrawToken<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    pub mint: Account<'info, Mint>,

    #[account(
        mut,
        seeds = [crate::REWARD_VAULT_SEED, mint.key().as_ref()],
        bump = reward_vault.bump
    )]
    pub reward_vault: Account<'info, RewardVault>,

    #[account(mut, address = reward_vault.vault)]
    pub vault: Account<'info, TokenAccount>,

    #[account(mut, constraint = destination.mint == mint.key())]
    pub destination: Account<'info, TokenAccount>,

    pub owner: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

// ----------------------------
// Open / fulfill
// ----------------------------

#[derive(Accounts)]
pub struct OpenBox<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    /// CHECK: system-owned PDA. Address enforced by seeds/bump + address=config.treasury_sol
    #[account(
        mut,
        address = config.treasury_sol,
        seeds = [crate::TREASURY_SOL_SEED],
        bump = config.treasury_sol_bump
    )]
    pub treasury_sol: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = user,
        space = 8 + UserProfile::INIT_SPACE,
        seeds = [crate::USER_SEED, user.key().as_ref()],
        bump
    )]
    pub user_profile: Account<'info, UserProfile>,

    #[account(
        init,
        payer = user,
        space = 8 + PendingRequest::INIT_SPACE,
        seeds = [crate::PENDING_SEED, config.next_request_id.to_le_bytes().as_ref()],
        bump
    )]
    pub pending: Account<'info, PendingRequest>,

    #[account(mut)]
    pub user: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(identity: String, identity_key: [u8; 32], nonce: u64)]
pub struct OpenFreeBox<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        init_if_needed,
        payer = user,
        space = 8 + UserProfile::INIT_SPACE,
        seeds = [crate::USER_SEED, user.key().as_ref()],
        bump
    )]
    pub user_profile: Account<'info, UserProfile>,

    #[account(
        init_if_needed,
        payer = user,
        space = 8 + IdentityRecord::INIT_SPACE,
        seeds = [crate::IDENTITY_SEED, identity_key.as_ref()],
        bump
    )]
    pub identity_record: Account<'info, IdentityRecord>,

    /// CHECK: nonce marker PDA, created by the handler; must not exist yet.
    #[account(
        mut,
        seeds = [crate::WALLET_NONCE_SEED, user.key().as_ref(), nonce.to_le_bytes().as_ref()],
        bump
    )]
    pub wallet_nonce: UncheckedAccount<'info>,

    /// CHECK: nonce marker PDA, created by the handler; must not exist yet.
    #[account(
        mut,
        seeds = [crate::IDENTITY_NONCE_SEED, identity_key.as_ref(), nonce.to_le_bytes().as_ref()],
        bump
    )]
    pub identity_nonce: UncheckedAccount<'info>,

    #[account(
        init,
        payer = user,
        space = 8 + PendingRequest::INIT_SPACE,
        seeds = [crate::PENDING_SEED, config.next_request_id.to_le_bytes().as_ref()],
        bump
    )]
    pub pending: Account<'info, PendingRequest>,

    #[account(mut)]
    pub user: Signer<'info>,

    /// CHECK: instructions sysvar, used for ed25519 introspection.
    #[account(address = anchor_lang::solana_program::sysvar::instructions::ID)]
    pub instructions: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(request_id: u64)]
pub struct FulfillRandomness<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        close = requester,
        seeds = [crate::PENDING_SEED, request_id.to_le_bytes().as_ref()],
        bump = pending.bump
    )]
    pub pending: Account<'info, PendingRequest>,

    /// CHECK: rent refund destination, must be the user that opened the box.
    #[account(mut, address = pending.user)]
    pub requester: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [crate::USER_SEED, pending.user.as_ref()],
        bump = user_profile.bump
    )]
    pub user_profile: Account<'info, UserProfile>,

    /// Oracle authority; pays rent for reward balances created on first credit.
    #[account(mut)]
    pub provider: Signer<'info>,

    pub system_program: Program<'info, System>,
}

// ----------------------------
// Claims
// ----------------------------

#[derive(Accounts)]
pub struct Claim<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    pub mint: Account<'info, Mint>,

    #[account(
        mut,
        seeds = [crate::BALANCE_SEED, user.key().as_ref(), mint.key().as_ref()],
        bump = reward_balance.bump
    )]
    pub reward_balance: Account<'info, RewardBalance>,

    #[account(
        mut,
        seeds = [crate::REWARD_VAULT_SEED, mint.key().as_ref()],
        bump = reward_vault.bump
    )]
    pub reward_vault: Account<'info, RewardVault>,

    #[account(mut, address = reward_vault.vault)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = user_token_account.mint == mint.key(),
        constraint = user_token_account.owner == user.key()
    )]
    pub user_token_account: Account<'info, TokenAccount>,

    pub user: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ClaimAll<'info> {
    #[account(
        mut,
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    pub user: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

// ----------------------------
// Views
// ----------------------------

#[derive(Accounts)]
pub struct EngineStateView<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,
}

#[derive(Accounts)]
pub struct PendingRewardsView<'info> {
    #[account(
        seeds = [crate::CONFIG_SEED],
        bump = config.bump
    )]
    pub config: Account<'info, Config>,

    /// CHECK: only used as a seed for the balance PDAs in remaining accounts.
    pub user: UncheckedAccount<'info>,
}

#[derive(Accounts)]
#[instruction(identity_key: [u8; 32])]
pub struct CooldownView<'info> {
    /// CHECK: only used as a seed.
    pub user: UncheckedAccount<'info>,

    /// CHECK: may not exist yet; deserialized only when initialized.
    #[account(
        seeds = [crate::USER_SEED, user.key().as_ref()],
        bump
    )]
    pub user_profile: UncheckedAccount<'info>,

    /// CHECK: may not exist yet; deserialized only when initialized.
    #[account(
        seeds = [crate::IDENTITY_SEED, identity_key.as_ref()],
        bump
    )]
    pub identity_record: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct LastRewardView<'info> {
    /// CHECK: only used as a seed.
    pub user: UncheckedAccount<'info>,

    /// CHECK: may not exist yet; deserialized only when initialized.
    #[account(
        seeds = [crate::USER_SEED, user.key().as_ref()],
        bump
    )]
    pub user_profile: UncheckedAccount<'info>,
}
