use anchor_lang::prelude::*;
use anchor_lang::solana_program::{program::invoke_signed, system_instruction};

use crate::constants::*;
use crate::errors::LootboxError;
use crate::events::*;
use crate::guards::{non_reentrant, only_owner, unlock};
use crate::utils::{transfer_from_vault, TREASURY_SOL_SEED};
use crate::{
    AcceptOwnership, AdminAction, CancelPending, EmergencyWithdrawSol, EmergencyWithdrawToken,
    InitializeConfig,
};

pub fn initialize_config(ctx: Context<InitializeConfig>, domain_id: u64) -> Result<()> {
    let cfg = &mut ctx.accounts.config;

    cfg.owner = ctx.accounts.owner.key();
    cfg.pending_owner = Pubkey::default();
    cfg.bump = ctx.bumps.config;

    cfg.paused = false;
    cfg.locked = false;
    cfg.version = INITIAL_VERSION;
    cfg.domain_id = domain_id;

    // signer + oracle start unset; opens fail until the owner configures them
    cfg.signer = Pubkey::default();
    cfg.oracle = Pubkey::default();
    cfg.key_hash = [0u8; 32];
    cfg.min_confirmations = DEFAULT_MIN_CONFIRMATIONS;
    cfg.callback_compute_limit = DEFAULT_CALLBACK_COMPUTE_LIMIT;

    cfg.next_request_id = INITIAL_REQUEST_ID;
    cfg.pending_count = 0;
    cfg.total_opened = 0;
    cfg.total_fulfilled = 0;

    cfg.treasury_sol = ctx.accounts.treasury_sol.key();
    cfg.treasury_sol_bump = ctx.bumps.treasury_sol;
    cfg.emergency_withdrawn_lamports = 0;

    cfg.prices = [0; TIER_COUNT];
    cfg.tiers = Default::default();
    cfg.reward_mints = Vec::new();

    emit!(ConfigInitialized {
        owner: cfg.owner,
        domain_id,
        treasury_sol: cfg.treasury_sol,
    });

    Ok(())
}

// ----------------------------
// Ownership (two-step)
// ----------------------------

pub fn transfer_ownership(ctx: Context<AdminAction>, new_owner: Pubkey) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    only_owner(cfg, &ctx.accounts.owner.key())?;

    cfg.pending_owner = new_owner;

    emit!(OwnershipTransferStarted {
        previous_owner: cfg.owner,
        new_owner,
    });
    Ok(())
}

pub fn accept_ownership(ctx: Context<AcceptOwnership>) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    let caller = ctx.accounts.new_owner.key();

    require!(cfg.pending_owner != Pubkey::default(), LootboxError::NotPendingOwner);
    require_keys_eq!(cfg.pending_owner, caller, LootboxError::NotPendingOwner);

    let previous_owner = cfg.owner;
    cfg.owner = caller;
    cfg.pending_owner = Pubkey::default();

    emit!(OwnershipTransferred {
        previous_owner,
        new_owner: caller,
    });
    Ok(())
}

// ----------------------------
// Lifecycle
// ----------------------------

pub fn set_pause(ctx: Context<AdminAction>, paused: bool) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    let by = ctx.accounts.owner.key();
    only_owner(cfg, &by)?;

    cfg.paused = paused;

    if paused {
        emit!(Paused { by });
    } else {
        emit!(Unpaused { by });
    }
    Ok(())
}

pub fn set_signer(ctx: Context<AdminAction>, signer: Pubkey) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    only_owner(cfg, &ctx.accounts.owner.key())?;

    let old_signer = cfg.signer;
    cfg.signer = signer;

    emit!(SignerUpdated {
        old_signer,
        new_signer: signer,
    });
    Ok(())
}

pub fn set_randomness_config(
    ctx: Context<AdminAction>,
    oracle: Pubkey,
    key_hash: [u8; 32],
    min_confirmations: u16,
    callback_compute_limit: u32,
) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    only_owner(cfg, &ctx.accounts.owner.key())?;

    // in-flight requests keep their captured provider, but rotating under them
    // would still change who answers next; wait until they drain
    require!(cfg.pending_count == 0, LootboxError::PendingRequestsOutstanding);

    cfg.oracle = oracle;
    cfg.key_hash = key_hash;
    cfg.min_confirmations = min_confirmations;
    cfg.callback_compute_limit = callback_compute_limit;

    emit!(OracleConfigUpdated {
        oracle,
        key_hash,
        min_confirmations,
        callback_compute_limit,
    });
    Ok(())
}

// ----------------------------
// Rescue paths
// ----------------------------

pub fn cancel_pending(ctx: Context<CancelPending>, request_id: u64) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    only_owner(cfg, &ctx.accounts.owner.key())?;

    let pending = &ctx.accounts.pending;
    require!(pending.request_id == request_id, LootboxError::RequestIdMismatch);

    cfg.release_pending()?;

    // account closed by the `close = requester` constraint
    emit!(PendingCancelled {
        request_id,
        user: pending.user,
    });
    Ok(())
}

/// Moves lamports out of the treasury without touching reward balances.
pub fn emergency_withdraw_sol(ctx: Context<EmergencyWithdrawSol>, amount: u64) -> Result<()> {
    only_owner(&ctx.accounts.config, &ctx.accounts.owner.key())?;
    require!(amount > 0, LootboxError::InvalidAmount);
    non_reentrant(&mut ctx.accounts.config)?;

    let treasury_info = ctx.accounts.treasury_sol.to_account_info();
    let min_rent = Rent::get()?.minimum_balance(0);
    require!(
        treasury_info.lamports() >= amount.saturating_add(min_rent),
        LootboxError::InsufficientVaultFunds
    );

    let ix = system_instruction::transfer(
        treasury_info.key,
        ctx.accounts.destination.key,
        amount,
    );
    let signer_seeds: &[&[u8]] = &[TREASURY_SOL_SEED, &[ctx.accounts.config.treasury_sol_bump]];

    invoke_signed(
        &ix,
        &[
            treasury_info.clone(),
            ctx.accounts.destination.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
        ],
        &[signer_seeds],
    )?;

    let cfg = &mut ctx.accounts.config;
    cfg.emergency_withdrawn_lamports = cfg
        .emergency_withdrawn_lamports
        .checked_add(amount)
        .ok_or(LootboxError::MathOverflow)?;
    unlock(cfg);

    emit!(EmergencyWithdrawal {
        mint: Pubkey::default(),
        to: ctx.accounts.destination.key(),
        amount,
        total_withdrawn: cfg.emergency_withdrawn_lamports,
    });
    Ok(())
}

/// Moves tokens out of a reward vault without touching reward balances; can
/// leave credited balances under-collateralized.
pub fn emergency_withdraw_token(ctx: Context<EmergencyWithdrawToken>, amount: u64) -> Result<()> {
    only_owner(&ctx.accounts.config, &ctx.accounts.owner.key())?;
    require!(amount > 0, LootboxError::InvalidAmount);
    require!(
        ctx.accounts.vault.amount >= amount,
        LootboxError::InsufficientVaultFunds
    );
    non_reentrant(&mut ctx.accounts.config)?;

    transfer_from_vault(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.destination.to_account_info(),
        ctx.accounts.config.to_account_info(),
        ctx.accounts.config.bump,
        amount,
    )?;

    let rv = &mut ctx.accounts.reward_vault;
    rv.emergency_withdrawn = rv
        .emergency_withdrawn
        .checked_add(amount)
        .ok_or(LootboxError::MathOverflow)?;
    unlock(&mut ctx.accounts.config);

    emit!(EmergencyWithdrawal {
        mint: rv.mint,
        to: ctx.accounts.destination.key(),
        amount,
        total_withdrawn: rv.emergency_withdrawn,
    });
    Ok(())
}
