use anchor_lang::prelude::*;

use crate::errors::LootboxError;
use crate::events::*;
use crate::guards::only_owner;
use crate::state::{BoxTier, TierConfig, TokenRange};
use crate::utils::{create_pda_account, token_range_pda, write_account, TokenRangeEntry, TOKEN_RANGE_SEED};
use crate::{AdminAction, SetTokenRange, SetTokenRanges, MAX_RANGE_BATCH};

pub fn set_tier_config(
    ctx: Context<AdminAction>,
    tier: BoxTier,
    min_amount: u64,
    max_amount: u64,
    reward_count: u8,
    enabled: bool,
) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    only_owner(cfg, &ctx.accounts.owner.key())?;

    cfg.set_tier(
        tier,
        TierConfig {
            min_amount,
            max_amount,
            reward_count,
            enabled,
        },
    )?;

    emit!(TierConfigUpdated {
        tier,
        min_amount,
        max_amount,
        reward_count,
        enabled,
    });
    Ok(())
}

pub fn set_price(ctx: Context<AdminAction>, tier: BoxTier, price: u64) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    only_owner(cfg, &ctx.accounts.owner.key())?;

    let old_price = cfg.price(tier);
    cfg.set_price(tier, price)?;

    emit!(PriceUpdated {
        tier,
        old_price,
        new_price: price,
    });
    Ok(())
}

pub fn set_reward_mints(ctx: Context<AdminAction>, mints: Vec<Pubkey>) -> Result<()> {
    let cfg = &mut ctx.accounts.config;
    only_owner(cfg, &ctx.accounts.owner.key())?;

    cfg.replace_reward_mints(&mints)?;

    emit!(RewardMintsUpdated {
        mints: cfg.reward_mints.clone(),
    });
    Ok(())
}

pub fn set_token_range(
    ctx: Context<SetTokenRange>,
    tier: BoxTier,
    mint: Pubkey,
    min_amount: u64,
    max_amount: u64,
    enabled: bool,
) -> Result<()> {
    only_owner(&ctx.accounts.config, &ctx.accounts.owner.key())?;
    require!(mint != Pubkey::default(), LootboxError::ZeroToken);
    TokenRange::validate_bounds(min_amount, max_amount)?;

    let range = &mut ctx.accounts.token_range;
    range.tier = tier.as_u8();
    range.mint = mint;
    range.min_amount = min_amount;
    range.max_amount = max_amount;
    range.enabled = enabled;
    range.bump = ctx.bumps.token_range;

    emit!(TokenRangeUpdated {
        tier,
        mint,
        min_amount,
        max_amount,
        enabled,
    });
    Ok(())
}

/// Batch variant of `set_token_range`. `remaining_accounts[i]` is the range PDA
/// for `(tier, entries[i].mint)`; missing PDAs are created with the owner as payer.
pub fn set_token_ranges<'info>(
    ctx: Context<'_, '_, 'info, 'info, SetTokenRanges<'info>>,
    tier: BoxTier,
    entries: Vec<TokenRangeEntry>,
) -> Result<()> {
    only_owner(&ctx.accounts.config, &ctx.accounts.owner.key())?;

    require!(entries.len() <= MAX_RANGE_BATCH, LootboxError::TooManyEntries);
    require!(
        ctx.remaining_accounts.len() == entries.len(),
        LootboxError::AccountMismatch
    );

    // validate everything before touching any account
    for e in entries.iter() {
        require!(e.mint != Pubkey::default(), LootboxError::ZeroToken);
        TokenRange::validate_bounds(e.min_amount, e.max_amount)?;
    }

    let owner_info = ctx.accounts.owner.to_account_info();
    let system_info = ctx.accounts.system_program.to_account_info();
    let space = 8 + TokenRange::INIT_SPACE;

    for (i, e) in entries.iter().enumerate() {
        let range_ai = &ctx.remaining_accounts[i];

        let (expected_pda, bump) = token_range_pda(ctx.program_id, tier, &e.mint);
        require_keys_eq!(expected_pda, *range_ai.key, LootboxError::AccountMismatch);

        let range = TokenRange {
            tier: tier.as_u8(),
            mint: e.mint,
            min_amount: e.min_amount,
            max_amount: e.max_amount,
            enabled: e.enabled,
            bump,
        };

        if range_ai.data_is_empty() {
            let tier_seed = [tier.as_u8()];
            let signer: &[&[u8]] = &[TOKEN_RANGE_SEED, &tier_seed, e.mint.as_ref(), &[bump]];
            create_pda_account(
                ctx.program_id,
                &owner_info,
                range_ai,
                &system_info,
                signer,
                space,
                &range,
            )?;
        } else {
            require_keys_eq!(*range_ai.owner, *ctx.program_id, LootboxError::AccountMismatch);
            // make sure it really is a TokenRange before overwriting it
            Account::<TokenRange>::try_from(range_ai)?;
            write_account(range_ai, &range)?;
        }

        emit!(TokenRangeUpdated {
            tier,
            mint: e.mint,
            min_amount: e.min_amount,
            max_amount: e.max_amount,
            enabled: e.enabled,
        });
    }

    Ok(())
}
