// programs/lootbox_protocol/src/instructions/vault.rs
use anchor_lang::prelude::*;
use anchor_spl::token::{self, Transfer};

use crate::errors::LootboxError;
use crate::events::{RewardVaultInitialized, VaultFunded};
use crate::guards::only_owner;
use crate::{FundRewardVault, InitRewardVault};

/// Creates the RewardVault record and its PDA TokenAccount (authority = config).
pub fn init_reward_vault(ctx: Context<InitRewardVault>) -> Result<()> {
    only_owner(&ctx.accounts.config, &ctx.accounts.owner.key())?;

    let rv = &mut ctx.accounts.reward_vault;
    rv.mint = ctx.accounts.mint.key();
    rv.vault = ctx.accounts.vault.key();
    rv.bump = ctx.bumps.reward_vault;
    rv.vault_bump = ctx.bumps.vault;
    rv.total_funded = 0;
    rv.total_claimed = 0;
    rv.emergency_withdrawn = 0;

    emit!(RewardVaultInitialized {
        mint: rv.mint,
        vault: rv.vault,
    });
    Ok(())
}

/// Anyone may top up a vault (normal signed tx).
pub fn fund_reward_vault(ctx: Context<FundRewardVault>, amount: u64) -> Result<()> {
    require!(amount > 0, LootboxError::InvalidAmount);

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.funder_token_account.to_account_info(),
                to: ctx.accounts.vault.to_account_info(),
                authority: ctx.accounts.funder.to_account_info(),
            },
        ),
        amount,
    )?;

    let rv = &mut ctx.accounts.reward_vault;
    rv.total_funded = rv
        .total_funded
        .checked_add(amount)
        .ok_or(LootboxError::MathOverflow)?;

    emit!(VaultFunded {
        mint: rv.mint,
        funder: ctx.accounts.funder.key(),
        amount,
    });
    Ok(())
}
