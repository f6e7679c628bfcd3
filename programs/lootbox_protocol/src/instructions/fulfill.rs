use anchor_lang::prelude::*;
use anchor_lang::AccountsExit;

use crate::errors::LootboxError;
use crate::events::{RequestFulfilled, RewardQueued};
use crate::selection::{derive_amount, draw_indices};
use crate::state::{effective_range, BoxTier, RewardBalance, RewardEntry, TierConfig, TokenRange};
use crate::utils::{balance_pda, create_pda_account, token_range_pda, BALANCE_SEED};
use crate::FulfillRandomness;

/// A resolved reward before it touches any account.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Draw {
    pub mint: Pubkey,
    pub amount: u64,
}

/// Computes the full outcome of a request against the current token set.
/// `range_for(i, mint)` returns the enabled override for draw `i`, if any.
pub fn resolve_draws<F>(
    word: &[u8; 32],
    request_id: u64,
    tier_cfg: &TierConfig,
    mints: &[Pubkey],
    mut range_for: F,
) -> Result<Vec<Draw>>
where
    F: FnMut(usize, &Pubkey) -> Result<Option<TokenRange>>,
{
    let picks = draw_indices(word, request_id, mints.len(), tier_cfg.reward_count as usize);

    let mut out = Vec::with_capacity(picks.len());
    for (i, idx) in picks.into_iter().enumerate() {
        let mint = mints[idx];
        let over = range_for(i, &mint)?;
        let range = effective_range(tier_cfg, over.as_ref());
        out.push(Draw {
            mint,
            amount: derive_amount(word, request_id, i as u32, range),
        });
    }
    Ok(out)
}

/// PENDING -> FULFILLED. Not gated by pause so in-flight requests can drain.
///
/// remaining_accounts, per draw `i` in draw order:
///   [2i]   RewardBalance PDA (user, mint_i), created here when missing
///   [2i+1] TokenRange PDA (tier, mint_i), may be uninitialized
pub fn fulfill_randomness<'info>(
    ctx: Context<'_, '_, 'info, 'info, FulfillRandomness<'info>>,
    request_id: u64,
    random_words: Vec<[u8; 32]>,
) -> Result<()> {
    let pending = &ctx.accounts.pending;
    require_keys_eq!(
        pending.provider,
        ctx.accounts.provider.key(),
        LootboxError::NotProvider
    );
    require!(pending.request_id == request_id, LootboxError::RequestIdMismatch);
    require!(!random_words.is_empty(), LootboxError::EmptyRandomWords);

    let user = pending.user;
    let tier = BoxTier::from_u8(pending.tier)?;
    let word = random_words[0];

    // pending account itself is closed by the `close = requester` constraint
    let cfg = &mut ctx.accounts.config;
    cfg.release_pending()?;
    cfg.total_fulfilled = cfg
        .total_fulfilled
        .checked_add(1)
        .ok_or(LootboxError::MathOverflow)?;

    let tier_cfg = *cfg.tier(tier);
    let program_id = ctx.program_id;
    let remaining = ctx.remaining_accounts;

    let expected_draws = (tier_cfg.reward_count as usize).min(cfg.reward_mints.len());
    if expected_draws < tier_cfg.reward_count as usize {
        msg!(
            "request {}: token set shrank, drawing {} of {}",
            request_id,
            expected_draws,
            tier_cfg.reward_count
        );
    }
    require!(
        remaining.len() == expected_draws * 2,
        LootboxError::AccountMismatch
    );

    let draws = resolve_draws(&word, request_id, &tier_cfg, &cfg.reward_mints, |i, mint| {
        let range_ai = &remaining[2 * i + 1];
        let (expected, _) = token_range_pda(program_id, tier, mint);
        require_keys_eq!(expected, *range_ai.key, LootboxError::AccountMismatch);

        if range_ai.data_is_empty() {
            return Ok(None);
        }
        let range = Account::<TokenRange>::try_from(range_ai)?;
        Ok(Some(range.into_inner()))
    })?;

    let provider_info = ctx.accounts.provider.to_account_info();
    let system_info = ctx.accounts.system_program.to_account_info();
    let mut rewards = Vec::with_capacity(draws.len());

    for (i, draw) in draws.iter().enumerate() {
        let balance_ai = &remaining[2 * i];
        let (expected, bump) = balance_pda(program_id, &user, &draw.mint);
        require_keys_eq!(expected, *balance_ai.key, LootboxError::AccountMismatch);

        if balance_ai.data_is_empty() {
            let mut fresh = RewardBalance {
                user,
                mint: draw.mint,
                bump,
                ..Default::default()
            };
            fresh.credit(draw.amount)?;

            create_pda_account(
                program_id,
                &provider_info,
                balance_ai,
                &system_info,
                &[BALANCE_SEED, user.as_ref(), draw.mint.as_ref(), &[bump]],
                8 + RewardBalance::INIT_SPACE,
                &fresh,
            )?;
        } else {
            let mut balance = Account::<RewardBalance>::try_from(balance_ai)?;
            balance.credit(draw.amount)?;
            balance.exit(program_id)?;
        }

        emit!(RewardQueued {
            request_id,
            user,
            mint: draw.mint,
            amount: draw.amount,
        });
        rewards.push(RewardEntry {
            mint: draw.mint,
            amount: draw.amount,
        });
    }

    let profile = &mut ctx.accounts.user_profile;
    profile.last_request_id = request_id;
    profile.last_reward = rewards;

    emit!(RequestFulfilled {
        request_id,
        user,
        tier,
        reward_count: draws.len() as u8,
    });

    Ok(())
}
