//! Read-only instructions. Values come back through Anchor return data, so a
//! client can simulate them without sending a transaction.

use anchor_lang::prelude::*;

use crate::errors::LootboxError;
use crate::state::{cooldown_left, EngineSnapshot, IdentityRecord, RewardBalance, RewardEntry, UserProfile};
use crate::utils::balance_pda;
use crate::{CooldownView, EngineStateView, LastRewardView, PendingRewardsView};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct CooldownStatus {
    pub wallet_remaining: i64,
    pub identity_remaining: i64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug)]
pub struct LastRewardInfo {
    pub request_id: u64,
    pub rewards: Vec<RewardEntry>,
}

pub fn engine_state(ctx: Context<EngineStateView>) -> Result<EngineSnapshot> {
    Ok(EngineSnapshot::from(&*ctx.accounts.config))
}

/// remaining_accounts: the user's balance PDAs, in any order. Uninitialized
/// accounts and zero balances are left out; the result follows `reward_mints`.
pub fn pending_rewards<'info>(
    ctx: Context<'_, '_, 'info, 'info, PendingRewardsView<'info>>,
) -> Result<Vec<RewardEntry>> {
    let user = ctx.accounts.user.key();
    let mut out = Vec::with_capacity(ctx.remaining_accounts.len());

    for ai in ctx.remaining_accounts.iter() {
        if ai.data_is_empty() {
            continue;
        }
        let balance = Account::<RewardBalance>::try_from(ai)?;
        let (expected, _) = balance_pda(ctx.program_id, &user, &balance.mint);
        require_keys_eq!(expected, *ai.key, LootboxError::AccountMismatch);

        if balance.amount > 0 {
            out.push(RewardEntry {
                mint: balance.mint,
                amount: balance.amount,
            });
        }
    }
    Ok(order_by_reward_mints(out, &ctx.accounts.config.reward_mints))
}

/// Stable sort by position in `mints`; mints no longer configured go last.
pub fn order_by_reward_mints(mut entries: Vec<RewardEntry>, mints: &[Pubkey]) -> Vec<RewardEntry> {
    entries.sort_by_key(|e| {
        mints
            .iter()
            .position(|m| *m == e.mint)
            .unwrap_or(usize::MAX)
    });
    entries
}

pub fn cooldown(ctx: Context<CooldownView>, _identity_key: [u8; 32]) -> Result<CooldownStatus> {
    let now = Clock::get()?.unix_timestamp;

    let wallet_last = read_optional::<UserProfile>(&ctx.accounts.user_profile.to_account_info())?
        .map(|p| p.last_free_open_at)
        .unwrap_or(0);
    let identity_last =
        read_optional::<IdentityRecord>(&ctx.accounts.identity_record.to_account_info())?
            .map(|r| r.last_free_open_at)
            .unwrap_or(0);

    Ok(CooldownStatus {
        wallet_remaining: cooldown_left(wallet_last, now),
        identity_remaining: cooldown_left(identity_last, now),
    })
}

pub fn last_reward(ctx: Context<LastRewardView>) -> Result<LastRewardInfo> {
    let profile = read_optional::<UserProfile>(&ctx.accounts.user_profile.to_account_info())?;
    Ok(match profile {
        Some(p) => LastRewardInfo {
            request_id: p.last_request_id,
            rewards: p.last_reward,
        },
        None => LastRewardInfo {
            request_id: 0,
            rewards: vec![],
        },
    })
}

/// Deserializes a PDA that may not have been created yet.
fn read_optional<T>(ai: &AccountInfo) -> Result<Option<T>>
where
    T: AccountDeserialize + Owner,
{
    if ai.data_is_empty() {
        return Ok(None);
    }
    require_keys_eq!(*ai.owner, T::owner(), LootboxError::AccountMismatch);

    let data = ai
        .try_borrow_data()
        .map_err(|_| error!(LootboxError::AccountBorrowFailed))?;
    let value = T::try_deserialize(&mut &data[..])?;
    Ok(Some(value))
}
