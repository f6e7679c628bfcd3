use anchor_lang::prelude::*;
use anchor_lang::AccountsExit;
use anchor_spl::token::TokenAccount;

use crate::constants::MAX_CLAIM_BATCH;
use crate::errors::LootboxError;
use crate::events::{ClaimAllSettled, RewardClaimed};
use crate::guards::{non_reentrant, unlock, when_not_paused};
use crate::state::{RewardBalance, RewardEntry, RewardVault};
use crate::utils::{balance_pda, transfer_from_vault, REWARD_VAULT_SEED};
use crate::{Claim, ClaimAll};

/// Accounts per token in `claim_all`:
/// [reward_balance, reward_vault, vault, user_token_account]
pub const CLAIM_ALL_STRIDE: usize = 4;

/// What the destination token account looks like, if it is one at all.
#[derive(Clone, Copy, Debug)]
pub struct Destination {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub frozen: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Settlement {
    /// Nothing owed.
    Skip,
    /// Transfer would fail; leave the balance as is.
    Fail,
    Pay(u64),
}

/// Decides, before any CPI, whether one token of a `claim_all` batch can settle.
pub fn plan_settlement(
    user: &Pubkey,
    mint: &Pubkey,
    owed: u64,
    vault_amount: u64,
    vault_frozen: bool,
    destination: Option<Destination>,
) -> Settlement {
    if owed == 0 {
        return Settlement::Skip;
    }
    if vault_frozen || vault_amount < owed {
        return Settlement::Fail;
    }
    match destination {
        Some(d) if d.mint == *mint && d.owner == *user && !d.frozen => Settlement::Pay(owed),
        _ => Settlement::Fail,
    }
}

/// Plans one token against `balance` and, when it can be paid, takes the
/// balance. The caller moves the returned amount.
pub fn settle_balance(
    user: &Pubkey,
    balance: &mut RewardBalance,
    vault_amount: u64,
    vault_frozen: bool,
    destination: Option<Destination>,
) -> Result<Settlement> {
    match plan_settlement(
        user,
        &balance.mint,
        balance.amount,
        vault_amount,
        vault_frozen,
        destination,
    ) {
        Settlement::Pay(_) => Ok(Settlement::Pay(balance.take()?)),
        other => Ok(other),
    }
}

/// Per-call outcome of `claim_all`.
#[derive(Default, Debug)]
pub struct ClaimTally {
    pub claimed: Vec<RewardEntry>,
    pub failed: Vec<Pubkey>,
}

impl ClaimTally {
    pub fn record(&mut self, mint: Pubkey, outcome: Settlement) {
        match outcome {
            Settlement::Skip => {}
            Settlement::Fail => self.failed.push(mint),
            Settlement::Pay(amount) => self.claimed.push(RewardEntry { mint, amount }),
        }
    }

    pub fn finish(self) -> Result<Self> {
        require!(!self.claimed.is_empty(), LootboxError::NoRewardsClaimed);
        Ok(self)
    }
}

pub fn claim(ctx: Context<Claim>) -> Result<()> {
    when_not_paused(&ctx.accounts.config)?;

    let owed = ctx.accounts.reward_balance.amount;
    require!(owed > 0, LootboxError::NothingToClaim);
    require!(
        ctx.accounts.vault.amount >= owed,
        LootboxError::InsufficientVaultFunds
    );

    non_reentrant(&mut ctx.accounts.config)?;

    // effects are flushed before the token CPI
    let amount = ctx.accounts.reward_balance.take()?;
    ctx.accounts.reward_balance.exit(&crate::ID)?;

    transfer_from_vault(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.user_token_account.to_account_info(),
        ctx.accounts.config.to_account_info(),
        ctx.accounts.config.bump,
        amount,
    )?;

    let rv = &mut ctx.accounts.reward_vault;
    rv.total_claimed = rv
        .total_claimed
        .checked_add(amount)
        .ok_or(LootboxError::MathOverflow)?;

    unlock(&mut ctx.accounts.config);

    emit!(RewardClaimed {
        user: ctx.accounts.user.key(),
        mint: ctx.accounts.reward_balance.mint,
        amount,
    });
    Ok(())
}

/// Settles every supplied balance it can. A token that cannot be paid is
/// reported in `failed` and keeps its balance; the call only fails when
/// nothing settles.
pub fn claim_all<'info>(ctx: Context<'_, '_, 'info, 'info, ClaimAll<'info>>) -> Result<()> {
    when_not_paused(&ctx.accounts.config)?;

    let remaining = ctx.remaining_accounts;
    require!(
        !remaining.is_empty() && remaining.len() % CLAIM_ALL_STRIDE == 0,
        LootboxError::AccountMismatch
    );
    require!(
        remaining.len() / CLAIM_ALL_STRIDE <= MAX_CLAIM_BATCH,
        LootboxError::TooManyEntries
    );

    non_reentrant(&mut ctx.accounts.config)?;

    let program_id = ctx.program_id;
    let user = ctx.accounts.user.key();
    let config_info = ctx.accounts.config.to_account_info();
    let config_bump = ctx.accounts.config.bump;
    let token_program = ctx.accounts.token_program.to_account_info();

    let mut tally = ClaimTally::default();

    for chunk in remaining.chunks(CLAIM_ALL_STRIDE) {
        let (balance_ai, reward_vault_ai, vault_ai, dest_ai) =
            (&chunk[0], &chunk[1], &chunk[2], &chunk[3]);

        let mut balance = Account::<RewardBalance>::try_from(balance_ai)?;
        let mint = balance.mint;
        let (expected_balance, _) = balance_pda(program_id, &user, &mint);
        require_keys_eq!(expected_balance, *balance_ai.key, LootboxError::AccountMismatch);

        // vault plumbing mismatches are caller errors, not transfer failures
        let mut reward_vault = Account::<RewardVault>::try_from(reward_vault_ai)?;
        let (expected_rv, _) =
            Pubkey::find_program_address(&[REWARD_VAULT_SEED, mint.as_ref()], program_id);
        require_keys_eq!(expected_rv, *reward_vault_ai.key, LootboxError::AccountMismatch);
        require_keys_eq!(reward_vault.vault, *vault_ai.key, LootboxError::AccountMismatch);

        let vault = Account::<TokenAccount>::try_from(vault_ai)?;
        let destination = Account::<TokenAccount>::try_from(dest_ai)
            .ok()
            .map(|d| Destination {
                mint: d.mint,
                owner: d.owner,
                frozen: d.is_frozen(),
            });

        let outcome = settle_balance(
            &user,
            &mut balance,
            vault.amount,
            vault.is_frozen(),
            destination,
        )?;

        if outcome == Settlement::Fail {
            msg!("claim_all: {} not settled, balance kept", mint);
        }
        if let Settlement::Pay(amount) = outcome {
            balance.exit(program_id)?;

            transfer_from_vault(
                token_program.clone(),
                vault_ai.clone(),
                dest_ai.clone(),
                config_info.clone(),
                config_bump,
                amount,
            )?;

            reward_vault.total_claimed = reward_vault
                .total_claimed
                .checked_add(amount)
                .ok_or(LootboxError::MathOverflow)?;
            reward_vault.exit(program_id)?;

            emit!(RewardClaimed { user, mint, amount });
        }
        tally.record(mint, outcome);
    }

    let ClaimTally { claimed, failed } = tally.finish()?;

    unlock(&mut ctx.accounts.config);

    emit!(ClaimAllSettled {
        user,
        claimed,
        failed,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(mint: Pubkey, owner: Pubkey) -> Option<Destination> {
        Some(Destination {
            mint,
            owner,
            frozen: false,
        })
    }

    #[test]
    fn pays_exact_balance_when_everything_lines_up() {
        let user = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert_eq!(
            plan_settlement(&user, &mint, 40, 100, false, dest(mint, user)),
            Settlement::Pay(40)
        );
        // vault exactly covering the balance is enough
        assert_eq!(
            plan_settlement(&user, &mint, 100, 100, false, dest(mint, user)),
            Settlement::Pay(100)
        );
    }

    #[test]
    fn zero_balance_is_skipped_not_failed() {
        let user = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert_eq!(
            plan_settlement(&user, &mint, 0, 0, true, None),
            Settlement::Skip
        );
    }

    #[test]
    fn unpayable_tokens_fail_in_isolation() {
        let user = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        // vault short
        assert_eq!(
            plan_settlement(&user, &mint, 50, 49, false, dest(mint, user)),
            Settlement::Fail
        );
        // vault frozen
        assert_eq!(
            plan_settlement(&user, &mint, 50, 50, true, dest(mint, user)),
            Settlement::Fail
        );
        // not a token account
        assert_eq!(
            plan_settlement(&user, &mint, 50, 50, false, None),
            Settlement::Fail
        );
        // wrong mint / wrong owner
        assert_eq!(
            plan_settlement(&user, &mint, 50, 50, false, dest(Pubkey::new_unique(), user)),
            Settlement::Fail
        );
        assert_eq!(
            plan_settlement(&user, &mint, 50, 50, false, dest(mint, Pubkey::new_unique())),
            Settlement::Fail
        );
        // frozen destination
        let frozen = Some(Destination {
            mint,
            owner: user,
            frozen: true,
        });
        assert_eq!(
            plan_settlement(&user, &mint, 50, 50, false, frozen),
            Settlement::Fail
        );
    }

    #[test]
    fn failed_token_keeps_its_balance() {
        let user = Pubkey::new_unique();
        let good = Pubkey::new_unique();
        let bad = Pubkey::new_unique();
        let empty = Pubkey::new_unique();

        let mut balances = vec![
            RewardBalance {
                user,
                mint: good,
                amount: 10,
                ..Default::default()
            },
            RewardBalance {
                user,
                mint: bad,
                amount: 20,
                ..Default::default()
            },
            RewardBalance {
                user,
                mint: empty,
                ..Default::default()
            },
        ];
        let vaults = [100u64, 5, 100];

        let mut tally = ClaimTally::default();
        for (b, vault_amount) in balances.iter_mut().zip(vaults) {
            let mint = b.mint;
            let outcome = settle_balance(&user, b, vault_amount, false, dest(mint, user)).unwrap();
            tally.record(mint, outcome);
        }
        let tally = tally.finish().unwrap();

        assert_eq!(tally.claimed, vec![RewardEntry { mint: good, amount: 10 }]);
        assert_eq!(tally.failed, vec![bad]);
        assert_eq!(balances[0].amount, 0);
        assert_eq!(balances[0].total_claimed, 10);
        assert_eq!(balances[1].amount, 20);
        assert_eq!(balances[1].total_claimed, 0);
    }

    #[test]
    fn nothing_settled_fails_the_batch() {
        let user = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let mut b = RewardBalance {
            user,
            mint,
            amount: 30,
            ..Default::default()
        };

        let mut tally = ClaimTally::default();
        let outcome = settle_balance(&user, &mut b, 30, true, dest(mint, user)).unwrap();
        assert_eq!(outcome, Settlement::Fail);
        tally.record(mint, outcome);

        let expected: anchor_lang::error::Error = LootboxError::NoRewardsClaimed.into();
        assert_eq!(tally.finish().unwrap_err(), expected);
        assert_eq!(b.amount, 30);
    }
}
