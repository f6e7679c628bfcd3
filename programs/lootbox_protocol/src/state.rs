use std::collections::BTreeSet;

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::errors::LootboxError;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, InitSpace, Debug)]
pub enum BoxTier {
    Free,
    Bronze,
    Silver,
    Gold,
}

impl BoxTier {
    pub const ALL: [BoxTier; TIER_COUNT] =
        [BoxTier::Free, BoxTier::Bronze, BoxTier::Silver, BoxTier::Gold];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_free(self) -> bool {
        self == BoxTier::Free
    }

    pub fn from_u8(v: u8) -> Result<BoxTier> {
        BoxTier::ALL
            .get(v as usize)
            .copied()
            .ok_or_else(|| error!(LootboxError::InvalidTier))
    }
}

/// Inclusive amount bounds used when deriving a reward amount.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AmountRange {
    pub min: u64,
    pub max: u64,
}

impl AmountRange {
    pub fn contains(&self, amount: u64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, PartialEq, Eq, InitSpace, Debug)]
pub struct TierConfig {
    pub min_amount: u64,
    pub max_amount: u64,
    pub reward_count: u8,
    pub enabled: bool,
}

impl TierConfig {
    pub fn validate(&self) -> Result<()> {
        require!(
            self.min_amount > 0 && self.max_amount >= self.min_amount,
            LootboxError::InvalidRange
        );
        require!(
            self.reward_count <= MAX_REWARD_COUNT,
            LootboxError::InvalidRewardCount
        );
        if self.enabled {
            require!(self.reward_count > 0, LootboxError::InvalidRewardCount);
        }
        Ok(())
    }

    pub fn range(&self) -> AmountRange {
        AmountRange {
            min: self.min_amount,
            max: self.max_amount,
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, InitSpace, Debug)]
pub struct RewardEntry {
    pub mint: Pubkey,
    pub amount: u64,
}

#[account]
#[derive(InitSpace, Default)]
pub struct Config {
    pub owner: Pubkey,
    /// Proposed owner; `Pubkey::default()` when no handover is in flight.
    pub pending_owner: Pubkey,
    pub bump: u8,

    pub paused: bool,
    /// Reentrancy lock, only ever true inside an instruction.
    pub locked: bool,
    pub version: u16,

    /// Deployment identifier mixed into free-open authorizations.
    pub domain_id: u64,

    // free-tier authorization key (ed25519)
    pub signer: Pubkey,

    // randomness provider
    pub oracle: Pubkey,
    pub key_hash: [u8; 32],
    pub min_confirmations: u16,
    pub callback_compute_limit: u32,

    pub next_request_id: u64,
    pub pending_count: u64,
    pub total_opened: u64,
    pub total_fulfilled: u64,

    // native payments land here (system-owned PDA)
    pub treasury_sol: Pubkey,
    pub treasury_sol_bump: u8,
    pub emergency_withdrawn_lamports: u64,

    pub prices: [u64; TIER_COUNT],
    pub tiers: [TierConfig; TIER_COUNT],

    /// Eligible reward mints, ordered and deduplicated.
    /// NOTE: fixed max_len to keep account size deterministic.
    #[max_len(100)]
    pub reward_mints: Vec<Pubkey>,
}

impl Config {
    pub fn tier(&self, tier: BoxTier) -> &TierConfig {
        &self.tiers[tier.index()]
    }

    pub fn price(&self, tier: BoxTier) -> u64 {
        self.prices[tier.index()]
    }

    pub fn is_reward_mint(&self, mint: &Pubkey) -> bool {
        self.reward_mints.contains(mint)
    }

    pub fn set_tier(&mut self, tier: BoxTier, cfg: TierConfig) -> Result<()> {
        cfg.validate()?;
        self.tiers[tier.index()] = cfg;
        Ok(())
    }

    pub fn set_price(&mut self, tier: BoxTier, price: u64) -> Result<()> {
        if tier.is_free() {
            require!(price == 0, LootboxError::InvalidPrice);
        }
        self.prices[tier.index()] = price;
        Ok(())
    }

    /// Replaces the eligible set. Entries absent from `mints` lose membership.
    pub fn replace_reward_mints(&mut self, mints: &[Pubkey]) -> Result<()> {
        self.reward_mints = dedup_reward_mints(mints)?;
        Ok(())
    }

    /// Checks every open precondition that depends on configuration alone and
    /// returns the refund owed to the caller (`payment - price`).
    pub fn check_open(&self, tier: BoxTier, payment: u64) -> Result<u64> {
        let t = self.tier(tier);
        require!(t.enabled, LootboxError::TierDisabled);
        t.validate()?;
        require!(!self.reward_mints.is_empty(), LootboxError::NoRewardTokens);
        require!(
            (t.reward_count as usize) <= self.reward_mints.len(),
            LootboxError::InvalidRewardCount
        );
        require!(self.oracle != Pubkey::default(), LootboxError::OracleNotSet);

        split_payment(payment, self.price(tier))
    }

    pub fn allocate_request_id(&mut self) -> Result<u64> {
        let id = self.next_request_id;
        self.next_request_id = id.checked_add(1).ok_or(LootboxError::MathOverflow)?;
        Ok(id)
    }

    pub fn track_pending(&mut self) -> Result<()> {
        self.pending_count = self
            .pending_count
            .checked_add(1)
            .ok_or(LootboxError::MathOverflow)?;
        self.total_opened = self
            .total_opened
            .checked_add(1)
            .ok_or(LootboxError::MathOverflow)?;
        Ok(())
    }

    pub fn release_pending(&mut self) -> Result<()> {
        self.pending_count = self
            .pending_count
            .checked_sub(1)
            .ok_or(LootboxError::PendingCountUnderflow)?;
        Ok(())
    }
}

/// Returns the refund for `payment` against `price`.
pub fn split_payment(payment: u64, price: u64) -> Result<u64> {
    require!(payment >= price, LootboxError::InsufficientPayment);
    Ok(payment - price)
}

/// Drops repeats (first occurrence wins), rejects the default pubkey and caps
/// the resulting cardinality.
pub fn dedup_reward_mints(mints: &[Pubkey]) -> Result<Vec<Pubkey>> {
    let mut seen: BTreeSet<Pubkey> = BTreeSet::new();
    let mut out = Vec::with_capacity(mints.len().min(MAX_REWARD_MINTS));

    for mint in mints {
        require!(*mint != Pubkey::default(), LootboxError::ZeroToken);
        if seen.insert(*mint) {
            out.push(*mint);
        }
    }

    require!(out.len() <= MAX_REWARD_MINTS, LootboxError::TooManyRewardMints);
    Ok(out)
}

/// Seconds left before another free open is admitted. Zero when the key has
/// never opened or the window has elapsed.
pub fn cooldown_left(last_free_open_at: i64, now: i64) -> i64 {
    if last_free_open_at == 0 {
        return 0;
    }
    let ready_at = last_free_open_at.saturating_add(COOLDOWN_SECONDS);
    ready_at.saturating_sub(now).max(0)
}

/// Per-(tier, mint) amount override.
/// Seeds: `[TOKEN_RANGE_SEED, [tier], mint]`
#[account]
#[derive(InitSpace, Default)]
pub struct TokenRange {
    pub tier: u8,
    pub mint: Pubkey,
    pub min_amount: u64,
    pub max_amount: u64,
    pub enabled: bool,
    pub bump: u8,
}

impl TokenRange {
    pub fn validate_bounds(min_amount: u64, max_amount: u64) -> Result<()> {
        require!(max_amount >= min_amount, LootboxError::InvalidRange);
        Ok(())
    }
}

/// Override when present and enabled, otherwise the tier default.
pub fn effective_range(tier: &TierConfig, token_range: Option<&TokenRange>) -> AmountRange {
    match token_range {
        Some(r) if r.enabled => AmountRange {
            min: r.min_amount,
            max: r.max_amount,
        },
        _ => tier.range(),
    }
}

/// Seeds: `[PENDING_SEED, request_id]`
///
/// Lives from open until fulfillment or cancellation; closing it is the
/// terminal transition.
#[account]
#[derive(InitSpace, Default)]
pub struct PendingRequest {
    pub request_id: u64,
    pub user: Pubkey,
    pub tier: u8,
    /// Oracle authority captured at request time; only it may fulfill.
    pub provider: Pubkey,
    pub requested_at: i64,
    pub bump: u8,
}

/// Seeds: `[USER_SEED, wallet]`
#[account]
#[derive(InitSpace, Default)]
pub struct UserProfile {
    pub user: Pubkey,
    pub bump: u8,
    pub last_free_open_at: i64,
    pub opened_count: u64,

    pub last_request_id: u64,
    #[max_len(10)]
    pub last_reward: Vec<RewardEntry>,
}

/// Seeds: `[IDENTITY_SEED, identity_key]`
#[account]
#[derive(InitSpace, Default)]
pub struct IdentityRecord {
    pub identity_key: [u8; 32],
    pub bump: u8,
    pub last_free_open_at: i64,
    pub last_wallet: Pubkey,
}

/// Marker for a consumed authorization nonce. Existence means used; these
/// accounts are never closed.
/// Seeds: `[WALLET_NONCE_SEED, wallet, nonce]` or `[IDENTITY_NONCE_SEED, identity_key, nonce]`
#[account]
#[derive(InitSpace, Default)]
pub struct UsedNonce {
    pub key: [u8; 32],
    pub nonce: u64,
    pub used_at: i64,
    pub bump: u8,
}

/// Claimable balance of one user for one mint.
/// Seeds: `[BALANCE_SEED, user, mint]`
#[account]
#[derive(InitSpace, Default)]
pub struct RewardBalance {
    pub user: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub total_credited: u64,
    pub total_claimed: u64,
    pub bump: u8,
}

impl RewardBalance {
    pub fn credit(&mut self, amount: u64) -> Result<()> {
        self.amount = self
            .amount
            .checked_add(amount)
            .ok_or(LootboxError::MathOverflow)?;
        self.total_credited = self
            .total_credited
            .checked_add(amount)
            .ok_or(LootboxError::MathOverflow)?;
        Ok(())
    }

    /// Zeroes the balance and returns what was owed.
    pub fn take(&mut self) -> Result<u64> {
        let amount = self.amount;
        require!(amount > 0, LootboxError::NothingToClaim);

        self.amount = 0;
        self.total_claimed = self
            .total_claimed
            .checked_add(amount)
            .ok_or(LootboxError::MathOverflow)?;
        Ok(amount)
    }
}

/// Bookkeeping for the config-owned token account holding one reward mint.
/// Seeds: `[REWARD_VAULT_SEED, mint]`
#[account]
#[derive(InitSpace, Default)]
pub struct RewardVault {
    pub mint: Pubkey,
    pub vault: Pubkey,
    pub bump: u8,
    pub vault_bump: u8,

    pub total_funded: u64,
    pub total_claimed: u64,
    /// Audit only; never reconciled against reward balances.
    pub emergency_withdrawn: u64,
}

/// Snapshot returned by the `engine_state` view.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug)]
pub struct EngineSnapshot {
    pub owner: Pubkey,
    pub pending_owner: Pubkey,
    pub paused: bool,
    pub signer: Pubkey,
    pub oracle: Pubkey,
    pub pending_count: u64,
    pub next_request_id: u64,
    pub total_opened: u64,
    pub total_fulfilled: u64,
    pub reward_mint_count: u32,
    pub emergency_withdrawn_lamports: u64,
}

impl From<&Config> for EngineSnapshot {
    fn from(cfg: &Config) -> Self {
        Self {
            owner: cfg.owner,
            pending_owner: cfg.pending_owner,
            paused: cfg.paused,
            signer: cfg.signer,
            oracle: cfg.oracle,
            pending_count: cfg.pending_count,
            next_request_id: cfg.next_request_id,
            total_opened: cfg.total_opened,
            total_fulfilled: cfg.total_fulfilled,
            reward_mint_count: cfg.reward_mints.len() as u32,
            emergency_withdrawn_lamports: cfg.emergency_withdrawn_lamports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(min: u64, max: u64, count: u8, enabled: bool) -> TierConfig {
        TierConfig {
            min_amount: min,
            max_amount: max,
            reward_count: count,
            enabled,
        }
    }

    fn ready_config(mints: usize) -> Config {
        let mut cfg = Config {
            oracle: Pubkey::new_unique(),
            next_request_id: INITIAL_REQUEST_ID,
            ..Default::default()
        };
        let list: Vec<Pubkey> = (0..mints).map(|_| Pubkey::new_unique()).collect();
        cfg.replace_reward_mints(&list).unwrap();
        cfg.set_tier(BoxTier::Free, tier(100, 250, 1, true)).unwrap();
        cfg.set_tier(BoxTier::Silver, tier(500, 1_000, 2, true)).unwrap();
        cfg.set_price(BoxTier::Silver, 1_000_000).unwrap();
        cfg
    }

    #[test]
    fn tier_validation_rejects_bad_ranges_and_counts() {
        assert!(tier(0, 10, 1, true).validate().is_err());
        assert!(tier(10, 9, 1, true).validate().is_err());
        assert!(tier(10, 10, 0, true).validate().is_err());
        assert!(tier(10, 10, MAX_REWARD_COUNT + 1, false).validate().is_err());

        assert!(tier(10, 10, 0, false).validate().is_ok());
        assert!(tier(10, 20, 3, true).validate().is_ok());
    }

    #[test]
    fn tier_round_trips_through_its_index() {
        for t in BoxTier::ALL {
            assert_eq!(BoxTier::from_u8(t.as_u8()).unwrap(), t);
        }
        assert!(BoxTier::from_u8(TIER_COUNT as u8).is_err());
    }

    #[test]
    fn free_tier_price_must_stay_zero() {
        let mut cfg = Config::default();
        assert!(cfg.set_price(BoxTier::Free, 1).is_err());
        assert!(cfg.set_price(BoxTier::Free, 0).is_ok());
        assert!(cfg.set_price(BoxTier::Gold, 0).is_ok());
        assert!(cfg.set_price(BoxTier::Gold, 42).is_ok());
        assert_eq!(cfg.price(BoxTier::Gold), 42);
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let c = Pubkey::new_unique();

        let out = dedup_reward_mints(&[b, a, b, c, a]).unwrap();
        assert_eq!(out, vec![b, a, c]);
    }

    #[test]
    fn dedup_rejects_default_and_caps_size() {
        let a = Pubkey::new_unique();
        assert!(dedup_reward_mints(&[a, Pubkey::default()]).is_err());

        let too_many: Vec<Pubkey> = (0..=MAX_REWARD_MINTS).map(|_| Pubkey::new_unique()).collect();
        assert!(dedup_reward_mints(&too_many).is_err());

        // repeats do not count against the cap
        let mut at_cap: Vec<Pubkey> = (0..MAX_REWARD_MINTS).map(|_| Pubkey::new_unique()).collect();
        at_cap.push(at_cap[0]);
        assert_eq!(dedup_reward_mints(&at_cap).unwrap().len(), MAX_REWARD_MINTS);
    }

    #[test]
    fn replacing_mints_drops_old_membership() {
        let mut cfg = Config::default();
        let old = Pubkey::new_unique();
        let new = Pubkey::new_unique();

        cfg.replace_reward_mints(&[old]).unwrap();
        assert!(cfg.is_reward_mint(&old));

        cfg.replace_reward_mints(&[new, new]).unwrap();
        assert!(!cfg.is_reward_mint(&old));
        assert!(cfg.is_reward_mint(&new));
        assert_eq!(cfg.reward_mints.len(), 1);
    }

    #[test]
    fn check_open_returns_exact_refund() {
        let cfg = ready_config(3);
        let price = cfg.price(BoxTier::Silver);

        assert!(cfg.check_open(BoxTier::Silver, price - 1).is_err());
        assert_eq!(cfg.check_open(BoxTier::Silver, price).unwrap(), 0);
        assert_eq!(cfg.check_open(BoxTier::Silver, price + 777).unwrap(), 777);
    }

    #[test]
    fn check_open_enforces_tier_and_token_preconditions() {
        let cfg = ready_config(3);
        // Gold never configured -> disabled
        assert!(cfg.check_open(BoxTier::Gold, u64::MAX).is_err());

        // more rewards than tokens
        let mut cfg = ready_config(1);
        assert!(cfg.check_open(BoxTier::Silver, u64::MAX).is_err());
        cfg.replace_reward_mints(&[]).unwrap();
        assert!(cfg.check_open(BoxTier::Free, 0).is_err());

        let mut cfg = ready_config(3);
        cfg.oracle = Pubkey::default();
        assert!(cfg.check_open(BoxTier::Free, 0).is_err());
    }

    #[test]
    fn pending_count_tracks_and_never_underflows() {
        let mut cfg = ready_config(1);
        assert!(cfg.release_pending().is_err());

        let first = cfg.allocate_request_id().unwrap();
        cfg.track_pending().unwrap();
        let second = cfg.allocate_request_id().unwrap();
        cfg.track_pending().unwrap();

        assert_eq!(second, first + 1);
        assert_eq!(cfg.pending_count, 2);
        assert_eq!(cfg.total_opened, 2);

        cfg.release_pending().unwrap();
        cfg.release_pending().unwrap();
        assert_eq!(cfg.pending_count, 0);
        assert!(cfg.release_pending().is_err());
    }

    #[test]
    fn cooldown_window_is_24_hours() {
        let t0 = 1_700_000_000;
        assert_eq!(cooldown_left(0, t0), 0);
        assert_eq!(cooldown_left(t0, t0), COOLDOWN_SECONDS);
        assert_eq!(cooldown_left(t0, t0 + COOLDOWN_SECONDS - 1), 1);
        assert_eq!(cooldown_left(t0, t0 + COOLDOWN_SECONDS), 0);
        assert_eq!(cooldown_left(t0, t0 + 10 * COOLDOWN_SECONDS), 0);
    }

    #[test]
    fn effective_range_prefers_enabled_override() {
        let t = tier(100, 250, 1, true);
        let mut r = TokenRange {
            min_amount: 5,
            max_amount: 7,
            enabled: false,
            ..Default::default()
        };

        assert_eq!(effective_range(&t, None), AmountRange { min: 100, max: 250 });
        assert_eq!(effective_range(&t, Some(&r)), AmountRange { min: 100, max: 250 });

        r.enabled = true;
        assert_eq!(effective_range(&t, Some(&r)), AmountRange { min: 5, max: 7 });
        assert!(TokenRange::validate_bounds(7, 5).is_err());
        assert!(TokenRange::validate_bounds(0, 0).is_ok());
    }

    #[test]
    fn balance_take_zeroes_and_second_take_fails() {
        let mut b = RewardBalance::default();
        assert!(b.take().is_err());

        b.credit(40).unwrap();
        b.credit(2).unwrap();
        assert_eq!(b.take().unwrap(), 42);
        assert_eq!(b.amount, 0);
        assert_eq!(b.total_credited, 42);
        assert_eq!(b.total_claimed, 42);

        assert!(b.take().is_err());
        b.amount = u64::MAX;
        assert!(b.credit(1).is_err());
    }
}
