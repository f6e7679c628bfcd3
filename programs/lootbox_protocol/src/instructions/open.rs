use anchor_lang::prelude::*;
use anchor_lang::solana_program::{program::invoke, system_instruction};

use crate::constants::*;
use crate::errors::LootboxError;
use crate::events::{BoxOpened, RandomnessRequested};
use crate::guards::{non_reentrant, unlock, when_not_paused};
use crate::state::{
    cooldown_left, BoxTier, Config, IdentityRecord, PendingRequest, UsedNonce, UserProfile,
};
use crate::utils::{
    assert_ed25519_ix_matches, create_pda_account, free_open_digest, identity_key, is_vacant_pda,
    load_preceding_ed25519_ix, signed_message_hash, IDENTITY_NONCE_SEED, WALLET_NONCE_SEED,
};
use crate::{OpenBox, OpenFreeBox};

/// Paid tiers. Only `price` lamports leave the wallet; the excess over the
/// price is never debited and is reported as `refund`.
pub fn open_box(ctx: Context<OpenBox>, tier: BoxTier, payment: u64) -> Result<u64> {
    when_not_paused(&ctx.accounts.config)?;
    require!(!tier.is_free(), LootboxError::FreeTierRequiresAuthorization);

    let price = ctx.accounts.config.price(tier);
    let refund = ctx.accounts.config.check_open(tier, payment)?;

    non_reentrant(&mut ctx.accounts.config)?;

    if price > 0 {
        let ix = system_instruction::transfer(
            &ctx.accounts.user.key(),
            &ctx.accounts.treasury_sol.key(),
            price,
        );
        invoke(
            &ix,
            &[
                ctx.accounts.user.to_account_info(),
                ctx.accounts.treasury_sol.to_account_info(),
                ctx.accounts.system_program.to_account_info(),
            ],
        )?;
    }

    let user = ctx.accounts.user.key();
    let now = Clock::get()?.unix_timestamp;

    touch_profile(&mut ctx.accounts.user_profile, user, ctx.bumps.user_profile)?;

    let cfg = &mut ctx.accounts.config;
    let request_id = record_request(
        cfg,
        &mut ctx.accounts.pending,
        ctx.bumps.pending,
        user,
        tier,
        now,
    )?;
    unlock(cfg);

    emit_request(cfg, request_id);
    emit!(BoxOpened {
        request_id,
        user,
        tier,
        price,
        refund,
    });

    Ok(request_id)
}

/// Free tier. The transaction must carry an ed25519 verify instruction, signed
/// by `config.signer`, right before this one.
pub fn open_free_box(
    ctx: Context<OpenFreeBox>,
    identity: String,
    identity_key_arg: [u8; 32],
    nonce: u64,
) -> Result<u64> {
    let cfg = &ctx.accounts.config;
    when_not_paused(cfg)?;

    require!(
        !identity.is_empty() && identity.len() <= MAX_IDENTITY_LEN,
        LootboxError::InvalidIdentity
    );
    require!(
        identity_key(&identity) == identity_key_arg,
        LootboxError::InvalidIdentity
    );

    cfg.check_open(BoxTier::Free, 0)?;

    let user = ctx.accounts.user.key();
    let wallet_nonce = ctx.accounts.wallet_nonce.to_account_info();
    let identity_nonce = ctx.accounts.identity_nonce.to_account_info();
    let now = Clock::get()?.unix_timestamp;

    let gate = FreeOpenGate {
        signer: cfg.signer,
        wallet_nonce_used: !is_vacant_pda(&wallet_nonce),
        identity_nonce_used: !is_vacant_pda(&identity_nonce),
    };
    let stamp = FreeOpenStamp {
        wallet: user,
        identity_key: identity_key_arg,
        record_bump: ctx.bumps.identity_record,
    };
    let instructions = ctx.accounts.instructions.to_account_info();

    gate.admit_and_stamp(
        &mut ctx.accounts.user_profile,
        &mut ctx.accounts.identity_record,
        &stamp,
        now,
        |signer| {
            let digest = free_open_digest(
                ctx.program_id,
                cfg.domain_id,
                &user,
                &identity,
                BoxTier::Free,
                nonce,
            );
            let expected = signed_message_hash(&digest);
            let ed_ix = load_preceding_ed25519_ix(&instructions)?;
            assert_ed25519_ix_matches(&ed_ix, signer, &expected)
        },
    )?;
    touch_profile(&mut ctx.accounts.user_profile, user, ctx.bumps.user_profile)?;

    // --- effects: consume nonce in both sets ---
    let payer = ctx.accounts.user.to_account_info();
    let system = ctx.accounts.system_program.to_account_info();
    let nonce_le = nonce.to_le_bytes();
    let space = 8 + UsedNonce::INIT_SPACE;

    let wallet_bump = ctx.bumps.wallet_nonce;
    create_pda_account(
        ctx.program_id,
        &payer,
        &wallet_nonce,
        &system,
        &[WALLET_NONCE_SEED, user.as_ref(), &nonce_le, &[wallet_bump]],
        space,
        &UsedNonce {
            key: user.to_bytes(),
            nonce,
            used_at: now,
            bump: wallet_bump,
        },
    )?;

    let identity_bump = ctx.bumps.identity_nonce;
    create_pda_account(
        ctx.program_id,
        &payer,
        &identity_nonce,
        &system,
        &[IDENTITY_NONCE_SEED, identity_key_arg.as_ref(), &nonce_le, &[identity_bump]],
        space,
        &UsedNonce {
            key: identity_key_arg,
            nonce,
            used_at: now,
            bump: identity_bump,
        },
    )?;

    let request_id = record_request(
        &mut ctx.accounts.config,
        &mut ctx.accounts.pending,
        ctx.bumps.pending,
        user,
        BoxTier::Free,
        now,
    )?;

    emit_request(&ctx.accounts.config, request_id);
    emit!(BoxOpened {
        request_id,
        user,
        tier: BoxTier::Free,
        price: 0,
        refund: 0,
    });

    Ok(request_id)
}

/// Free-tier facts that live outside the profile and identity record.
#[derive(Clone, Copy, Debug)]
pub struct FreeOpenGate {
    pub signer: Pubkey,
    pub wallet_nonce_used: bool,
    pub identity_nonce_used: bool,
}

pub struct FreeOpenStamp {
    pub wallet: Pubkey,
    pub identity_key: [u8; 32],
    pub record_bump: u8,
}

impl FreeOpenGate {
    /// Checks, in order: signing key configured, nonce unused for both keys,
    /// authorization signature (`verify`), both cooldown windows elapsed.
    pub fn admit<F>(
        &self,
        profile: &UserProfile,
        record: &IdentityRecord,
        now: i64,
        verify: F,
    ) -> Result<()>
    where
        F: FnOnce(&Pubkey) -> Result<()>,
    {
        require!(self.signer != Pubkey::default(), LootboxError::SignerNotSet);
        require!(
            !self.wallet_nonce_used && !self.identity_nonce_used,
            LootboxError::NonceAlreadyUsed
        );

        verify(&self.signer)?;

        require!(
            cooldown_left(profile.last_free_open_at, now) == 0,
            LootboxError::CooldownActive
        );
        require!(
            cooldown_left(record.last_free_open_at, now) == 0,
            LootboxError::CooldownActive
        );
        Ok(())
    }

    /// Admits, then starts both cooldown windows at `now`. Nothing is written
    /// when admission fails.
    pub fn admit_and_stamp<F>(
        &self,
        profile: &mut UserProfile,
        record: &mut IdentityRecord,
        stamp: &FreeOpenStamp,
        now: i64,
        verify: F,
    ) -> Result<()>
    where
        F: FnOnce(&Pubkey) -> Result<()>,
    {
        self.admit(profile, record, now, verify)?;

        profile.last_free_open_at = now;

        record.identity_key = stamp.identity_key;
        record.bump = stamp.record_bump;
        record.last_free_open_at = now;
        record.last_wallet = stamp.wallet;
        Ok(())
    }
}

fn touch_profile(profile: &mut UserProfile, user: Pubkey, bump: u8) -> Result<()> {
    if profile.user == Pubkey::default() {
        profile.user = user;
        profile.bump = bump;
    }
    profile.opened_count = profile
        .opened_count
        .checked_add(1)
        .ok_or(LootboxError::MathOverflow)?;
    Ok(())
}

/// NONE -> PENDING. Captures the current oracle as the only key allowed to
/// answer this request.
pub fn record_request(
    cfg: &mut Config,
    pending: &mut PendingRequest,
    pending_bump: u8,
    user: Pubkey,
    tier: BoxTier,
    now: i64,
) -> Result<u64> {
    let request_id = cfg.allocate_request_id()?;

    pending.request_id = request_id;
    pending.user = user;
    pending.tier = tier.as_u8();
    pending.provider = cfg.oracle;
    pending.requested_at = now;
    pending.bump = pending_bump;

    cfg.track_pending()?;
    Ok(request_id)
}

fn emit_request(cfg: &Config, request_id: u64) {
    emit!(RandomnessRequested {
        request_id,
        provider: cfg.oracle,
        key_hash: cfg.key_hash,
        min_confirmations: cfg.min_confirmations,
        callback_compute_limit: cfg.callback_compute_limit,
        num_words: RANDOM_WORDS_PER_REQUEST,
    });
}
