use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::sysvar::instructions::{
    load_current_index_checked, load_instruction_at_checked,
};
use anchor_lang::solana_program::program::{invoke, invoke_signed};
use anchor_lang::solana_program::{system_instruction, system_program};
use anchor_spl::token::{self, Transfer};
use solana_sha256_hasher::hashv;

use crate::errors::LootboxError;
use crate::state::BoxTier;

// Ed25519SigVerify111111111111111111111111111
pub fn ed25519_program_id() -> Pubkey {
    Pubkey::new_from_array([
        3, 125, 70, 214, 124, 147, 251, 190, 18, 249, 66, 143, 131, 141, 64, 255,
        5, 112, 116, 73, 39, 244, 138, 100, 252, 202, 112, 68, 128, 0, 0, 0,
    ])
}

// -----------------
// Seeds
// -----------------
pub const CONFIG_SEED: &[u8] = b"config_v1";
pub const TREASURY_SOL_SEED: &[u8] = b"treasury_sol_v1";
pub const TOKEN_RANGE_SEED: &[u8] = b"token_range_v1";
pub const PENDING_SEED: &[u8] = b"pending_v1";
pub const USER_SEED: &[u8] = b"user_v1";
pub const IDENTITY_SEED: &[u8] = b"identity_v1";
pub const WALLET_NONCE_SEED: &[u8] = b"wallet_nonce_v1";
pub const IDENTITY_NONCE_SEED: &[u8] = b"identity_nonce_v1";
pub const BALANCE_SEED: &[u8] = b"balance_v1";
pub const REWARD_VAULT_SEED: &[u8] = b"reward_vault_v1";
pub const VAULT_SEED: &[u8] = b"vault_v1";

// -----------------
// Domain tags
// -----------------
pub const IDENTITY_TAG: &[u8] = b"lootbox-protocol:identity_v1";
pub const FREE_OPEN_TAG: &[u8] = b"lootbox-protocol:free_open_v1";
pub const SIGNED_MESSAGE_TAG: &[u8] = b"lootbox-protocol:signed_message_v1";

// ---------------
// Batch payloads
// ---------------
#[derive(AnchorSerialize, AnchorDeserialize, Clone)]
pub struct TokenRangeEntry {
    pub mint: Pubkey,
    pub min_amount: u64,
    pub max_amount: u64,
    pub enabled: bool,
}

// -------------------------
// PDA helpers
// -------------------------
pub fn balance_pda(program_id: &Pubkey, user: &Pubkey, mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[BALANCE_SEED, user.as_ref(), mint.as_ref()], program_id)
}

pub fn token_range_pda(program_id: &Pubkey, tier: BoxTier, mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[TOKEN_RANGE_SEED, &[tier.as_u8()], mint.as_ref()],
        program_id,
    )
}

pub fn vault_pda(program_id: &Pubkey, mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, mint.as_ref()], program_id)
}

/// A PDA that has never been initialized: no data, still owned by the system
/// program. Lamports alone do not count; anyone can send them to any address.
pub fn is_vacant_pda(target: &AccountInfo) -> bool {
    target.data_is_empty() && *target.owner == system_program::ID
}

/// How an uninitialized PDA gets turned into a program account.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PdaInit {
    /// Empty address: a single `create_account`.
    Create { lamports: u64 },
    /// Someone already funded the address: top up to rent exemption, then
    /// `allocate` + `assign`.
    Adopt { top_up: u64 },
}

pub fn plan_pda_init(current_lamports: u64, rent_minimum: u64) -> PdaInit {
    if current_lamports == 0 {
        PdaInit::Create {
            lamports: rent_minimum,
        }
    } else {
        PdaInit::Adopt {
            top_up: rent_minimum.saturating_sub(current_lamports),
        }
    }
}

/// Allocates a program-owned PDA (payer funds rent) and writes `value` into it.
/// Fails with `AccountMismatch` if the account already holds data or has been
/// assigned away from the system program.
pub fn create_pda_account<'info, T>(
    program_id: &Pubkey,
    payer: &AccountInfo<'info>,
    target: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    signer_seeds: &[&[u8]],
    space: usize,
    value: &T,
) -> Result<()>
where
    T: AccountSerialize,
{
    require!(is_vacant_pda(target), LootboxError::AccountMismatch);

    let rent_minimum = Rent::get()?.minimum_balance(space);

    match plan_pda_init(target.lamports(), rent_minimum) {
        PdaInit::Create { lamports } => {
            let ix = system_instruction::create_account(
                payer.key,
                target.key,
                lamports,
                space as u64,
                program_id,
            );
            invoke_signed(
                &ix,
                &[payer.clone(), target.clone(), system_program.clone()],
                &[signer_seeds],
            )?;
        }
        PdaInit::Adopt { top_up } => {
            if top_up > 0 {
                invoke(
                    &system_instruction::transfer(payer.key, target.key, top_up),
                    &[payer.clone(), target.clone(), system_program.clone()],
                )?;
            }
            invoke_signed(
                &system_instruction::allocate(target.key, space as u64),
                &[target.clone(), system_program.clone()],
                &[signer_seeds],
            )?;
            invoke_signed(
                &system_instruction::assign(target.key, program_id),
                &[target.clone(), system_program.clone()],
                &[signer_seeds],
            )?;
        }
    }

    write_account(target, value)
}

/// Rewrites an existing program account from its in-memory value.
pub fn write_account<T: AccountSerialize>(target: &AccountInfo<'_>, value: &T) -> Result<()> {
    let mut data = target
        .try_borrow_mut_data()
        .map_err(|_| error!(LootboxError::AccountBorrowFailed))?;
    let mut w = std::io::Cursor::new(&mut data[..]);
    value
        .try_serialize(&mut w)
        .map_err(|_| error!(LootboxError::AccountBorrowFailed))?;
    Ok(())
}

// -------------------------
// Token settlement
// -------------------------

/// Moves `amount` out of a config-owned vault. The SPL program either
/// succeeds or errors; any error aborts the caller.
pub fn transfer_from_vault<'info>(
    token_program: AccountInfo<'info>,
    vault: AccountInfo<'info>,
    destination: AccountInfo<'info>,
    config: AccountInfo<'info>,
    config_bump: u8,
    amount: u64,
) -> Result<()> {
    let signer_seeds: &[&[&[u8]]] = &[&[CONFIG_SEED, &[config_bump]]];

    token::transfer(
        CpiContext::new_with_signer(
            token_program,
            Transfer {
                from: vault,
                to: destination,
                authority: config,
            },
            signer_seeds,
        ),
        amount,
    )
}

// -------------------------
// Free-open authorization
// -------------------------

/// Fixed-size key for an external identity string, used in PDA seeds.
pub fn identity_key(identity: &str) -> [u8; 32] {
    hashv(&[IDENTITY_TAG, identity.as_bytes()]).to_bytes()
}

/// Digest over everything a free-open authorization binds to.
pub fn free_open_digest(
    program_id: &Pubkey,
    domain_id: u64,
    caller: &Pubkey,
    identity: &str,
    tier: BoxTier,
    nonce: u64,
) -> [u8; 32] {
    let identity_len = (identity.len() as u32).to_le_bytes();
    hashv(&[
        FREE_OPEN_TAG,
        caller.as_ref(),
        identity_len.as_ref(),
        identity.as_bytes(),
        &[tier.as_u8()],
        nonce.to_le_bytes().as_ref(),
        program_id.as_ref(),
        domain_id.to_le_bytes().as_ref(),
    ])
    .to_bytes()
}

/// Domain-separated hash the authority actually signs.
pub fn signed_message_hash(digest: &[u8; 32]) -> [u8; 32] {
    hashv(&[SIGNED_MESSAGE_TAG, digest.as_ref()]).to_bytes()
}

// -------------------------
// ed25519 introspection
// -------------------------
pub fn parse_ed25519_ix_pubkey_and_msg(ix: &Instruction) -> Result<(Pubkey, Vec<u8>)> {
    require_keys_eq!(
        ix.program_id,
        ed25519_program_id(),
        LootboxError::MissingOrInvalidEd25519Ix
    );

    // [num_sigs u8][pad u8][sig_off u16][sig_ix u16][pk_off u16][pk_ix u16]
    // [msg_off u16][msg_sz u16][msg_ix u16]
    let data = &ix.data;
    require!(data.len() >= 16, LootboxError::MissingOrInvalidEd25519Ix);
    require!(data[0] == 1, LootboxError::MissingOrInvalidEd25519Ix);

    let read_u16 = |at: usize| u16::from_le_bytes([data[at], data[at + 1]]);

    // all three pieces must live inside the verify instruction itself
    for at in [4usize, 8, 14] {
        require!(read_u16(at) == u16::MAX, LootboxError::MissingOrInvalidEd25519Ix);
    }

    let pk_off = read_u16(6) as usize;
    let msg_off = read_u16(10) as usize;
    let msg_sz = read_u16(12) as usize;

    require!(pk_off + 32 <= data.len(), LootboxError::MissingOrInvalidEd25519Ix);
    require!(msg_off + msg_sz <= data.len(), LootboxError::MissingOrInvalidEd25519Ix);

    let pk_bytes: [u8; 32] = data[pk_off..pk_off + 32]
        .try_into()
        .map_err(|_| error!(LootboxError::MissingOrInvalidEd25519Ix))?;

    Ok((
        Pubkey::new_from_array(pk_bytes),
        data[msg_off..msg_off + msg_sz].to_vec(),
    ))
}

pub fn assert_ed25519_ix_matches(
    ix: &Instruction,
    expected_signer: &Pubkey,
    expected_msg: &[u8],
) -> Result<()> {
    let (pk, msg) = parse_ed25519_ix_pubkey_and_msg(ix)?;

    require_keys_eq!(pk, *expected_signer, LootboxError::SignerMismatch);
    require!(msg.as_slice() == expected_msg, LootboxError::MessageMismatch);

    Ok(())
}

/// Tx layout must be: [ ed25519_verify, <current ix> ]
pub fn load_preceding_ed25519_ix(instructions_sysvar: &AccountInfo) -> Result<Instruction> {
    let current_ix = load_current_index_checked(instructions_sysvar)? as usize;
    require!(current_ix >= 1, LootboxError::MissingOrInvalidEd25519Ix);

    load_instruction_at_checked(current_ix - 1, instructions_sysvar)
        .map_err(|_| error!(LootboxError::MissingOrInvalidEd25519Ix))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Standard ed25519 verify layout:
    /// [num_sigs, pad, offsets(14), signature(64), pubkey(32), msg(N)]
    /// The signature itself is zeroed; only the program checks are under test.
    fn make_ed25519_ix(pubkey: [u8; 32], msg: &[u8], indices: [u16; 3]) -> Instruction {
        let sig_off: u16 = 16;
        let pk_off: u16 = sig_off + 64;
        let msg_off: u16 = pk_off + 32;

        let mut data = vec![0u8; msg_off as usize + msg.len()];
        data[0] = 1;

        let fields: [u16; 7] = [
            sig_off,
            indices[0],
            pk_off,
            indices[1],
            msg_off,
            msg.len() as u16,
            indices[2],
        ];
        for (i, v) in fields.iter().enumerate() {
            data[2 + i * 2..4 + i * 2].copy_from_slice(&v.to_le_bytes());
        }

        data[pk_off as usize..pk_off as usize + 32].copy_from_slice(&pubkey);
        data[msg_off as usize..].copy_from_slice(msg);

        Instruction {
            program_id: ed25519_program_id(),
            accounts: vec![],
            data,
        }
    }

    const SELF: [u16; 3] = [u16::MAX, u16::MAX, u16::MAX];

    #[test]
    fn accepts_matching_signer_and_message() {
        let signer = Pubkey::new_unique();
        let digest = free_open_digest(&crate::ID, 1, &Pubkey::new_unique(), "alice", BoxTier::Free, 9);
        let msg = signed_message_hash(&digest);

        let ix = make_ed25519_ix(signer.to_bytes(), &msg, SELF);
        assert!(assert_ed25519_ix_matches(&ix, &signer, &msg).is_ok());
    }

    #[test]
    fn rejects_wrong_signer_or_message() {
        let signer = Pubkey::new_unique();
        let msg = [1u8; 32];
        let ix = make_ed25519_ix(signer.to_bytes(), &msg, SELF);

        assert!(assert_ed25519_ix_matches(&ix, &Pubkey::new_unique(), &msg).is_err());
        assert!(assert_ed25519_ix_matches(&ix, &signer, &[2u8; 32]).is_err());
    }

    #[test]
    fn rejects_external_instruction_indices() {
        let signer = Pubkey::new_unique();
        let msg = [3u8; 32];

        for indices in [[0, u16::MAX, u16::MAX], [u16::MAX, 2, u16::MAX], [u16::MAX, u16::MAX, 7]] {
            let ix = make_ed25519_ix(signer.to_bytes(), &msg, indices);
            assert!(parse_ed25519_ix_pubkey_and_msg(&ix).is_err());
        }
    }

    #[test]
    fn rejects_other_programs_and_truncated_data() {
        let signer = Pubkey::new_unique();
        let mut ix = make_ed25519_ix(signer.to_bytes(), &[0u8; 32], SELF);
        ix.program_id = Pubkey::new_unique();
        assert!(parse_ed25519_ix_pubkey_and_msg(&ix).is_err());

        let mut short = make_ed25519_ix(signer.to_bytes(), &[0u8; 32], SELF);
        short.data.truncate(15);
        assert!(parse_ed25519_ix_pubkey_and_msg(&short).is_err());
    }

    #[test]
    fn digest_binds_every_field() {
        let caller = Pubkey::new_unique();
        let base = free_open_digest(&crate::ID, 1, &caller, "alice", BoxTier::Free, 5);

        assert_ne!(base, free_open_digest(&crate::ID, 2, &caller, "alice", BoxTier::Free, 5));
        assert_ne!(base, free_open_digest(&crate::ID, 1, &Pubkey::new_unique(), "alice", BoxTier::Free, 5));
        assert_ne!(base, free_open_digest(&crate::ID, 1, &caller, "alicf", BoxTier::Free, 5));
        assert_ne!(base, free_open_digest(&crate::ID, 1, &caller, "alice", BoxTier::Gold, 5));
        assert_ne!(base, free_open_digest(&crate::ID, 1, &caller, "alice", BoxTier::Free, 6));
        assert_ne!(base, free_open_digest(&Pubkey::new_unique(), 1, &caller, "alice", BoxTier::Free, 5));

        // the signed hash is domain separated from the raw digest
        assert_ne!(base, signed_message_hash(&base));
    }

    #[test]
    fn identity_key_is_stable_and_distinct() {
        assert_eq!(identity_key("discord:1234"), identity_key("discord:1234"));
        assert_ne!(identity_key("discord:1234"), identity_key("discord:1235"));
    }

    fn account_info<'a>(
        key: &'a Pubkey,
        owner: &'a Pubkey,
        lamports: &'a mut u64,
        data: &'a mut [u8],
    ) -> AccountInfo<'a> {
        AccountInfo::new(key, false, true, lamports, data, owner, false, 0)
    }

    #[test]
    fn prefunded_pda_is_still_vacant_and_gets_adopted() {
        let key = balance_pda(&crate::ID, &Pubkey::new_unique(), &Pubkey::new_unique()).0;
        let system = system_program::ID;
        let mut lamports = 890_880u64;
        let mut data: [u8; 0] = [];
        let ai = account_info(&key, &system, &mut lamports, &mut data);

        assert!(is_vacant_pda(&ai));
        assert_eq!(
            plan_pda_init(ai.lamports(), 1_600_000),
            PdaInit::Adopt { top_up: 709_120 }
        );
        // already above the rent floor: nothing to top up
        assert_eq!(
            plan_pda_init(ai.lamports(), 500_000),
            PdaInit::Adopt { top_up: 0 }
        );
        assert_eq!(
            plan_pda_init(0, 1_600_000),
            PdaInit::Create { lamports: 1_600_000 }
        );
    }

    #[test]
    fn initialized_or_assigned_accounts_are_not_vacant() {
        let key = Pubkey::new_unique();
        let system = system_program::ID;

        let mut lamports = 1_000_000u64;
        let mut data = [0u8; 8];
        let with_data = account_info(&key, &system, &mut lamports, &mut data);
        assert!(!is_vacant_pda(&with_data));

        let mut lamports = 1_000_000u64;
        let mut empty: [u8; 0] = [];
        let program_owned = account_info(&key, &crate::ID, &mut lamports, &mut empty);
        assert!(!is_vacant_pda(&program_owned));
    }

    #[test]
    fn create_refuses_an_initialized_account_before_touching_rent() {
        let key = Pubkey::new_unique();
        let payer_key = Pubkey::new_unique();
        let system = system_program::ID;

        let mut lamports = 2_000_000u64;
        let mut data = [1u8; 16];
        let target = account_info(&key, &crate::ID, &mut lamports, &mut data);

        let mut payer_lamports = 10_000_000u64;
        let mut payer_data: [u8; 0] = [];
        let payer = account_info(&payer_key, &system, &mut payer_lamports, &mut payer_data);

        let mut sys_lamports = 1u64;
        let mut sys_data: [u8; 0] = [];
        let system_ai = account_info(&system, &system, &mut sys_lamports, &mut sys_data);

        let res = create_pda_account(
            &crate::ID,
            &payer,
            &target,
            &system_ai,
            &[BALANCE_SEED],
            16,
            &crate::state::RewardBalance::default(),
        );
        let expected: anchor_lang::error::Error = LootboxError::AccountMismatch.into();
        assert_eq!(res.unwrap_err(), expected);
    }

    #[test]
    fn pdas_are_scoped_by_their_inputs() {
        let user = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let other = Pubkey::new_unique();

        assert_ne!(balance_pda(&crate::ID, &user, &mint).0, balance_pda(&crate::ID, &user, &other).0);
        assert_ne!(
            token_range_pda(&crate::ID, BoxTier::Free, &mint).0,
            token_range_pda(&crate::ID, BoxTier::Silver, &mint).0
        );
        assert_ne!(vault_pda(&crate::ID, &mint).0, vault_pda(&crate::ID, &other).0);
    }
}
