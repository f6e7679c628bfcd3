//! Call guards shared by the instruction handlers.

use anchor_lang::prelude::*;
use anchor_lang::AccountsExit;

use crate::errors::LootboxError;
use crate::state::Config;

pub fn only_owner(cfg: &Config, caller: &Pubkey) -> Result<()> {
    require_keys_eq!(cfg.owner, *caller, LootboxError::Unauthorized);
    Ok(())
}

pub fn when_not_paused(cfg: &Config) -> Result<()> {
    require!(!cfg.paused, LootboxError::Paused);
    Ok(())
}

pub fn lock(cfg: &mut Config) -> Result<()> {
    require!(!cfg.locked, LootboxError::Reentrancy);
    cfg.locked = true;
    Ok(())
}

pub fn unlock(cfg: &mut Config) {
    cfg.locked = false;
}

/// Takes the reentrancy lock and flushes it to the account so a nested
/// invocation deserializes `locked == true`. A failed instruction rolls the
/// flag back with everything else; callers `unlock` on the success path.
pub fn non_reentrant(cfg: &mut Account<'_, Config>) -> Result<()> {
    lock(cfg)?;
    cfg.exit(&crate::ID)
}
