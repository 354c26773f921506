//! Supertraits for common effect combinations

use super::{EventEffects, IdentityEffects, TimeEffects, WorldStateEffects};

/// Everything a mutating ledger or escrow operation may touch:
/// world state, transaction time, caller identity and events.
pub trait LedgerEffects: WorldStateEffects + TimeEffects + IdentityEffects + EventEffects {}

/// Automatic implementation for types that satisfy the required bounds
impl<T> LedgerEffects for T where
    T: WorldStateEffects + TimeEffects + IdentityEffects + EventEffects + ?Sized
{
}
