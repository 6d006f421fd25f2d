//! Stock effects
//!
//! Generic building blocks implementing [`Effect`](crate::core::Effect). Each
//! one is plain data plus an `apply` that mutates the game and logs what
//! happened. Cards combine them in their effect slots.

mod choice;
mod control;
mod damage;
mod life;
mod mana;
mod prevention;
mod pump;
mod zones;

pub use choice::{ChooseColor, MayAbility};
pub use control::{Equip, GainControlOfTarget};
pub use damage::{DealDamageToTarget, DealXDamageToTarget, DestroyTarget};
pub use life::{DrawCards, GainLife};
pub use mana::AddMana;
pub use prevention::{
    PreventAllCombatDamage, PreventColorDamageToController, PreventDamageFromColor,
    PreventDamageToTarget, RedirectCombatDamageToSelf, RedirectDrawsToController, RegenerateSelf,
};
pub use pump::{BoostSelf, BoostTarget, GrantKeywordToTarget, MakeTargetUnblockable};
pub use zones::{
    CounterTargetSpell, ExileTarget, ReturnCardFromGraveyard, ReturnTargetToHand,
    SacrificeCreatureEdict, ShuffleIntoLibrary,
};
