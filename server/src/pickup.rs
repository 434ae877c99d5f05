//! Damage-boost pickups
//!
//! Entry detection is a proximity check against the pickup position; the
//! resolution itself only runs on the authority. A pickup at the weapon's
//! maximum tier is left in place untouched.

use crate::game::AuthorityState;
use log::{debug, info, warn};
use shared::{Vec3, MAX_BULLET_DAMAGE, PICKUP_RADIUS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    DamageBoost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub kind: PickupKind,
    pub position: Vec3,
    pub consumed: bool,
}

impl Pickup {
    pub fn damage_boost(position: Vec3) -> Self {
        Self {
            kind: PickupKind::DamageBoost,
            position,
            consumed: false,
        }
    }
}

/// Applies a pickup the given player has entered.
///
/// Below the cap: one damage tier is added and the pickup is marked
/// consumed (destroyed by the caller). At the cap: nothing happens and
/// the pickup persists.
pub fn resolve_pickup(state: &mut AuthorityState, player_id: u32, pickup: &mut Pickup) {
    if !state.role().is_authority() {
        debug!("Ignoring pickup on non-authority node");
        return;
    }
    if pickup.consumed {
        return;
    }

    let Some(player) = state.player_mut(player_id) else {
        warn!("Pickup entry from unknown player {}", player_id);
        return;
    };

    match pickup.kind {
        PickupKind::DamageBoost => {
            if player.bullet_damage < MAX_BULLET_DAMAGE {
                player.bullet_damage += 1;
                pickup.consumed = true;
                info!(
                    "Player {} picked up damage boost (tier {})",
                    player_id, player.bullet_damage
                );
            }
        }
    }
}

/// Lists `(player_id, pickup_index)` pairs for every living player inside
/// an unconsumed pickup's trigger radius.
pub fn detect_entries(state: &AuthorityState, pickups: &[Pickup]) -> Vec<(u32, usize)> {
    let mut entries = Vec::new();
    for (index, pickup) in pickups.iter().enumerate() {
        if pickup.consumed {
            continue;
        }
        for player in state.players() {
            if !player.alive {
                continue;
            }
            if (player.position - pickup.position).length() <= PICKUP_RADIUS {
                entries.push((player.id, index));
            }
        }
    }
    entries
}
