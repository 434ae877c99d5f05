//! Bullet hit resolution and the hitscan detector
//!
//! Resolution is authority-only and strictly sequential: when two bullets
//! hit the same victim in one tick they are resolved in detection order,
//! never merged. Damage transfer is exactly zero-sum between victim and
//! shooter.

use crate::game::AuthorityState;
use log::{debug, info, warn};
use shared::{Vec3, FIRE_RANGE, HIT_RADIUS};

/// Transient projectile record; consumed by resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bullet {
    pub owner_id: u32,
    pub damage: i32,
}

/// A detected bullet/player collision, as delivered by the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletHit {
    pub bullet: Bullet,
    pub victim_id: u32,
}

/// Applies one bullet hit to the canonical state.
///
/// Order matters: damage first, then the shooter credit, then the death
/// check against the score the credit left behind. When the shooter and
/// the victim are the same player the credit restores the damage, so a
/// self-hit never kills. A vanished shooter only skips the credit; the
/// victim's damage stands. Hits landing after death keep adjusting
/// score, but the death transition itself fires at most once and zeroes
/// the stored deltas so the corpse stops moving. The bullet is consumed
/// by value.
pub fn resolve_hit(state: &mut AuthorityState, hit: BulletHit) {
    if !state.role().is_authority() {
        debug!("Ignoring bullet hit on non-authority node");
        return;
    }

    let BulletHit { bullet, victim_id } = hit;

    let Some(victim) = state.player_mut(victim_id) else {
        warn!("Bullet hit on unknown player {}", victim_id);
        return;
    };
    victim.score -= bullet.damage;

    match state.player_mut(bullet.owner_id) {
        Some(shooter) => shooter.score += bullet.damage,
        None => warn!(
            "Shooter {} no longer present, skipping score credit",
            bullet.owner_id
        ),
    }

    if let Some(victim) = state.player_mut(victim_id) {
        if victim.score <= 0 && victim.alive {
            victim.alive = false;
            victim.position_delta = Vec3::ZERO;
            victim.rotation_delta = Vec3::ZERO;
            info!("Player {} died (score {})", victim_id, victim.score);
        }
    }
}

/// Straight-line hit detection for a fire request.
///
/// Scans along the shooter's facing direction up to [`FIRE_RANGE`] and
/// picks the nearest other living player within [`HIT_RADIUS`] of the
/// ray. Returns the synthesized hit carrying the shooter's current
/// bullet damage, or `None` on a miss. Dead shooters never fire.
pub fn scan_hit(state: &AuthorityState, shooter_id: u32) -> Option<BulletHit> {
    let shooter = state.player(shooter_id)?;
    if !shooter.alive {
        return None;
    }

    let origin = shooter.position;
    let direction = shooter.facing();

    let mut nearest: Option<(f32, u32)> = None;
    for target in state.players() {
        if target.id == shooter_id || !target.alive {
            continue;
        }

        let to_target = target.position - origin;
        let along = to_target.dot(direction);
        if along <= 0.0 || along > FIRE_RANGE {
            continue;
        }

        let closest_point = origin + direction.scaled(along);
        let lateral = (target.position - closest_point).length();
        if lateral > HIT_RADIUS {
            continue;
        }

        if nearest.map_or(true, |(best, _)| along < best) {
            nearest = Some((along, target.id));
        }
    }

    nearest.map(|(_, victim_id)| BulletHit {
        bullet: Bullet {
            owner_id: shooter_id,
            damage: shooter.bullet_damage,
        },
        victim_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Rgb, Role, STARTING_SCORE};

    fn two_players_facing() -> AuthorityState {
        let mut state = AuthorityState::new(Role::Authority);
        state.spawn_player(1, Vec3::new(0.0, 1.5, 0.0), Rgb::RED);
        state.spawn_player(2, Vec3::new(0.0, 1.5, 5.0), Rgb::BLUE);
        state
    }

    fn hit(owner_id: u32, damage: i32, victim_id: u32) -> BulletHit {
        BulletHit {
            bullet: Bullet { owner_id, damage },
            victim_id,
        }
    }

    #[test]
    fn test_zero_sum_transfer() {
        let mut state = two_players_facing();
        resolve_hit(&mut state, hit(1, 3, 2));

        assert_eq!(state.player(2).unwrap().score, STARTING_SCORE - 3);
        assert_eq!(state.player(1).unwrap().score, STARTING_SCORE + 3);

        let total: i32 = state.players().map(|p| p.score).sum();
        assert_eq!(total, 2 * STARTING_SCORE);
    }

    #[test]
    fn test_missing_shooter_keeps_damage() {
        let mut state = two_players_facing();
        resolve_hit(&mut state, hit(99, 5, 2));

        assert_eq!(state.player(2).unwrap().score, STARTING_SCORE - 5);
        assert_eq!(state.player(1).unwrap().score, STARTING_SCORE);
    }

    #[test]
    fn test_missing_victim_is_noop() {
        let mut state = two_players_facing();
        resolve_hit(&mut state, hit(1, 5, 99));
        assert_eq!(state.player(1).unwrap().score, STARTING_SCORE);
    }

    #[test]
    fn test_death_at_zero_score() {
        let mut state = two_players_facing();
        for _ in 0..STARTING_SCORE {
            resolve_hit(&mut state, hit(1, 1, 2));
        }

        let victim = state.player(2).unwrap();
        assert_eq!(victim.score, 0);
        assert!(!victim.alive);
        assert_eq!(victim.position_delta, Vec3::ZERO);
    }

    #[test]
    fn test_death_fires_once_but_score_keeps_moving() {
        let mut state = two_players_facing();
        resolve_hit(&mut state, hit(1, STARTING_SCORE, 2));
        assert!(!state.player(2).unwrap().alive);

        // Further hits still transfer score; alive stays false.
        resolve_hit(&mut state, hit(1, 2, 2));
        assert_eq!(state.player(2).unwrap().score, -2);
        assert!(!state.player(2).unwrap().alive);
        assert_eq!(state.player(1).unwrap().score, STARTING_SCORE * 2 + 2);
    }

    #[test]
    fn test_self_hit_never_kills() {
        let mut state = two_players_facing();
        resolve_hit(&mut state, hit(2, STARTING_SCORE, 2));

        // The credit restores the damage before the death check runs.
        let victim = state.player(2).unwrap();
        assert_eq!(victim.score, STARTING_SCORE);
        assert!(victim.alive);
    }

    #[test]
    fn test_observer_ignores_hits() {
        let mut state = AuthorityState::new(Role::Observer);
        resolve_hit(&mut state, hit(1, 5, 2));
        assert!(state.is_empty());
    }

    #[test]
    fn test_scan_hits_target_straight_ahead() {
        let state = two_players_facing();
        let scanned = scan_hit(&state, 1).unwrap();
        assert_eq!(scanned.victim_id, 2);
        assert_eq!(scanned.bullet.owner_id, 1);
        assert_eq!(scanned.bullet.damage, state.player(1).unwrap().bullet_damage);
    }

    #[test]
    fn test_scan_picks_nearest_target() {
        let mut state = two_players_facing();
        state.spawn_player(3, Vec3::new(0.0, 1.5, 2.0), Rgb::GREEN);

        let scanned = scan_hit(&state, 1).unwrap();
        assert_eq!(scanned.victim_id, 3);
    }

    #[test]
    fn test_scan_misses_behind_and_out_of_range() {
        let mut state = AuthorityState::new(Role::Authority);
        state.spawn_player(1, Vec3::new(0.0, 1.5, 0.0), Rgb::RED);
        state.spawn_player(2, Vec3::new(0.0, 1.5, -5.0), Rgb::BLUE);
        assert!(scan_hit(&state, 1).is_none());

        state.spawn_player(3, Vec3::new(0.0, 1.5, FIRE_RANGE + 1.0), Rgb::GREEN);
        assert!(scan_hit(&state, 1).is_none());
    }

    #[test]
    fn test_dead_players_neither_fire_nor_get_hit() {
        let mut state = two_players_facing();
        resolve_hit(&mut state, hit(1, STARTING_SCORE, 2));

        assert!(scan_hit(&state, 2).is_none());
        assert!(scan_hit(&state, 1).is_none());
    }
}
