//! Session roster and start-of-session player spawning
//!
//! The roster is an explicit context object handed to the spawner at
//! construction; nothing here reaches for process-wide state.

use crate::game::AuthorityState;
use crate::spawn::{SpawnCoordinator, SpawnError};
use log::{debug, info};
use shared::Rgb;

/// One connected participant as supplied by the roster provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub client_id: u32,
    pub color: Rgb,
}

/// Ordered roster of session participants, consumed once at session start.
#[derive(Debug, Clone)]
pub struct SessionContext {
    roster: Vec<RosterEntry>,
}

impl SessionContext {
    pub fn new(roster: Vec<RosterEntry>) -> Self {
        Self { roster }
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }
}

/// Instantiates one player per roster entry at session start.
pub struct SessionSpawner {
    context: SessionContext,
}

impl SessionSpawner {
    pub fn new(context: SessionContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Spawns every roster entry in order; the first entry gets the first
    /// spawn position. Runs only on the authority; an observer-role state
    /// leaves both the player table and the spawn cursor untouched.
    pub fn spawn_all(
        &self,
        spawns: &mut SpawnCoordinator,
        state: &mut AuthorityState,
    ) -> Result<(), SpawnError> {
        if !state.role().is_authority() {
            debug!("Skipping session spawn on non-authority node");
            return Ok(());
        }

        for entry in self.context.roster() {
            let position = spawns.next()?;
            state.spawn_player(entry.client_id, position, entry.color);
        }

        info!("Session started with {} players", self.context.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Role, Vec3, SPAWN_ELEVATION};

    fn spawn_ring() -> SpawnCoordinator {
        let mut spawns = SpawnCoordinator::new();
        spawns.refresh(vec![
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -10.0),
        ]);
        spawns
    }

    fn two_player_roster() -> SessionContext {
        SessionContext::new(vec![
            RosterEntry {
                client_id: 1,
                color: Rgb::RED,
            },
            RosterEntry {
                client_id: 2,
                color: Rgb::BLUE,
            },
        ])
    }

    #[test]
    fn test_roster_order_decides_spawn_positions() {
        let mut spawns = spawn_ring();
        let mut state = AuthorityState::new(Role::Authority);

        let spawner = SessionSpawner::new(two_player_roster());
        spawner.spawn_all(&mut spawns, &mut state).unwrap();

        assert_eq!(state.len(), 2);
        assert_eq!(
            state.player(1).unwrap().position,
            Vec3::new(0.0, SPAWN_ELEVATION, 10.0)
        );
        assert_eq!(
            state.player(2).unwrap().position,
            Vec3::new(10.0, SPAWN_ELEVATION, 0.0)
        );
        assert_eq!(state.player(1).unwrap().color, Rgb::RED);
        assert_eq!(state.player(2).unwrap().color, Rgb::BLUE);
    }

    #[test]
    fn test_late_join_continues_the_cycle() {
        let mut spawns = spawn_ring();
        let mut state = AuthorityState::new(Role::Authority);

        SessionSpawner::new(two_player_roster())
            .spawn_all(&mut spawns, &mut state)
            .unwrap();

        // A third allocation gets the remaining point, a fourth wraps.
        assert_eq!(
            spawns.next().unwrap(),
            Vec3::new(0.0, SPAWN_ELEVATION, -10.0)
        );
        assert_eq!(
            spawns.next().unwrap(),
            Vec3::new(0.0, SPAWN_ELEVATION, 10.0)
        );
    }

    #[test]
    fn test_observer_spawns_nothing_and_keeps_cursor() {
        let mut spawns = spawn_ring();
        let mut state = AuthorityState::new(Role::Observer);

        SessionSpawner::new(two_player_roster())
            .spawn_all(&mut spawns, &mut state)
            .unwrap();

        assert!(state.is_empty());
        // Cursor untouched: the first point is still up next.
        assert_eq!(
            spawns.next().unwrap(),
            Vec3::new(0.0, SPAWN_ELEVATION, 10.0)
        );
    }

    #[test]
    fn test_empty_spawn_list_is_reported() {
        let mut spawns = SpawnCoordinator::new();
        let mut state = AuthorityState::new(Role::Authority);

        let result = SessionSpawner::new(two_player_roster()).spawn_all(&mut spawns, &mut state);
        assert_eq!(result, Err(SpawnError::NoSpawnPoints));
    }
}
