//! Round-robin spawn point allocation
//!
//! The candidate list comes from static level geometry (external) and is
//! cached here as an ordered sequence. Allocation is deterministic: given
//! the same list and call count, the same positions come back in the same
//! order, with the vertical coordinate forced to the spawn elevation.

use log::debug;
use shared::{Vec3, SPAWN_ELEVATION};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
    /// `next()` was called before `refresh()` seeded any candidates.
    #[error("no spawn points available")]
    NoSpawnPoints,
}

/// Hands out spawn positions round-robin over a cached candidate list.
///
/// The cursor is always in `[0, count)` while the list is non-empty.
pub struct SpawnCoordinator {
    points: Vec<Vec3>,
    cursor: usize,
}

impl SpawnCoordinator {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            cursor: 0,
        }
    }

    /// Replaces the candidate list and resets the cursor.
    ///
    /// Must be called at least once before `next()`.
    pub fn refresh(&mut self, points: Vec<Vec3>) {
        debug!("Refreshed spawn points ({} candidates)", points.len());
        self.points = points;
        self.cursor = 0;
    }

    /// Returns the next spawn position and advances the cursor, wrapping
    /// past the end of the list. The vertical coordinate is fixed at
    /// [`SPAWN_ELEVATION`] regardless of the stored height.
    pub fn next(&mut self) -> Result<Vec3, SpawnError> {
        if self.points.is_empty() {
            return Err(SpawnError::NoSpawnPoints);
        }

        let mut position = self.points[self.cursor];
        position.y = SPAWN_ELEVATION;

        self.cursor += 1;
        if self.cursor > self.points.len() - 1 {
            self.cursor = 0;
        }

        Ok(position)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for SpawnCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_points() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(10.0, 2.0, 0.0),
            Vec3::new(-10.0, -1.0, 0.0),
        ]
    }

    #[test]
    fn test_next_without_refresh_fails() {
        let mut spawns = SpawnCoordinator::new();
        assert_eq!(spawns.next(), Err(SpawnError::NoSpawnPoints));
    }

    #[test]
    fn test_next_fixes_elevation() {
        let mut spawns = SpawnCoordinator::new();
        spawns.refresh(three_points());

        let first = spawns.next().unwrap();
        assert_eq!(first, Vec3::new(0.0, SPAWN_ELEVATION, 10.0));

        let second = spawns.next().unwrap();
        assert_eq!(second, Vec3::new(10.0, SPAWN_ELEVATION, 0.0));
    }

    #[test]
    fn test_cursor_wraps_after_full_cycle() {
        let mut spawns = SpawnCoordinator::new();
        spawns.refresh(three_points());

        let cycle: Vec<Vec3> = (0..3).map(|_| spawns.next().unwrap()).collect();
        let repeat: Vec<Vec3> = (0..3).map(|_| spawns.next().unwrap()).collect();
        assert_eq!(cycle, repeat);
    }

    #[test]
    fn test_single_point_always_returned() {
        let mut spawns = SpawnCoordinator::new();
        spawns.refresh(vec![Vec3::new(5.0, 0.0, 5.0)]);

        for _ in 0..4 {
            assert_eq!(
                spawns.next().unwrap(),
                Vec3::new(5.0, SPAWN_ELEVATION, 5.0)
            );
        }
    }

    #[test]
    fn test_refresh_resets_cursor() {
        let mut spawns = SpawnCoordinator::new();
        spawns.refresh(three_points());
        spawns.next().unwrap();
        spawns.next().unwrap();

        spawns.refresh(three_points());
        assert_eq!(
            spawns.next().unwrap(),
            Vec3::new(0.0, SPAWN_ELEVATION, 10.0)
        );
    }

    #[test]
    fn test_refresh_with_empty_list_clears() {
        let mut spawns = SpawnCoordinator::new();
        spawns.refresh(three_points());
        spawns.refresh(Vec::new());
        assert!(spawns.is_empty());
        assert_eq!(spawns.next(), Err(SpawnError::NoSpawnPoints));
    }
}
