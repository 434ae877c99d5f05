//! Observer-side replica of the session state
//!
//! The replica never mutates protected fields on its own: it applies
//! authority snapshots, integrates replicated deltas for players it does
//! not own, and advances the owned player only from local input. Value
//! changes on `score` and `color` are published through an explicit
//! observer registry keyed by player id.

use log::debug;
use shared::{MovementIntent, PlayerState, Rgb};
use std::collections::{HashMap, HashSet};

pub type ScoreObserver = Box<dyn FnMut(i32, i32)>;
pub type ColorObserver = Box<dyn FnMut(Rgb, Rgb)>;

/// Local copies of every replicated player plus the change-notification
/// registry.
#[derive(Default)]
pub struct ReplicaStore {
    tick: u32,
    players: HashMap<u32, PlayerState>,
    score_observers: HashMap<u32, Vec<ScoreObserver>>,
    color_observers: HashMap<u32, Vec<ColorObserver>>,
}

impl ReplicaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked with `(previous, current)` on every
    /// applied replication write to the player's score.
    pub fn on_score_change(&mut self, player_id: u32, observer: ScoreObserver) {
        self.score_observers
            .entry(player_id)
            .or_default()
            .push(observer);
    }

    /// Registers a callback invoked with `(previous, current)` on every
    /// applied replication write to the player's color.
    pub fn on_color_change(&mut self, player_id: u32, observer: ColorObserver) {
        self.color_observers
            .entry(player_id)
            .or_default()
            .push(observer);
    }

    /// Applies an authority snapshot.
    ///
    /// Deltas, color, score, alive flag and bullet damage are taken from
    /// the snapshot; position and rotation are not. Each node integrates
    /// those locally, the snapshot only seeds them for players seen for
    /// the first time. Observers fire once per incoming write, whether or
    /// not the value differs. Players absent from the snapshot are torn
    /// down. Returns the ids seen for the first time.
    pub fn apply_session_state(&mut self, tick: u32, players: Vec<PlayerState>) -> Vec<u32> {
        self.tick = tick;

        let mut newly_seen = Vec::new();
        let mut present: HashSet<u32> = HashSet::with_capacity(players.len());

        for incoming in players {
            present.insert(incoming.id);

            let (previous_score, previous_color) = match self.players.get(&incoming.id) {
                Some(existing) => (existing.score, existing.color),
                None => {
                    newly_seen.push(incoming.id);
                    (incoming.score, incoming.color)
                }
            };

            if let Some(observers) = self.score_observers.get_mut(&incoming.id) {
                for observer in observers {
                    observer(previous_score, incoming.score);
                }
            }
            if let Some(observers) = self.color_observers.get_mut(&incoming.id) {
                for observer in observers {
                    observer(previous_color, incoming.color);
                }
            }

            match self.players.get_mut(&incoming.id) {
                Some(existing) => {
                    existing.position_delta = incoming.position_delta;
                    existing.rotation_delta = incoming.rotation_delta;
                    existing.color = incoming.color;
                    existing.score = incoming.score;
                    existing.alive = incoming.alive;
                    existing.bullet_damage = incoming.bullet_damage;
                }
                None => {
                    debug!("First sight of player {}", incoming.id);
                    self.players.insert(incoming.id, incoming);
                }
            }
        }

        self.players.retain(|id, _| present.contains(id));
        self.score_observers.retain(|id, _| present.contains(id));
        self.color_observers.retain(|id, _| present.contains(id));

        newly_seen
    }

    /// Advances one local simulation step: every player except the owned
    /// one is moved by its replicated deltas. Must run once per applied
    /// snapshot, so the integration cadence matches the authority's tick
    /// rate whatever the frame rate is. The owned player already advanced
    /// when its input was sampled.
    pub fn step(&mut self, local_id: Option<u32>) {
        for (id, player) in self.players.iter_mut() {
            if Some(*id) == local_id {
                continue;
            }
            player.apply_step();
        }
    }

    /// Advances the owned player by a freshly derived intent. Dead
    /// players stay put regardless of input.
    pub fn apply_local_intent(&mut self, local_id: u32, intent: &MovementIntent) {
        if let Some(player) = self.players.get_mut(&local_id) {
            if !player.alive {
                return;
            }
            player.position += intent.position_delta.rotated_y(player.rotation.y);
            player.rotation += intent.rotation_delta;
        }
    }

    pub fn player(&self, player_id: u32) -> Option<&PlayerState> {
        self.players.get(&player_id)
    }

    pub fn is_alive(&self, player_id: u32) -> bool {
        self.players.get(&player_id).map_or(false, |p| p.alive)
    }

    /// Players in id order for rendering.
    pub fn render_players(&self) -> Vec<PlayerState> {
        let mut players: Vec<PlayerState> = self.players.values().cloned().collect();
        players.sort_by_key(|p| p.id);
        players
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
