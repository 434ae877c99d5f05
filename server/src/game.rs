//! Authoritative player table and role-gated state mutation

use log::{debug, info, warn};
use shared::{PlayerState, Rgb, Role, Vec3};
use std::collections::HashMap;

/// The canonical session state.
///
/// Constructed with a [`Role`]; every protected mutation is a silent
/// no-op unless the role is `Authority`. Observers never get a mutating
/// path to replicated fields, they apply snapshots through the client's
/// replica store instead.
#[derive(Debug)]
pub struct AuthorityState {
    role: Role,
    pub tick: u32,
    players: HashMap<u32, PlayerState>,
}

impl AuthorityState {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            tick: 0,
            players: HashMap::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Creates a player bound to `client_id` at `position` with identity
    /// orientation and the given spawn color. Authority-only.
    pub fn spawn_player(&mut self, client_id: u32, position: Vec3, color: Rgb) {
        if !self.role.is_authority() {
            debug!("Ignoring spawn_player on non-authority node");
            return;
        }

        let player = PlayerState::new(client_id, position, color);
        info!(
            "Spawned player {} at ({}, {}, {})",
            client_id, position.x, position.y, position.z
        );
        self.players.insert(client_id, player);
    }

    /// Tears down a disconnected player's state. Driven by the session
    /// membership mechanism, not by combat.
    pub fn remove_player(&mut self, client_id: &u32) {
        if self.players.remove(client_id).is_some() {
            info!("Removed player {}", client_id);
        }
    }

    /// Stores a peer's movement intent verbatim: no smoothing, no
    /// magnitude validation. Intents from dead players are dropped so a
    /// terminal `alive == false` also halts movement.
    pub fn apply_movement_intent(
        &mut self,
        sender_id: u32,
        position_delta: Vec3,
        rotation_delta: Vec3,
    ) {
        if !self.role.is_authority() {
            debug!("Ignoring movement intent on non-authority node");
            return;
        }

        let Some(player) = self.players.get_mut(&sender_id) else {
            warn!("Movement intent from unknown player {}", sender_id);
            return;
        };

        if !player.alive {
            debug!("Dropping movement intent from dead player {}", sender_id);
            return;
        }

        player.position_delta = position_delta;
        player.rotation_delta = rotation_delta;
    }

    /// Administrative score overwrite for the sender's own player.
    /// Unconditional on the authority, a no-op everywhere else. Does not
    /// evaluate death and never resurrects.
    pub fn set_score(&mut self, sender_id: u32, value: i32) {
        if !self.role.is_authority() {
            debug!("Ignoring score set on non-authority node");
            return;
        }

        let Some(player) = self.players.get_mut(&sender_id) else {
            warn!("Score set from unknown player {}", sender_id);
            return;
        };

        info!("Score of player {} set to {}", sender_id, value);
        player.score = value;
    }

    /// Advances the simulation one fixed step: every player's stored
    /// deltas are integrated into its transform. Death zeroes the deltas,
    /// so corpses stay put.
    pub fn step(&mut self) {
        self.tick += 1;
        for player in self.players.values_mut() {
            player.apply_step();
        }
    }

    pub fn player(&self, client_id: u32) -> Option<&PlayerState> {
        self.players.get(&client_id)
    }

    pub(crate) fn player_mut(&mut self, client_id: u32) -> Option<&mut PlayerState> {
        self.players.get_mut(&client_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    /// Snapshot of all players in id order, for a stable broadcast.
    pub fn snapshot(&self) -> Vec<PlayerState> {
        let mut players: Vec<PlayerState> = self.players.values().cloned().collect();
        players.sort_by_key(|p| p.id);
        players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
