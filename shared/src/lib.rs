use serde::{Deserialize, Serialize};

/// Handshake version; mismatched clients are refused.
pub const PROTOCOL_VERSION: u32 = 1;

pub const MOVEMENT_SPEED: f32 = 0.5;
pub const ROTATION_SPEED: f32 = 4.0;
pub const SPAWN_ELEVATION: f32 = 1.5;
pub const STARTING_SCORE: i32 = 50;
pub const BASE_BULLET_DAMAGE: i32 = 1;
pub const MAX_BULLET_DAMAGE: i32 = 3;
pub const FIRE_RANGE: f32 = 40.0;
pub const HIT_RADIUS: f32 = 1.0;
pub const PICKUP_RADIUS: f32 = 1.5;

/// Spawn-assignment colors, handed out in roster order.
pub const COLOR_PALETTE: [Rgb; 6] = [
    Rgb::RED,
    Rgb::BLUE,
    Rgb::GREEN,
    Rgb::YELLOW,
    Rgb::MAGENTA,
    Rgb::CYAN,
];

/// Which side of the replication boundary a node sits on.
///
/// The authority is the single canonical writer of player state; observers
/// only apply replicated updates. Components take a `Role` at construction
/// instead of branching on "am I the host" at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Authority,
    Observer,
}

impl Role {
    pub fn is_authority(self) -> bool {
        matches!(self, Role::Authority)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Rotates the vector around the vertical axis by `degrees`.
    ///
    /// Used to carry an entity-local movement delta into world space given
    /// the entity's current yaw.
    pub fn rotated_y(self, degrees: f32) -> Self {
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        Self {
            x: self.x * cos + self.z * sin,
            y: self.y,
            z: -self.x * sin + self.z * cos,
        }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;

    fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, other: Vec3) {
        *self = *self + other;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
    pub const MAGENTA: Rgb = Rgb::new(255, 0, 255);
    pub const CYAN: Rgb = Rgb::new(0, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Replicated per-player record.
///
/// The authority is the only writer of every field; observers receive
/// snapshots and integrate the stored deltas locally once per step.
/// `color` is assigned at spawn and never reassigned. `alive` flips
/// true -> false at most once per lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: u32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub position_delta: Vec3,
    pub rotation_delta: Vec3,
    pub color: Rgb,
    pub score: i32,
    pub alive: bool,
    pub bullet_damage: i32,
}

impl PlayerState {
    pub fn new(id: u32, position: Vec3, color: Rgb) -> Self {
        Self {
            id,
            position,
            rotation: Vec3::ZERO,
            position_delta: Vec3::ZERO,
            rotation_delta: Vec3::ZERO,
            color,
            score: STARTING_SCORE,
            alive: true,
            bullet_damage: BASE_BULLET_DAMAGE,
        }
    }

    /// Advances the entity by its stored deltas: translate in local space
    /// using the current yaw, then rotate. Every node integrates in this
    /// order so their views stay equivalent.
    pub fn apply_step(&mut self) {
        self.position += self.position_delta.rotated_y(self.rotation.y);
        self.rotation += self.rotation_delta;
    }

    /// Unit vector the entity is facing, derived from its yaw.
    pub fn facing(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, 1.0).rotated_y(self.rotation.y)
    }
}

/// The tuple a peer wants applied to its own entity, sent to the authority.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementIntent {
    pub position_delta: Vec3,
    pub rotation_delta: Vec3,
}

/// Derives a movement intent from sampled input axes.
///
/// With the strafe modifier held, the horizontal axis slides the entity
/// sideways and no turning happens; otherwise the horizontal axis turns
/// the entity. The vertical axis always moves forward/back.
pub fn derive_intent(horizontal: f32, vertical: f32, strafe: bool) -> MovementIntent {
    let (x_move, y_rot) = if strafe {
        (horizontal, 0.0)
    } else {
        (0.0, horizontal)
    };

    MovementIntent {
        position_delta: Vec3::new(x_move, 0.0, vertical).scaled(MOVEMENT_SPEED),
        rotation_delta: Vec3::new(0.0, y_rot, 0.0).scaled(ROTATION_SPEED),
    }
}

/// Client -> authority request carried inside `Packet::Command`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Movement {
        position_delta: Vec3,
        rotation_delta: Vec3,
    },
    SetScore {
        value: i32,
    },
    Fire,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    Command {
        sequence: u32,
        command: Command,
    },
    Disconnect,

    Connected {
        client_id: u32,
    },
    SessionState {
        tick: u32,
        players: Vec<PlayerState>,
    },
    Disconnected {
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_player_state_defaults() {
        let player = PlayerState::new(3, Vec3::new(1.0, 1.5, -2.0), Rgb::BLUE);
        assert_eq!(player.id, 3);
        assert_eq!(player.score, STARTING_SCORE);
        assert_eq!(player.bullet_damage, BASE_BULLET_DAMAGE);
        assert!(player.alive);
        assert_eq!(player.rotation, Vec3::ZERO);
        assert_eq!(player.position_delta, Vec3::ZERO);
        assert_eq!(player.rotation_delta, Vec3::ZERO);
        assert_eq!(player.color, Rgb::BLUE);
    }

    #[test]
    fn test_rotated_y_quarter_turn() {
        let forward = Vec3::new(0.0, 0.0, 1.0);
        let turned = forward.rotated_y(90.0);
        assert_approx_eq!(turned.x, 1.0, 1e-5);
        assert_approx_eq!(turned.y, 0.0, 1e-5);
        assert_approx_eq!(turned.z, 0.0, 1e-5);
    }

    #[test]
    fn test_rotated_y_full_turn_is_identity() {
        let v = Vec3::new(0.3, 1.0, -0.7);
        let back = v.rotated_y(360.0);
        assert_approx_eq!(back.x, v.x, 1e-4);
        assert_approx_eq!(back.z, v.z, 1e-4);
    }

    #[test]
    fn test_derive_intent_turning() {
        let intent = derive_intent(1.0, 1.0, false);
        assert_eq!(intent.position_delta, Vec3::new(0.0, 0.0, MOVEMENT_SPEED));
        assert_eq!(intent.rotation_delta, Vec3::new(0.0, ROTATION_SPEED, 0.0));
    }

    #[test]
    fn test_derive_intent_strafing() {
        let intent = derive_intent(-1.0, 1.0, true);
        assert_eq!(
            intent.position_delta,
            Vec3::new(-MOVEMENT_SPEED, 0.0, MOVEMENT_SPEED)
        );
        assert_eq!(intent.rotation_delta, Vec3::ZERO);
    }

    #[test]
    fn test_derive_intent_idle() {
        let intent = derive_intent(0.0, 0.0, false);
        assert_eq!(intent.position_delta, Vec3::ZERO);
        assert_eq!(intent.rotation_delta, Vec3::ZERO);
    }

    #[test]
    fn test_apply_step_translates_before_rotating() {
        let mut player = PlayerState::new(1, Vec3::ZERO, Rgb::RED);
        player.rotation = Vec3::new(0.0, 90.0, 0.0);
        player.position_delta = Vec3::new(0.0, 0.0, 1.0);
        player.rotation_delta = Vec3::new(0.0, 45.0, 0.0);

        player.apply_step();

        // Translation used the pre-step yaw (90 degrees), not 135.
        assert_approx_eq!(player.position.x, 1.0, 1e-5);
        assert_approx_eq!(player.position.z, 0.0, 1e-5);
        assert_approx_eq!(player.rotation.y, 135.0, 1e-5);
    }

    #[test]
    fn test_facing_follows_yaw() {
        let mut player = PlayerState::new(1, Vec3::ZERO, Rgb::RED);
        assert_approx_eq!(player.facing().z, 1.0, 1e-5);

        player.rotation.y = 180.0;
        assert_approx_eq!(player.facing().z, -1.0, 1e-4);
    }

    #[test]
    fn test_packet_serialization_command() {
        let packet = Packet::Command {
            sequence: 7,
            command: Command::Movement {
                position_delta: Vec3::new(0.0, 0.0, 0.5),
                rotation_delta: Vec3::new(0.0, 4.0, 0.0),
            },
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Command { sequence, command } => {
                assert_eq!(sequence, 7);
                match command {
                    Command::Movement { position_delta, .. } => {
                        assert_eq!(position_delta, Vec3::new(0.0, 0.0, 0.5));
                    }
                    _ => panic!("Wrong command type after deserialization"),
                }
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_session_state() {
        let players = vec![
            PlayerState::new(1, Vec3::new(0.0, 1.5, 10.0), Rgb::RED),
            PlayerState::new(2, Vec3::new(10.0, 1.5, 0.0), Rgb::BLUE),
        ];

        let packet = Packet::SessionState { tick: 42, players };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::SessionState { tick, players } => {
                assert_eq!(tick, 42);
                assert_eq!(players.len(), 2);
                assert_eq!(players[0].id, 1);
                assert_eq!(players[1].color, Rgb::BLUE);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }
}
