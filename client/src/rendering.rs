//! Top-down arena renderer
//!
//! Draws the replicated players on the horizontal plane: world x/z maps
//! to screen x/y with the world origin at the screen center. A dead
//! player is drawn squashed with a DEAD! label in place of its score.

use macroquad::prelude::*;
use shared::{PlayerState, Rgb, Vec3};

const PLAYER_RADIUS: f32 = 12.0;

pub struct Renderer {
    /// Pixels per world unit.
    scale: f32,
}

impl Renderer {
    pub fn new() -> Self {
        Self { scale: 18.0 }
    }

    pub fn render(&self, players: &[PlayerState], local_id: Option<u32>, connected: bool) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        for player in players {
            let is_local = Some(player.id) == local_id;
            self.draw_player(player, is_local);
        }

        self.draw_ui(players.len(), connected);
    }

    fn to_screen(&self, position: Vec3) -> (f32, f32) {
        (
            screen_width() / 2.0 + position.x * self.scale,
            screen_height() / 2.0 + position.z * self.scale,
        )
    }

    fn draw_player(&self, player: &PlayerState, is_local: bool) {
        let (sx, sy) = self.to_screen(player.position);
        let color = to_color(player.color);

        // Terminal marker: a dead player renders squashed.
        let radius = if player.alive {
            PLAYER_RADIUS
        } else {
            PLAYER_RADIUS / 2.0
        };

        draw_poly(sx, sy, 4, radius, player.rotation.y + 45.0, color);
        if is_local {
            draw_poly_lines(sx, sy, 4, radius + 2.0, player.rotation.y + 45.0, 2.0, WHITE);
        }

        if player.alive {
            self.draw_facing_line(player, sx, sy);
        }

        let label = if player.alive {
            player.score.to_string()
        } else {
            "DEAD!".to_string()
        };
        draw_text(&label, sx - 12.0, sy - radius - 6.0, 16.0, WHITE);
    }

    fn draw_facing_line(&self, player: &PlayerState, sx: f32, sy: f32) {
        let facing = player.facing();
        let end_x = sx + facing.x * PLAYER_RADIUS * 1.6;
        let end_y = sy + facing.z * PLAYER_RADIUS * 1.6;
        draw_line(sx, sy, end_x, end_y, 2.0, YELLOW);
    }

    fn draw_ui(&self, player_count: usize, connected: bool) {
        let status_color = if connected { GREEN } else { RED };
        draw_rectangle(10.0, 10.0, 8.0, 8.0, status_color);
        draw_text("CON", 22.0, 18.0, 12.0, WHITE);

        let count_text = format!("{} players", player_count);
        draw_text(&count_text, 10.0, 34.0, 12.0, WHITE);

        draw_text(
            "W/S move, A/D turn, Shift strafe, Space fire, R reset score",
            10.0,
            screen_height() - 10.0,
            12.0,
            GRAY,
        );
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::from_rgba(rgb.r, rgb.g, rgb.b, 255)
}
