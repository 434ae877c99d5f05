//! # Authority Server Library
//!
//! This library implements the authority node of the multiplayer session:
//! the single node whose writes to player state are canonical. All other
//! nodes observe replicated state and apply it locally.
//!
//! ## Core Responsibilities
//!
//! ### Single-Writer State Ownership
//! Every replicated player field (movement deltas, color, score, alive
//! flag) has exactly one writer: this node. Mutating operations are only
//! exposed through [`game::AuthorityState`], which is constructed with a
//! [`shared::Role`] and silently ignores protected mutations when it is
//! not the authority. That trust boundary is deliberately permissive, not
//! a security control.
//!
//! ### Command Processing
//! Client requests (movement intents, administrative score sets, fire
//! requests) arrive over UDP, are queued per peer, and are drained in
//! per-sender sequence order at the start of each tick. There is no
//! ordering guarantee across different peers and no acknowledgement or
//! retry; delivery is at-most-once.
//!
//! ### Combat and Pickup Resolution
//! Bullet hits are resolved synchronously and strictly sequentially in
//! detection order: damage is transferred zero-sum from victim to shooter
//! and death is evaluated immediately. Damage-boost pickups are consumed
//! on entry unless the weapon is already at its maximum tier.
//!
//! ## Architecture Design
//!
//! The server runs a single-threaded fixed-step simulation loop; network
//! receive/send and timeout detection run as separate tokio tasks that
//! feed the loop through channels, so no player-state field ever needs a
//! lock. Each tick: drain commands, integrate movement deltas, resolve
//! pickups, broadcast a state snapshot to every peer.
//!
//! ## Module Organization
//!
//! - [`spawn`]: round-robin spawn point allocation.
//! - [`session`]: roster context and session-start player spawning.
//! - [`game`]: the authoritative player table and role-gated mutations.
//! - [`commands`]: peer tracking and per-sender ordered command queues.
//! - [`combat`]: bullet hit resolution and the hitscan detector.
//! - [`pickup`]: damage-boost pickups.
//! - [`network`]: UDP transport and the main tick loop.

pub mod combat;
pub mod commands;
pub mod game;
pub mod network;
pub mod pickup;
pub mod session;
pub mod spawn;
