//! # Arena Client Library
//!
//! Client-side implementation for the networked arena game. The client is
//! a pure observer of session state: the server owns every player, and the
//! client advances remote players by integrating their replicated movement
//! deltas locally, once per received snapshot so its cadence matches the
//! authority's tick rate.
//!
//! ## Components
//!
//! - [`game::ReplicaStore`]: the local replica of the session, including
//!   score/color change observers
//! - [`input::InputManager`]: keyboard sampling and movement intent derivation
//! - [`network::NetworkClient`]: UDP connection handling over a dedicated
//!   async runtime
//! - [`rendering::Renderer`]: top-down macroquad presentation

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
