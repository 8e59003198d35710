//! CLI infrastructure for the kinarow engine
//!
//! Commands for training the Q-learning agent, asking any policy for a move
//! and inspecting saved models.

pub mod commands;
pub mod output;
