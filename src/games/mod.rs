//! Bundled [`crate::GameState`] implementations.

pub mod connect4;
pub mod tictactoe;
