//! Terminal snake: a pure game state stepped by a paced loop that talks to
//! the terminal through the `Display` and `Input` traits.

pub mod config;
pub mod free_cells;
pub mod game;
pub mod geometry;
pub mod snake;
pub mod term;
