//! PokéCatch Gen 1 - catch random Pokemon into a local Pokébank
//!
//! The library exposes the app's modules for the binary and for testing.

pub mod action;
pub mod api;
pub mod artwork;
pub mod artwork_backend;
pub mod collection;
pub mod config;
pub mod effect;
pub mod encounter;
pub mod error;
pub mod logging;
pub mod reducer;
pub mod state;
pub mod storage;
pub mod ui;
