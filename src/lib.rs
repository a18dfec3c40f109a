//! Note-field logic for vertical scrolling rhythm games.
//!
//! The host engine supplies sprites, skins, the song clock and the clipboard
//! through the traits in [`core`]; this crate positions hit objects each frame,
//! judges lane input, and drives the menu text input widget.

pub mod config;
pub mod core;
pub mod game;
pub mod screens;
pub mod ui;
