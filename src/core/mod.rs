pub mod clipboard;
pub mod input;
pub mod skin;
pub mod sprite;
