pub mod chart;
pub mod hit_object;
pub mod note;
pub mod playfield;
pub mod position;
pub mod scroll;
pub mod timing;
