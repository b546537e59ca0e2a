pub mod analysis;
pub mod position;
