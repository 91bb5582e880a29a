pub mod cluster;
pub mod moves;
pub mod overlap;
