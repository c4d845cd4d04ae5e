pub mod generator;
pub mod memory;
