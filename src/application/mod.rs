pub mod consensus;
pub mod engine;
pub mod features;
pub mod indicators;
pub mod models;
pub mod regime;
