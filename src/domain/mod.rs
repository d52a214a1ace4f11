pub mod errors;
pub mod ports;
pub mod timeframe;
pub mod types;
