pub mod cache;
pub mod csv_source;
