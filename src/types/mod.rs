pub mod config;
pub mod language;
pub mod lat_lon;
pub mod snapshot;
