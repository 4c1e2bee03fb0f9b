pub mod codec;
pub mod config;
pub mod model;
pub mod sources;
pub mod traits;
