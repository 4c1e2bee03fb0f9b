pub mod connection;

pub use connection::ConnectionSource;
