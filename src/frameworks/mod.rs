// Frameworks layer: runtime bootstrap, environment config and the socket transport.

pub mod client;
pub mod config;
pub mod transport;
