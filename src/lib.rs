pub mod audit;
pub mod checkpoint;
pub mod config;
pub mod errors;
pub mod evolution;
pub mod gates;
pub mod hooks;
pub mod phase;
