pub mod config;
pub mod quote;
pub mod scene;
pub mod session;
pub mod stats;
