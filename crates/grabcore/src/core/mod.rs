pub mod config;
pub mod phase;
pub mod utils;
pub mod validation;
