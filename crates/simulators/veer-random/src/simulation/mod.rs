pub mod config;
pub mod experiment;
pub mod pass;
