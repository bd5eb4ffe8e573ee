#![forbid(unsafe_code)]

pub mod detector;
pub mod error;
pub mod network;
