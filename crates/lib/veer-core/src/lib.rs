#![forbid(unsafe_code)]

pub mod edge;
pub mod episode;
pub mod step;
