pub mod episode;
pub mod policy;
