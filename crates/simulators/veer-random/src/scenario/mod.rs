pub mod demand;
pub mod editor;
pub mod seed;
