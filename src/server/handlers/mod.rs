pub mod locations;
pub mod sessions;
