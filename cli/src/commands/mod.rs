pub mod access;
pub mod groups;
pub mod import;
pub mod repository;
