pub mod context;
pub mod output;
