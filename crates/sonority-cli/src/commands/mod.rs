pub mod catalog;
pub mod config;
pub mod recommend;

pub use recommend::run_recommend;
