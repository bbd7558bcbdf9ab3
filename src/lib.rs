pub mod cli;
pub mod config;
pub mod error;
pub mod merge;
pub mod metadata;
pub mod process;
pub mod report;
pub mod testing;
