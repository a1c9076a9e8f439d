pub mod cli;
pub mod experiments;
