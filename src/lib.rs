pub mod config;
pub mod context;
pub mod error;
pub mod harness;
pub mod pool;
pub mod posix;
pub mod strategy;
pub mod timing;
