pub mod config;
pub mod logging;

pub mod invoke;
pub mod link;
pub mod list;
pub mod processor;
pub mod retry;
