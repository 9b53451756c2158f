pub mod config;
pub mod logging;

pub mod client;
pub mod fetch;
pub mod gate;
pub mod http;
pub mod rate_limit;
pub mod resolver;
pub mod retry;
pub mod scrape;
pub mod table;
