//! Command implementations.

mod crawl;

pub use crawl::execute;
