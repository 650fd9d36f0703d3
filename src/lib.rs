pub mod analyzers;
pub mod columns;
pub mod fetch;
pub mod loader;
pub mod output;
pub mod parser;
pub mod session;
