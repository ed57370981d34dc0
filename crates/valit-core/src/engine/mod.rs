pub mod config;
pub mod error;
pub mod ids;
mod indexer;
pub mod model;
pub mod solver;
mod sweep;

#[cfg(test)]
mod tests;
