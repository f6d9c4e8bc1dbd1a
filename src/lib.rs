pub mod app;
pub mod cli;
pub mod collate;
pub mod config;
pub mod dataset;
pub mod lookup;
pub mod output;
pub mod render;

#[cfg(test)]
mod tests;
