pub mod account;
pub mod backend;
pub mod config;
pub mod contactless;
pub mod controller;
pub mod error;
pub mod form;
pub mod state;

#[cfg(test)]
mod tests;
