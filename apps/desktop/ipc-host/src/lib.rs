// Library exports for testing
// The binary (main.rs) imports these as well

pub mod cli;
pub mod error;
pub mod host;
pub mod logger;
pub mod settings;
pub mod state;
pub mod windows;

#[cfg(test)]
mod tests;
