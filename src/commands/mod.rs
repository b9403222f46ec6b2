//! Commands
//!
//! Entry points a front end calls, organized by domain.

mod todo;

#[cfg(test)]
mod tests;

// Re-export all public items
pub use todo::*;
