//! Domain types for the PageForge application.
//! Defines the core data structures and business objects used throughout the application.

pub mod error;
pub mod generation;
pub mod options;

pub use error::*;
pub use generation::*;
pub use options::*;
