//! Subcommand implementations.

pub mod analyze;
pub mod hash;
pub mod index;
pub mod inspect;
pub mod sign;
pub mod similar;
pub mod verify;
