//! Command implementations
//!
//! This module contains the implementations of the Isola CLI commands.

pub mod check;
pub mod classify;
