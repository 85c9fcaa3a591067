//! Collectors module for host resources.
//!
//! This module contains readers for mounted filesystems and network
//! interfaces.

pub mod filesystem;
pub mod netdev;
