//! IR blaster firmware library.
//!
//! Exposes the pure-logic modules for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod keymap;
pub mod pins;
pub mod web;

pub mod adapters;
pub mod drivers;
