//! Kedai library crate: re-exports all modules for integration testing.
//!
//! The binary crate (`main.rs`) is the actual game entry point.
//! This library crate exposes the same modules so that `tests/` integration
//! tests can drive the shop loop without a window or GPU.

pub mod shared;
pub mod story;
pub mod dialogue;
pub mod customers;
pub mod scoring;
pub mod input;
pub mod ui;
pub mod data;
