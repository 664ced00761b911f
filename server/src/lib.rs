//! Logosmith library
//!
//! Credit-gated logo generation, the payment webhook that tops up balances,
//! and the canvas editor core. The binary wires these behind an HTTP API;
//! everything is usable in-process for tests and tooling.

pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod crypto;
pub mod database;
pub mod editor;
pub mod error;
pub mod generator;
pub mod identity;
pub mod palettes;
pub mod payments;
pub mod progress;
pub mod services;
pub mod storage;
