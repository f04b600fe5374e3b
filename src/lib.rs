//! Library crate for nazdarbaby-back: table lobby, new-game countdowns and the shared
//! countdown scheduler, exposed for the binaries and tests.

pub mod config;
pub mod countdown;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
