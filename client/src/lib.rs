//! Team Sync client library.
//!
//! The crate follows a hexagonal layout: the [`domain`] owns the board state
//! machine and its use-cases, [`domain::ports`] describes the hosted backend
//! it talks to, [`outbound`] adapts those ports to concrete services, and
//! [`inbound`] drives the board from an interactive shell.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod telemetry;

pub use config::{ClientConfig, ClientSettings, ConfigError};
pub use domain::board::{BoardPorts, TeamBoard};
