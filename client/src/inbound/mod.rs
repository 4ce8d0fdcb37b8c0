//! Inbound adapters driving the board.

pub mod shell;
