//! Application layer for the shell client.

pub mod bridge;
pub mod surface;

pub use bridge::{BridgeCommand, BridgeEvent, TerminalBridge};
pub use surface::{TerminalEvent, TerminalSurface};
