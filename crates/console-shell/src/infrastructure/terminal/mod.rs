//! Terminal adapters.
//!
//! - **`local`** – The operator's own terminal: raw mode on, restored on drop.
//! - **`events`** – Background producers that turn keystrokes, window
//!   resizes and interrupt signals into [`TerminalEvent`]s on a channel.
//! - **`mock`** – A recording terminal for tests.
//!
//! [`TerminalEvent`]: crate::application::surface::TerminalEvent

pub mod events;
pub mod local;
pub mod mock;

pub use events::{spawn_interrupt_watcher, spawn_resize_watcher, spawn_stdin_reader, DETACH_KEY};
pub use local::LocalTerminal;
pub use mock::RecordingTerminal;
