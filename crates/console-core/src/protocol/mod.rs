//! Protocol module containing the `/ws/pty` frame codec.

pub mod frame;

pub use frame::{
    decode_output, decode_resize, encode_input, encode_resize, FrameError, OutgoingFrame,
    OutputPayload, TerminalOutput, RESIZE_FRAME_LEN, RESIZE_MARKER,
};
