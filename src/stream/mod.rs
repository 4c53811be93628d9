//! Client-side streaming response pipeline
//!
//! The pipeline for consuming a streaming chat response:
//!
//! - [`ChunkDecoder`]: raw byte chunks to text fragments, carrying split
//!   multi-byte sequences across chunk boundaries.
//! - [`LineFramer`]: text fragments to classified [`FramedLine`]s, carrying
//!   partial lines across fragment boundaries.
//! - [`StreamSession`]: the read loop that owns both and dispatches each
//!   line to a [`StreamHandler`], with cooperative cancellation via
//!   [`CancelToken`].

pub mod decoder;
pub mod framer;
pub mod session;

pub use decoder::ChunkDecoder;
pub use framer::{FramedLine, LineFramer};
pub use session::{CancelToken, StreamHandler, StreamSession};
