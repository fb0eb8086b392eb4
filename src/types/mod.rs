//! Core types for chainstream.

pub mod event;
pub mod message;
pub mod raw;

pub use event::*;
pub use message::*;
pub use raw::*;
