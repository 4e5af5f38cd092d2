//! Application layer: the prompt composer and the loop controller.

pub mod composer;
pub mod controller;

pub use controller::{LoopController, LoopEvent, LoopReport, StopCause};
