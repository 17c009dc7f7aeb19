//! Platform abstraction layer
//!
//! The simulation never sees devices or key codes. Whatever drives it
//! (window loop, test, autopilot) resolves bindings and hands over an
//! [`input::ActionState`] once per tick.

pub mod input;
