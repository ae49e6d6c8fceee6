//! OS input backends: the global key listener and the input synthesizer.

mod enigo_actuator;
mod rdev_listener;

pub use enigo_actuator::EnigoActuator;
pub use rdev_listener::{raw_key, KeyListener};
