//! Peripheral drivers and hardware initialisation.

pub mod hw_init;
pub mod inputs;
pub mod ir_tx;
pub mod status_led;
