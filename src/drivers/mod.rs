//! Hardware initialisation, ISR handlers and the task watchdog.

pub mod hw_init;
pub mod watchdog;
