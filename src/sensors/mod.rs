//! Producers: the sources of the dataflow graph.
//!
//! | Producer              | Trigger                   | Emits  |
//! |-----------------------|---------------------------|--------|
//! | [`RepeatSensor`]      | reactor, fixed interval   | `T`    |
//! | [`EdgeCounter`]       | pin ISR + reactor flush   | `u32`  |
//! | [`DigitalInputChange`]| pin ISR + reactor scan    | `bool` |
//! | [`analog_input`]      | reactor, fixed interval   | `f32`  |

pub mod analog;
pub mod digital;
pub mod edge_counter;
pub mod repeat;

pub use analog::analog_input;
pub use digital::{pin_sampler, DigitalInputChange, LevelLatch};
pub use edge_counter::{EdgeCounter, EdgePolarity, PulseAccumulator};
pub use repeat::RepeatSensor;
