//! Transforms: nodes that receive one value and emit one derived value.
//!
//! None of them can fail at runtime; they run the formula on whatever
//! arrives and pass the result on.

pub mod calibration;
pub mod frequency;
pub mod linear;
pub mod typecast;

pub use calibration::{CalibrationHandle, CalibrationRegistry, LinearParams, ParamCell};
pub use frequency::Frequency;
pub use linear::Linear;
pub use typecast::{CastTo, Typecast};
