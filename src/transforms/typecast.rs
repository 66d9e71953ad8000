//! Representation change between integer, float and boolean edges.
//!
//! Uses the target type's own conversion rules: float → integer truncates
//! toward zero and saturates at the type bounds (NaN becomes 0), integer →
//! float rounds to nearest.  The quantity itself is untouched.

use core::marker::PhantomData;
use std::rc::Rc;

use crate::error::Result;
use crate::graph::{Cadence, Consumer, Emitter, Producer};

/// Value conversion used by [`Typecast`].
pub trait CastTo<O> {
    fn cast(self) -> O;
}

macro_rules! numeric_casts {
    ($($from:ty => [$($to:ty),*]);* $(;)?) => {
        $($(
            impl CastTo<$to> for $from {
                #[inline]
                fn cast(self) -> $to {
                    self as $to
                }
            }
        )*)*
    };
}

numeric_casts! {
    u32 => [i32, f32, f64];
    i32 => [u32, f32, f64];
    f32 => [u32, i32, f64];
    f64 => [u32, i32, f32];
}

macro_rules! bool_casts {
    ($($to:ty),*) => {
        $(
            impl CastTo<$to> for bool {
                #[inline]
                fn cast(self) -> $to {
                    <$to>::from(u8::from(self))
                }
            }
        )*
    };
}

bool_casts!(u32, i32, f32, f64);

/// Converts each `I` into an `O` and emits it.
pub struct Typecast<I, O> {
    out: Emitter<O>,
    _input: PhantomData<fn(I)>,
}

impl<I, O> Typecast<I, O>
where
    I: CastTo<O> + Copy + 'static,
    O: Copy + 'static,
{
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            out: Emitter::new(),
            _input: PhantomData,
        })
    }
}

impl<I, O> Consumer<I> for Typecast<I, O>
where
    I: CastTo<O> + Copy + 'static,
    O: Copy + 'static,
{
    fn receive(&self, value: I) {
        self.out.emit(value.cast());
    }

    fn seal(&self, upstream: Cadence) -> Result<()> {
        self.out.seal(upstream)
    }
}

impl<I, O> Producer<O> for Typecast<I, O>
where
    I: CastTo<O> + Copy + 'static,
    O: Copy + 'static,
{
    fn emitter(&self) -> &Emitter<O> {
        &self.out
    }
}
