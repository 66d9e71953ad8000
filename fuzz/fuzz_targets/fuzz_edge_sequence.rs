//! Fuzz target: `PulseAccumulator::on_edge` + `EdgeCounter::flush`
//!
//! Interprets the input as edge gaps and flush points on the millisecond
//! clock, starting late in the 32-bit range so runs cross 2^32 ms.  Reported deltas must add up to the accepted total,
//! and accepted + rejected must equal the edges seen.
//!
//! cargo fuzz run fuzz_edge_sequence

#![no_main]

use libfuzzer_sys::fuzz_target;
use sensorflow::sensors::{EdgeCounter, PulseAccumulator};

fuzz_target!(|data: &[u8]| {
    let Some((&debounce, rest)) = data.split_first() else {
        return;
    };
    let acc: &'static PulseAccumulator =
        Box::leak(Box::new(PulseAccumulator::new(u32::from(debounce))));
    let counter = EdgeCounter::new("fuzz", acc, 1000).expect("non-zero interval");

    let mut now = u64::from(u32::MAX) - 1000;
    let mut edges = 0u32;
    let mut reported = 0u32;
    for chunk in rest.chunks(2) {
        now += u64::from(chunk[0]) * 4;
        acc.on_edge(now);
        edges += 1;
        if chunk.get(1).is_some_and(|b| b & 1 == 1) {
            reported = reported.wrapping_add(counter.flush(now));
        }
    }
    reported = reported.wrapping_add(counter.flush(now));

    assert_eq!(reported, acc.total());
    assert_eq!(acc.total().wrapping_add(acc.rejected()), edges);
});
