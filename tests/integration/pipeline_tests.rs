//! Graph-level tests: hand-wired pipelines driven by a reactor and a
//! manual clock, without the station wiring.

use std::cell::RefCell;
use std::rc::Rc;

use sensorflow::adapters::config_store::MemoryConfigStore;
use sensorflow::adapters::publish_queue::QueuedPublisher;
use sensorflow::adapters::time::ManualClock;
use sensorflow::app::ports::{ClockPort, ConfigPort, PublishPort};
use sensorflow::config::{CalibrationOverride, StationConfig};
use sensorflow::graph::Producer;
use sensorflow::scheduler::Reactor;
use sensorflow::sensors::{EdgeCounter, PulseAccumulator, RepeatSensor};
use sensorflow::signalk::{SkMetadata, SkValue};
use sensorflow::sinks::{LambdaConsumer, SkOutput};
use sensorflow::transforms::{Frequency, Linear, ParamCell, Typecast};
use sensorflow::Error;

fn recorder<T: 'static>() -> (Rc<RefCell<Vec<T>>>, Rc<LambdaConsumer<T>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink_log = Rc::clone(&log);
    let sink = LambdaConsumer::new(move |v: T| sink_log.borrow_mut().push(v));
    (log, sink)
}

fn leaked_accumulator(debounce_ms: u32) -> &'static PulseAccumulator {
    Box::leak(Box::new(PulseAccumulator::new(debounce_ms)))
}

#[test]
fn poller_through_linear_emits_every_interval() {
    let clock = ManualClock::new(0);
    let mut reactor = Reactor::new(clock.now_ms());

    let sensor = RepeatSensor::new("pressure", 2000, || 300.0_f32).unwrap();
    let (log, sink) = recorder::<f32>();
    sensor
        .connect_to(Linear::with(1.0, 0.0))
        .unwrap()
        .connect_to(sink)
        .unwrap();
    sensor.start(&mut reactor).unwrap();

    for _ in 0..3 {
        reactor.tick(clock.advance(2000));
    }
    assert_eq!(*log.borrow(), vec![300.0, 300.0, 300.0]);
}

#[test]
fn counter_into_rate_via_reactor() {
    let acc = leaked_accumulator(5);
    let mut reactor = Reactor::new(0);

    let counter = EdgeCounter::new("wind", acc, 3000).unwrap();
    let (log, sink) = recorder::<f32>();
    counter
        .connect_to(Frequency::for_counter(&counter, ParamCell::new(1.026)))
        .unwrap()
        .connect_to(sink)
        .unwrap();
    counter.start(&mut reactor).unwrap();

    for t in (100..=1000).step_by(100) {
        acc.on_edge(t);
    }
    reactor.tick(3000);
    reactor.tick(6000);

    let rates = log.borrow();
    assert_eq!(rates.len(), 2);
    assert!((rates[0] - 3.42).abs() < 1e-4);
    assert_eq!(rates[1], 0.0);
}

#[test]
fn counts_are_cast_before_scaling() {
    let acc = leaked_accumulator(0);
    let mut reactor = Reactor::new(0);

    let counter = EdgeCounter::new("rain", acc, 1000).unwrap();
    let (log, sink) = recorder::<f32>();
    counter
        .connect_to(Typecast::<u32, f32>::new())
        .unwrap()
        .connect_to(Linear::with(0.18, 0.0))
        .unwrap()
        .connect_to(sink)
        .unwrap();
    counter.start(&mut reactor).unwrap();

    for t in [10, 20, 30, 40] {
        acc.on_edge(t);
    }
    reactor.tick(1000);
    assert!((log.borrow()[0] - 0.72).abs() < 1e-5);
}

#[test]
fn started_graph_rejects_new_subscribers_downstream() {
    let mut reactor = Reactor::new(0);
    let sensor = RepeatSensor::new("t", 100, || 1.0_f32).unwrap();
    let linear = sensor.connect_to(Linear::with(2.0, 0.0)).unwrap();
    sensor.start(&mut reactor).unwrap();

    let (_, late) = recorder::<f32>();
    assert_eq!(linear.connect_to(late).err(), Some(Error::GraphSealed));
    let (_, late) = recorder::<f32>();
    assert_eq!(sensor.connect_to(late).err(), Some(Error::GraphSealed));
}

#[test]
fn rate_behind_mismatched_counter_fails_start() {
    let acc = leaked_accumulator(0);
    let mut reactor = Reactor::new(0);

    let counter = EdgeCounter::new("wind", acc, 3000).unwrap();
    counter
        .connect_to(Frequency::new(1000, ParamCell::new(1.0)).unwrap())
        .unwrap();
    assert_eq!(
        counter.start(&mut reactor).err(),
        Some(Error::CadenceMismatch {
            expected_ms: 1000,
            actual_ms: 3000
        })
    );
    assert!(reactor.is_empty());
}

#[test]
fn fan_out_is_depth_first_in_subscription_order() {
    let mut reactor = Reactor::new(0);
    let order = Rc::new(RefCell::new(Vec::<&'static str>::new()));
    let tap = |label: &'static str| {
        let order = Rc::clone(&order);
        LambdaConsumer::new(move |_: f32| order.borrow_mut().push(label))
    };

    let sensor = RepeatSensor::new("t", 100, || 1.0_f32).unwrap();
    let first = sensor.connect_to(Linear::with(1.0, 0.0)).unwrap();
    first.connect_to(tap("first.a")).unwrap();
    first.connect_to(tap("first.b")).unwrap();
    sensor.connect_to(tap("second")).unwrap();
    sensor.start(&mut reactor).unwrap();

    reactor.tick(100);
    assert_eq!(*order.borrow(), vec!["first.a", "first.b", "second"]);
}

#[test]
fn outputs_feed_a_bounded_queue() {
    let queue: Rc<QueuedPublisher<2>> = Rc::new(QueuedPublisher::new());
    let publisher: Rc<dyn PublishPort> = queue.clone();
    let mut reactor = Reactor::new(0);

    let mut next = 0.0_f32;
    let sensor = RepeatSensor::new("t", 100, move || {
        next += 1.0;
        next
    })
    .unwrap();
    let output = sensor
        .connect_to(SkOutput::<f32>::new(
            "study.temperature",
            SkMetadata::new("K", "Study Temperature"),
            publisher,
        ))
        .unwrap();
    sensor.start(&mut reactor).unwrap();

    for t in [100, 200, 300] {
        reactor.tick(t);
    }
    assert_eq!(output.published(), 3);
    assert_eq!(queue.dropped(), 1);

    let mut seen = Vec::new();
    queue.drain(|u| seen.push(u.value));
    assert_eq!(seen, vec![SkValue::Float(2.0), SkValue::Float(3.0)]);
}

#[test]
fn persisted_overrides_survive_a_reload() {
    let mut store = MemoryConfigStore::in_memory();
    let config = StationConfig {
        calibrations: vec![CalibrationOverride {
            path: "/study/rain/calibrate".into(),
            scale: 0.2,
            offset: 0.0,
        }],
        ..StationConfig::default()
    };
    store.save(&config).unwrap();
    assert_eq!(store.load().unwrap(), config);
}
