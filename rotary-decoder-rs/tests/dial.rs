//! End-to-end behaviour of a shared `Dial`: edges in, terminated
//! sequences out.

use std::cell::{Cell, RefCell};

use embassy_futures::join::{join, join3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use futures_executor::block_on;

use rotary_decoder::{
    BindError, Binding, Decoder, DecoderConfig, Dial, EdgeOutcome, LifecycleState,
    MonotonicClock, ReadError, Sequence, TickSource, SEQUENCE_WIRE_CAPACITY,
};

type TestDial = Dial<CriticalSectionRawMutex, 3>;

fn running_dial(config: DecoderConfig) -> TestDial {
    let dial = TestDial::new(config);
    dial.start(&mut []).unwrap();
    dial
}

/// Dial one digit: `pulses` edges 100 ms apart from `start`, then let the
/// digit timer fire. Returns the time the digit closed.
fn dial_digit(dial: &TestDial, start: u64, pulses: u32) -> u64 {
    let mut last = start;
    for i in 0..u64::from(pulses) {
        last = start + i * 100;
        assert!(matches!(dial.on_edge(last), EdgeOutcome::Counted { .. }));
    }
    let closed = last + 500;
    dial.service_timers(closed);
    closed
}

fn seq(digits: &[u8]) -> Sequence {
    Sequence::from_digits(digits).unwrap()
}

// ── Reference scenario ──────────────────────────────────────────────────

#[test]
fn bounced_pulses_decode_to_single_digit() {
    let dial = running_dial(DecoderConfig::default());
    let mut reader = dial.reader().unwrap();

    // Edge at 0, bounce at 40, second pulse at 600.
    dial.on_edge(0);
    assert_eq!(dial.on_edge(40), EdgeOutcome::Debounced);
    dial.on_edge(600);

    assert_eq!(dial.service_timers(1_100), Some(4_100));
    assert_eq!(dial.service_timers(4_100), None);

    let mut buf = [0u8; SEQUENCE_WIRE_CAPACITY];
    let n = block_on(reader.read_into(&mut buf)).unwrap();
    assert_eq!(&buf[..n], b"2\n\0");
}

#[test]
fn ten_pulses_dial_zero() {
    let dial = running_dial(DecoderConfig::default());
    let closed = dial_digit(&dial, 0, 10);
    dial.service_timers(closed + 3_000);
    assert_eq!(dial.latest(), Some(seq(b"0")));
}

#[test]
fn digits_keep_arrival_order() {
    let dial = running_dial(DecoderConfig::default());
    let mut t = 0;
    for pulses in [4, 1, 7] {
        t = dial_digit(&dial, t, pulses) + 1_000;
    }
    assert_eq!(dial.latest(), None);

    dial.service_timers(t - 1_000 + 3_000);
    assert_eq!(dial.latest(), Some(seq(b"417")));
}

#[test]
fn full_buffer_finalizes_without_waiting() {
    let dial = running_dial(DecoderConfig::default().with_max_number_len(3));
    let mut reader = dial.reader().unwrap();

    let mut t = 0;
    for pulses in [5, 5, 5] {
        t = dial_digit(&dial, t, pulses) + 1_000;
    }
    assert_eq!(reader.try_read(), Some(seq(b"555")));
    assert_eq!(dial.next_deadline(), None);

    // Next digit opens a fresh sequence.
    let closed = dial_digit(&dial, t, 1);
    dial.service_timers(closed + 3_000);
    assert_eq!(reader.try_read(), Some(seq(b"1")));
}

// ── Channel semantics ───────────────────────────────────────────────────

#[test]
fn every_waiting_reader_gets_the_same_sequence() {
    let dial = running_dial(DecoderConfig::default());
    let mut first = dial.reader().unwrap();
    let mut second = dial.reader().unwrap();

    let (a, b, ()) = block_on(join3(first.read(), second.read(), async {
        let closed = dial_digit(&dial, 0, 3);
        dial.service_timers(closed + 3_000);
    }));
    assert_eq!(a, seq(b"3"));
    assert_eq!(a, b);
}

#[test]
fn reader_sees_sequence_published_before_it_waited() {
    let dial = running_dial(DecoderConfig::default());
    let mut reader = dial.reader().unwrap();

    let closed = dial_digit(&dial, 0, 9);
    dial.service_timers(closed + 3_000);

    assert_eq!(block_on(reader.read()), seq(b"9"));
}

#[test]
fn unread_sequence_is_replaced_by_newer_one() {
    let dial = running_dial(DecoderConfig::default());
    let mut reader = dial.reader().unwrap();

    let closed = dial_digit(&dial, 0, 1);
    dial.service_timers(closed + 3_000);
    let closed = dial_digit(&dial, 10_000, 2);
    dial.service_timers(closed + 3_000);

    assert_eq!(reader.try_read(), Some(seq(b"2")));
    assert_eq!(reader.try_read(), None);
}

#[test]
fn short_buffer_fails_without_touching_decoder() {
    let dial = running_dial(DecoderConfig::default());
    let mut reader = dial.reader().unwrap();
    let closed = dial_digit(&dial, 0, 6);
    dial.service_timers(closed + 3_000);
    let stats = dial.with_decoder(Decoder::stats);

    let mut buf = [0u8; 2];
    assert_eq!(
        block_on(reader.read_into(&mut buf)),
        Err(ReadError::Transfer {
            needed: 3,
            available: 2
        })
    );
    assert_eq!(dial.latest(), Some(seq(b"6")));
    assert_eq!(dial.with_decoder(Decoder::stats), stats);
}

#[test]
fn current_is_idempotent() {
    let dial = running_dial(DecoderConfig::default());
    let reader = dial.reader().unwrap();
    let closed = dial_digit(&dial, 0, 8);
    dial.service_timers(closed + 3_000);

    let first = reader.current();
    assert_eq!(first, reader.current());
    assert_eq!(first, dial.latest());
}

#[test]
fn current_does_not_consume_pending_sequence() {
    let dial = running_dial(DecoderConfig::default());
    let mut reader = dial.reader().unwrap();
    dial.on_edge(0);
    dial.service_timers(500);
    dial.service_timers(3_500);

    assert_eq!(reader.current(), Some(seq(b"1")));
    let mut buf = [0u8; SEQUENCE_WIRE_CAPACITY];
    let n = block_on(reader.read_into(&mut buf)).unwrap();
    assert_eq!(&buf[..n], b"1\n\0");
    assert_eq!(reader.try_read(), None);
}

#[test]
fn reader_wakes_while_producer_runs() {
    let dial = running_dial(DecoderConfig::default());
    let mut reader = dial.reader().unwrap();

    let (sequence, ()) = block_on(join(reader.read(), async {
        dial.on_edge(0);
        dial.on_edge(200);
        dial.service_timers(700);
        dial.service_timers(3_700);
    }));
    assert_eq!(sequence.as_bytes(), b"2\n\0");
}

// ── Lifecycle ───────────────────────────────────────────────────────────

struct Resource<'a> {
    name: &'static str,
    fail_with: Option<BindError>,
    log: &'a RefCell<Vec<String>>,
}

impl Binding for Resource<'_> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn acquire(&mut self) -> Result<(), BindError> {
        self.log.borrow_mut().push(format!("acquire {}", self.name));
        match self.fail_with {
            Some(cause) => Err(cause),
            None => Ok(()),
        }
    }

    fn release(&mut self) {
        self.log.borrow_mut().push(format!("release {}", self.name));
    }
}

#[test]
fn failed_bring_up_unwinds_and_keeps_decoder_idle() {
    let log = RefCell::new(Vec::new());
    let mut line = Resource {
        name: "edge line",
        fail_with: None,
        log: &log,
    };
    let mut port = Resource {
        name: "sequence port",
        fail_with: Some(BindError::Busy),
        log: &log,
    };

    let dial = TestDial::new(DecoderConfig::default());
    let error = dial.start(&mut [&mut line, &mut port]).unwrap_err();
    assert_eq!(error.binding, "sequence port");
    assert_eq!(error.cause, BindError::Busy);
    assert_eq!(
        *log.borrow(),
        ["acquire edge line", "acquire sequence port", "release edge line"]
    );

    assert_eq!(dial.with_decoder(Decoder::state), LifecycleState::Created);
    assert_eq!(dial.on_edge(0), EdgeOutcome::Inactive);
    assert_eq!(dial.next_deadline(), None);
}

#[test]
fn stop_discards_work_and_releases_in_reverse() {
    let log = RefCell::new(Vec::new());
    let mut line = Resource {
        name: "edge line",
        fail_with: None,
        log: &log,
    };
    let mut port = Resource {
        name: "sequence port",
        fail_with: None,
        log: &log,
    };

    let dial = TestDial::new(DecoderConfig::default());
    dial.start(&mut [&mut line, &mut port]).unwrap();
    dial_digit(&dial, 0, 4);
    dial.on_edge(5_000);

    dial.stop(&mut [&mut line, &mut port]);
    assert_eq!(
        *log.borrow(),
        [
            "acquire edge line",
            "acquire sequence port",
            "release sequence port",
            "release edge line",
        ]
    );
    assert_eq!(dial.next_deadline(), None);
    assert_eq!(dial.service_timers(100_000), None);
    assert_eq!(dial.latest(), None);
    assert_eq!(dial.on_edge(200_000), EdgeOutcome::Inactive);
}

// ── Clock ───────────────────────────────────────────────────────────────

struct ManualTicks<'a>(&'a Cell<u64>);

impl TickSource for ManualTicks<'_> {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

#[test]
fn clock_timestamps_drive_the_decoder() {
    let raw = Cell::new(90_000);
    let clock: MonotonicClock<CriticalSectionRawMutex, _> = MonotonicClock::new(ManualTicks(&raw));
    let dial = running_dial(DecoderConfig::default());

    // First edge anchors the epoch.
    assert!(matches!(dial.on_edge(clock.now()), EdgeOutcome::Counted { .. }));
    let deadline = dial.next_deadline().unwrap();
    assert_eq!(deadline, 500);
    assert_eq!(clock.to_source(deadline), 90_500);

    raw.set(90_500);
    let deadline = dial.service_timers(clock.now()).unwrap();
    assert_eq!(clock.to_source(deadline), 93_500);

    raw.set(93_500);
    assert_eq!(dial.service_timers(clock.now()), None);
    assert_eq!(dial.latest(), Some(seq(b"1")));
}
