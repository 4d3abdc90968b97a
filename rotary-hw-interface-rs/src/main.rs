//! rotary-hw-interface
//!
//! Rotary dial → decoded digit sequences over UART, for the Raspberry Pi
//! Pico 2:
//!
//! 1. The dial's pulse contact opens and closes the GP15 line once per
//!    unit of the digit dialled.
//! 2. The edge task wakes on each rising edge, stamps it and feeds it to
//!    the shared `Dial`.
//! 3. The timeout task sleeps until the next digit or sequence deadline
//!    and fires it.
//! 4. The reader task wakes on each finalized sequence and writes
//!    `"<digits>\n\0"` to UART0.
//!
//! The maximum sequence length is taken from `ROTARY_MAX_NUMBER_LEN` at
//! build time (default 20, clamped to 1..=60).

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::uart::{self, Blocking, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use rotary_decoder::{
    edge_task, timeout_task, BindError, Binding, DecoderConfig, Dial, EmbassyTicks,
    MonotonicClock, SequenceReader, SEQUENCE_WIRE_CAPACITY,
};

// ---------------------------------------------------------------------------
// Boot block
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// Only the UART reader consumes sequences.
const READERS: usize = 1;

type SharedDial = Dial<CriticalSectionRawMutex, READERS>;

/// Epoch-relative millisecond clock shared by the edge and timeout tasks.
static CLOCK: MonotonicClock<CriticalSectionRawMutex, EmbassyTicks> =
    MonotonicClock::new(EmbassyTicks);

/// Decoder state: written by the edge and timeout tasks, read by the
/// reader task.
static DIAL: StaticCell<SharedDial> = StaticCell::new();

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// The dial's pulse line. Only usable if a dial holds it low at rest.
struct EdgeLine {
    pin: Input<'static>,
}

impl Binding for EdgeLine {
    fn name(&self) -> &'static str {
        "edge line"
    }

    fn acquire(&mut self) -> Result<(), BindError> {
        // Pulled up with nothing attached.
        if self.pin.is_high() {
            return Err(BindError::NotDetected);
        }
        Ok(())
    }

    fn release(&mut self) {
        debug!("Edge line released");
    }
}

/// UART0 TX, where finalized sequences are written.
struct SequencePort {
    tx: UartTx<'static, Blocking>,
}

impl Binding for SequencePort {
    fn name(&self) -> &'static str {
        "sequence port"
    }

    fn acquire(&mut self) -> Result<(), BindError> {
        self.tx
            .blocking_write(b"rotary: ready\n")
            .map_err(|_| BindError::Rejected)
    }

    fn release(&mut self) {
        if self.tx.blocking_flush().is_err() {
            warn!("UART flush failed on release");
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Thin wrapper that monomorphises the generic `edge_task` so it can be
/// spawned as a concrete Embassy task.
#[embassy_executor::task]
async fn dial_edge_task(line: Input<'static>, dial: &'static SharedDial) {
    edge_task(line, dial, &CLOCK).await
}

/// Thin wrapper around the generic `timeout_task`.
#[embassy_executor::task]
async fn dial_timeout_task(dial: &'static SharedDial) {
    timeout_task(dial, &CLOCK).await
}

/// Writes every finalized sequence to UART0.
///
/// A sequence that does not fit the transfer buffer is logged and
/// skipped; the decoder is unaffected.
#[embassy_executor::task]
async fn reader_task(
    mut reader: SequenceReader<'static, CriticalSectionRawMutex, READERS>,
    mut port: SequencePort,
) {
    info!("Sequence reader started");
    let mut buf = [0u8; SEQUENCE_WIRE_CAPACITY];

    loop {
        let len = match reader.read_into(&mut buf).await {
            Ok(len) => len,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        if port.tx.blocking_write(&buf[..len]).is_err() {
            error!("UART write failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("rotary-hw-interface starting");

    // —— Pin assignments ————————————————————————————————————————————————————
    // DIAL_PULSE → GP15 (p.PIN_15)  pull-up, rising edge per pulse
    // UART0_TX   → GP0  (p.PIN_0)
    // ———————————————————————————————————————————————————————————————————————

    let mut line = EdgeLine {
        pin: Input::new(p.PIN_15, Pull::Up),
    };
    let mut port = SequencePort {
        tx: UartTx::new_blocking(p.UART0, p.PIN_0, uart::Config::default()),
    };

    let config = match option_env!("ROTARY_MAX_NUMBER_LEN") {
        Some(param) => DecoderConfig::from_param(param),
        None => DecoderConfig::default(),
    };
    info!("Decoder config: {}", config);

    let dial: &'static SharedDial = DIAL.init(Dial::new(config));

    // —— Bring-up ———————————————————————————————————————————————————————————

    if let Err(e) = dial.start(&mut [&mut line, &mut port]) {
        error!("{}", e);
        return;
    }
    info!("Dial in service");

    let Some(reader) = dial.reader() else {
        error!("No sequence reader slot");
        dial.stop(&mut [&mut line, &mut port]);
        return;
    };

    // —— Spawn tasks ————————————————————————————————————————————————————————

    spawner.spawn(dial_edge_task(line.pin, dial).unwrap());
    spawner.spawn(dial_timeout_task(dial).unwrap());
    spawner.spawn(reader_task(reader, port).unwrap());

    info!("All tasks spawned");
}
