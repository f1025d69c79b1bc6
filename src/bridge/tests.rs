//! Pipeline tests for Bridge, using the embedded default tables

use super::*;
use crate::control_mapping::load_default_tables;
use crate::dispatch::MidiSink;
use crate::error::BridgeError;

use modifiers::{SHIFT_A, SHIFT_B, TOGGLE_AC};
use tokio::sync::oneshot;
use tokio::time::timeout;

#[derive(Default)]
struct RecordingSink {
    sent: Vec<Vec<u8>>,
}

impl MidiSink for RecordingSink {
    fn send(&mut self, data: &[u8]) -> Result<(), BridgeError> {
        self.sent.push(data.to_vec());
        Ok(())
    }
}

struct ClosedSink;

impl MidiSink for ClosedSink {
    fn send(&mut self, _data: &[u8]) -> Result<(), BridgeError> {
        Err(BridgeError::MidiSend("output port gone".to_string()))
    }
}

fn make_bridge() -> Bridge {
    Bridge::new(load_default_tables().unwrap(), encoder::DEFAULT_DEBOUNCE)
}

/// Events at fixed millisecond offsets from a shared origin
struct Clock(Instant);

impl Clock {
    fn new() -> Self {
        Self(Instant::now())
    }

    fn at(&self, ms: u64, code: u16, value: i32) -> ControlEvent {
        ControlEvent::new(code, value, self.0 + Duration::from_millis(ms))
    }
}

fn bytes(message: Option<OutgoingMessage>) -> Option<[u8; 3]> {
    message.map(|m| m.encode())
}

#[test]
fn test_potentiometer_scaling() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    assert_eq!(bytes(bridge.translate(&clock.at(0, 16, 4095))), Some([0xB0, 0x30, 127]));
    assert_eq!(bytes(bridge.translate(&clock.at(1, 16, 31))), Some([0xB0, 0x30, 0]));
}

#[test]
fn test_repeated_values_are_dropped() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    assert!(bridge.translate(&clock.at(0, 261, 1)).is_some());
    assert!(bridge.translate(&clock.at(1, 261, 1)).is_none());
    assert!(bridge.translate(&clock.at(2, 261, 0)).is_some());
}

#[test]
fn test_unmapped_codes_are_dropped() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    // Loop recorder dry/wet and deck C high EQ stay unmapped
    assert!(bridge.translate(&clock.at(0, 20, 1000)).is_none());
    assert!(bridge.translate(&clock.at(1, 47, 1000)).is_none());
    assert!(bridge.translate(&clock.at(2, 349, 1)).is_none());
}

#[test]
fn test_toggle_release_does_not_flip() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    assert!(bridge.translate(&clock.at(0, TOGGLE_AC, 0)).is_none());
    assert!(!bridge.modifiers().toggle_ac);

    assert!(bridge.translate(&clock.at(1, TOGGLE_AC, 1)).is_none());
    assert!(bridge.modifiers().toggle_ac);

    // Play on the left side now targets deck C
    assert_eq!(bytes(bridge.translate(&clock.at(2, 261, 1))), Some([0xB2, 0x0A, 1]));

    assert!(bridge.translate(&clock.at(3, TOGGLE_AC, 0)).is_none());
    assert!(bridge.modifiers().toggle_ac);
}

#[test]
fn test_shift_toggles_on_press_and_release() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    bridge.translate(&clock.at(0, SHIFT_A, 1));
    assert!(bridge.modifiers().shift_a);
    assert_eq!(bytes(bridge.translate(&clock.at(1, 261, 1))), Some([0xB0, 0x2A, 1]));

    bridge.translate(&clock.at(2, SHIFT_A, 0));
    assert!(!bridge.modifiers().shift_a);
    assert_eq!(bytes(bridge.translate(&clock.at(3, 261, 0))), Some([0xB0, 0x0A, 0]));
}

#[test]
fn test_repeated_modifier_event_flips_once() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    bridge.translate(&clock.at(0, SHIFT_B, 1));
    bridge.translate(&clock.at(1, SHIFT_B, 1));
    assert!(bridge.modifiers().shift_b);
}

#[test]
fn test_shift_b_selects_shifted_mixer_destination() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    bridge.translate(&clock.at(0, SHIFT_B, 1));
    assert_eq!(bytes(bridge.translate(&clock.at(1, 21, 2048))), Some([0xB0, 0x51, 64]));
}

#[test]
fn test_jog_backward_motion() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    assert!(bridge.translate(&clock.at(0, 52, 500)).is_none());
    assert_eq!(bytes(bridge.translate(&clock.at(10, 52, 490))), Some([0xB0, 0x03, 118]));
}

#[test]
fn test_jog_burst_collapses_into_one_message() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    bridge.translate(&clock.at(0, 53, 1000));
    assert!(bridge.translate(&clock.at(1, 53, 1010)).is_none());
    assert!(bridge.translate(&clock.at(2, 53, 1020)).is_none());
    // 1020 -> 6 wraps forward by 10, total 30
    assert_eq!(bytes(bridge.translate(&clock.at(6, 53, 6))), Some([0xB1, 0x03, 30]));
}

#[test]
fn test_jog_sensitivity_widens_window() {
    let clock = Clock::new();
    let mut bridge = Bridge::new(load_default_tables().unwrap(), Duration::from_millis(20));

    bridge.translate(&clock.at(0, 52, 100));
    assert!(bridge.translate(&clock.at(10, 52, 105)).is_none());
    assert_eq!(bytes(bridge.translate(&clock.at(20, 52, 107))), Some([0xB0, 0x03, 7]));
}

#[test]
fn test_jog_touch_threshold() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    assert_eq!(bytes(bridge.translate(&clock.at(0, 50, 3100))), Some([0xB0, 0x02, 127]));
    assert_eq!(bytes(bridge.translate(&clock.at(1, 50, 2000))), Some([0xB0, 0x02, 0]));
}

#[test]
fn test_rotary_engines_are_per_deck() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    bridge.translate(&clock.at(0, 55, 4));
    assert_eq!(bytes(bridge.translate(&clock.at(10, 55, 5))), Some([0xB0, 0x04, 0x40]));

    bridge.translate(&clock.at(11, TOGGLE_AC, 1));

    // Deck C has its own engine, so its first reading only primes it
    assert!(bridge.translate(&clock.at(20, 55, 6)).is_none());
    assert_eq!(bytes(bridge.translate(&clock.at(30, 55, 8))), Some([0xB2, 0x04, 0x41]));
}

#[test]
fn test_gain_encoder_tracks_level() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    assert!(bridge.translate(&clock.at(0, 59, 14)).is_none());
    assert_eq!(bytes(bridge.translate(&clock.at(10, 59, 1))), Some([0xB0, 0x37, 0x3F + 3]));
    assert_eq!(bytes(bridge.translate(&clock.at(20, 59, 2))), Some([0xB0, 0x37, 0x3F + 4]));
}

#[test]
fn test_browse_encoder() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    bridge.translate(&clock.at(0, 63, 0));
    assert_eq!(bytes(bridge.translate(&clock.at(10, 63, 15))), Some([0xB0, 0x38, 0x3E]));
}

#[test]
fn test_step_dispatches_to_sink() {
    let clock = Clock::new();
    let mut bridge = make_bridge();
    let mut sink = RecordingSink::default();

    bridge.step(&clock.at(0, 16, 4095), &mut sink).unwrap();
    bridge.step(&clock.at(1, 16, 4095), &mut sink).unwrap();
    bridge.step(&clock.at(2, SHIFT_A, 1), &mut sink).unwrap();
    bridge.step(&clock.at(3, 16, 0), &mut sink).unwrap();

    assert_eq!(sink.sent, vec![vec![0xB0, 0x30, 127], vec![0xB0, 0x50, 0]]);
}

#[test]
fn test_step_propagates_output_failure() {
    let clock = Clock::new();
    let mut bridge = make_bridge();

    // Nothing to send: no error even though the sink is closed
    assert!(bridge.step(&clock.at(0, SHIFT_A, 1), &mut ClosedSink).unwrap().is_none());

    let err = bridge.step(&clock.at(1, 16, 100), &mut ClosedSink).unwrap_err();
    assert!(matches!(err, BridgeError::MidiSend(_)));
}

#[tokio::test]
async fn test_run_stops_on_shutdown_while_events_are_queued() {
    let clock = Clock::new();
    let mut bridge = make_bridge();
    let mut sink = RecordingSink::default();
    let (tx, mut rx) = mpsc::channel(64);

    for i in 0..32 {
        tx.send(clock.at(i, 16, i as i32 * 128)).await.unwrap();
    }
    let (stop, stopped) = oneshot::channel::<()>();
    stop.send(()).unwrap();

    let shutdown = async {
        stopped.await.ok();
    };
    let exit = timeout(Duration::from_secs(2), bridge.run(&mut rx, &mut sink, shutdown))
        .await
        .expect("loop kept running after shutdown")
        .unwrap();

    assert_eq!(exit, LoopExit::Shutdown);
    drop(tx);
}

#[tokio::test]
async fn test_run_sees_shutdown_raised_between_events() {
    let clock = Clock::new();
    let mut bridge = make_bridge();
    let mut sink = RecordingSink::default();
    let (tx, mut rx) = mpsc::channel(8);
    let (stop, stopped) = oneshot::channel::<()>();

    let events = [clock.at(0, 16, 4095), clock.at(1, 17, 4095)];
    let producer = tokio::spawn(async move {
        for event in events {
            tx.send(event).await.unwrap();
            tokio::task::yield_now().await;
        }
        stop.send(()).unwrap();
        // Keep the stream open so only the shutdown can end the loop
        std::future::pending::<()>().await;
        drop(tx);
    });

    let shutdown = async {
        stopped.await.ok();
    };
    let exit = timeout(Duration::from_secs(2), bridge.run(&mut rx, &mut sink, shutdown))
        .await
        .expect("shutdown was lost")
        .unwrap();

    assert_eq!(exit, LoopExit::Shutdown);
    producer.abort();
}

#[tokio::test]
async fn test_run_ends_with_the_stream() {
    let clock = Clock::new();
    let mut bridge = make_bridge();
    let mut sink = RecordingSink::default();
    let (tx, mut rx) = mpsc::channel(8);

    tx.send(clock.at(0, 16, 4095)).await.unwrap();
    drop(tx);

    let exit = bridge
        .run(&mut rx, &mut sink, std::future::pending())
        .await
        .unwrap();

    assert_eq!(exit, LoopExit::StreamEnded);
    assert_eq!(sink.sent, vec![vec![0xB0, 0x30, 127]]);
}

#[tokio::test]
async fn test_run_stops_on_output_failure() {
    let clock = Clock::new();
    let mut bridge = make_bridge();
    let (tx, mut rx) = mpsc::channel(8);

    tx.send(clock.at(0, 16, 100)).await.unwrap();

    let err = bridge
        .run(&mut rx, &mut ClosedSink, std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::MidiSend(_)));
    drop(tx);
}
