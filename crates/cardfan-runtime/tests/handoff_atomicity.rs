//! Cross-thread handoff tests with real producer threads.
//!
//! The test thread plays the UI thread and pumps the loop; producers run on
//! spawned threads.
//!
//! 1. Concurrent `cards_added([A, B])` and `cards_removed([C])` never expose a
//!    torn identity map to any UI task, including pointer dispatch
//! 2. On return from a listener call, the change is visible on the UI thread
//! 3. A producer's batches land in submission order
//! 4. Producers blocked on a dropped loop are released with `LoopClosed`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use cardfan_core::{PaneConfig, PointerEvent};
use cardfan_runtime::{
    CardsetListener, FixedSizeFactory, HandError, HandView, HandoffError, SyncBridge, UiLoop,
    VisualHand,
};
use web_time::Duration;

const PATIENCE: Duration = Duration::from_secs(10);

/// Scene with one hand plus a record of every consistency observer.
struct Table {
    hand: HandView<String>,
    checks: Vec<bool>,
}

impl Table {
    fn new() -> Self {
        Self {
            hand: HandView::horizontal(PaneConfig::new(10.0, -20.0)),
            checks: Vec::new(),
        }
    }
}

fn hand_for(ui: &UiLoop<Table>) -> VisualHand<String, Table> {
    VisualHand::new(
        SyncBridge::new(ui.scheduler()),
        FixedSizeFactory::new(50.0, 70.0),
        |table: &mut Table| &mut table.hand,
    )
}

fn cards(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

#[test]
fn concurrent_add_and_remove_never_tear() {
    for round in 0..25 {
        let mut ui = UiLoop::new(Table::new());
        let hand = hand_for(&ui);

        // Seed C through the UI thread's own view.
        let seed = hand.clone();
        let seeding = thread::spawn(move || seed.cards_added(&cards(&["C"])));
        assert!(ui.run_until(|_| seeding.is_finished(), PATIENCE));
        seeding.join().unwrap().unwrap();

        let adder = hand.clone();
        let remover = hand.clone();
        let add = thread::spawn(move || adder.cards_added(&cards(&["A", "B"])));
        let remove = thread::spawn(move || remover.cards_removed(&cards(&["C"])));

        // Check from a third thread while the producers race.
        let stop = Arc::new(AtomicBool::new(false));
        let scheduler = ui.scheduler();
        let check_stop = Arc::clone(&stop);
        let checker = thread::spawn(move || {
            while !check_stop.load(Ordering::Acquire) {
                if scheduler
                    .run_later(|table: &mut Table| {
                        let ok = table.hand.is_consistent();
                        table.checks.push(ok);
                        // Pointer input interleaves with structural changes.
                        table.hand.handle_pointer(&PointerEvent::press(5.0, 5.0));
                        table.hand.handle_pointer(&PointerEvent::release(5.0, 5.0));
                    })
                    .is_err()
                {
                    break;
                }
                thread::yield_now();
            }
        });

        assert!(
            ui.run_until(|_| add.is_finished() && remove.is_finished(), PATIENCE),
            "round {round}: producers did not finish"
        );
        stop.store(true, Ordering::Release);
        checker.join().unwrap();
        ui.run_pending();

        add.join().unwrap().unwrap();
        remove.join().unwrap().unwrap();

        let table = ui.scene();
        assert!(table.checks.iter().all(|&ok| ok), "round {round}: torn map observed");
        assert!(table.hand.is_consistent());
        assert_eq!(table.hand.cards_in_rank_order(), cards(&["A", "B"]));
    }
}

#[test]
fn listener_returns_after_change_is_visible() {
    let mut ui = UiLoop::new(Table::new());
    let hand = hand_for(&ui);
    let scheduler = ui.scheduler();

    let producer = thread::spawn(move || -> Result<usize, HandError> {
        hand.cards_added(&cards(&["7H", "8H", "9H"]))?;
        // Read back on the UI thread right after the blocking call.
        let (tx, rx) = std::sync::mpsc::channel();
        scheduler
            .run_later(move |table: &mut Table| {
                let _ = tx.send(table.hand.len());
            })
            .map_err(HandError::from)?;
        Ok(rx.recv().unwrap_or(0))
    });

    assert!(ui.run_until(|_| producer.is_finished(), PATIENCE));
    assert_eq!(producer.join().unwrap(), Ok(3));
}

#[test]
fn batches_from_one_producer_apply_in_order() {
    let mut ui = UiLoop::new(Table::new());
    let hand = hand_for(&ui);
    let producer = thread::spawn(move || -> Result<(), HandError> {
        for batch in [["1", "2"], ["3", "4"], ["5", "6"]] {
            hand.cards_added(&cards(&batch))?;
        }
        hand.cards_removed(&cards(&["2", "5"]))
    });
    assert!(ui.run_until(|_| producer.is_finished(), PATIENCE));
    producer.join().unwrap().unwrap();
    assert_eq!(
        ui.scene().hand.cards_in_rank_order(),
        cards(&["1", "3", "4", "6"])
    );
    let offsets: Vec<f64> = ["1", "3", "4", "6"]
        .iter()
        .map(|c| ui.scene().hand.item_for(&(*c).to_string()).unwrap().offset())
        .collect();
    assert_eq!(offsets, vec![0.0, 60.0, 120.0, 180.0]);
}

#[test]
fn dropping_loop_releases_blocked_producers() {
    let ui = UiLoop::new(Table::new());
    let hand = hand_for(&ui);
    let observer = hand.bridge().clone();

    let producers: Vec<_> = (0..4)
        .map(|i| {
            let hand = hand.clone();
            thread::spawn(move || hand.cards_added(&[format!("card-{i}")]))
        })
        .collect();
    while observer.pending() < 4 {
        thread::sleep(Duration::from_millis(1));
    }
    drop(ui);

    for producer in producers {
        assert_eq!(
            producer.join().unwrap(),
            Err(HandError::Handoff(HandoffError::LoopClosed))
        );
    }
}
