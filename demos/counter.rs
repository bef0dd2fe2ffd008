//! Simple counter demonstrating signal_kit.
//!
//! This example shows:
//! - Creating signal values
//! - Observing changes and tearing observers down with a bag
//! - Sending values from a background queue onto a host-driven main queue

use signal_kit::prelude::*;
use std::sync::mpsc;

fn main() -> Result<(), signal_kit::SchedulerError> {
    let (main_queue, mut main_loop) = SchedulerQueue::main("main");
    let worker = SchedulerQueue::background("worker")?;

    let bag = DisposableBag::new();
    let count = SignalValue::atomic(0);
    let taps: Signal<SenderEvent<&'static str>> = Signal::new();

    count
        .next(|count| println!("count: {count}"))
        .dispose_with(&bag);

    let target = count.clone();
    taps.next(move |tap| {
        println!("tapped {}", tap.sender());
        target.update(|n| *n += 1);
    })
    .dispose_with(&bag);

    taps.send(SenderEvent::new("+1"));
    taps.send(SenderEvent::new("+1"));

    // Compute on the worker, deliver on the main queue.
    let (done_tx, done_rx) = mpsc::channel();
    let result = count.clone();
    Scheduler::new(worker).dispatch_async(move || {
        result.send_on(42, &main_queue);
        let _ = done_tx.send(());
    });
    let _ = done_rx.recv();
    main_loop.run_pending();

    bag.dispose();
    count.send(0);
    println!("final value: {}", count.value());
    Ok(())
}
