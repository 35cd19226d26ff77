//! Queue ordering, stop and clear semantics of the asynchronous machine.

use arbor::builder::StateMachineBuilder;
use arbor::core::{Action, HsmError, ResolvedTransition};
use arbor::engine::HistoryListener;
use arbor::AsyncStateMachine;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

type Turnstile = AsyncStateMachine<&'static str, &'static str, ()>;

fn turnstile() -> Arc<Turnstile> {
    let builder = StateMachineBuilder::new();
    builder.configure("Locked").handle_to("coin", "Unlocked");
    builder.configure("Unlocked").handle_to("push", "Locked");
    Arc::new(builder.build_async("Locked", ()))
}

/// Gate an entrance action can block on until the test opens it.
#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    changed: Condvar,
    entered: Mutex<bool>,
    arrived: Condvar,
}

impl Gate {
    fn pass(&self) {
        *self.entered.lock() = true;
        self.arrived.notify_all();
        let mut open = self.open.lock();
        while !*open {
            self.changed.wait(&mut open);
        }
    }

    fn wait_for_arrival(&self) {
        let mut entered = self.entered.lock();
        while !*entered {
            self.arrived.wait(&mut entered);
        }
    }

    fn release(&self) {
        *self.open.lock() = true;
        self.changed.notify_all();
    }
}

/// Turnstile whose "Stalled" entrance action blocks on `gate`.
fn stallable(gate: Arc<Gate>) -> Arc<Turnstile> {
    let builder = StateMachineBuilder::new();
    builder.configure("Locked").handle_to("coin", "Unlocked").handle_to("jam", "Stalled");
    builder.configure("Unlocked").handle_to("push", "Locked");
    builder
        .configure("Stalled")
        .on_entry(Action::on_context(move |_: &mut ()| gate.pass()))
        .handle_to("kick", "Locked");
    Arc::new(builder.build_async("Locked", ()))
}

#[test]
fn submissions_are_processed_in_call_order() {
    let machine = turnstile();
    let history = HistoryListener::new("Locked");
    machine.add_listener(history.clone());

    let handles: Vec<_> = ["coin", "coin", "push", "push"]
        .into_iter()
        .map(|event| machine.submit(event))
        .collect();
    let worker = machine.spawn().unwrap();

    let results: Vec<bool> = handles
        .iter()
        .map(|handle| handle.wait().unwrap().is_some())
        .collect();
    assert_eq!(results, vec![true, false, true, false]);
    assert_eq!(machine.state(), "Locked");
    assert_eq!(history.history().get_path(), vec![&"Locked", &"Unlocked", &"Locked"]);

    machine.stop();
    worker.join().unwrap().unwrap();
}

#[test]
fn fire_blocks_until_processed() {
    let machine = turnstile();
    let worker = machine.spawn().unwrap();

    assert_eq!(
        machine.fire("coin"),
        Ok(Some(ResolvedTransition::new("Locked", "Unlocked")))
    );
    assert_eq!(machine.state(), "Unlocked");
    assert_eq!(machine.fire("coin"), Ok(None));

    machine.stop();
    worker.join().unwrap().unwrap();
}

#[test]
fn many_producers_one_transition_at_a_time() {
    let machine = turnstile();
    let worker = machine.spawn().unwrap();

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let machine = Arc::clone(&machine);
            thread::spawn(move || {
                for _ in 0..25 {
                    machine.fire("coin").unwrap();
                    machine.fire("push").unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert!(matches!(machine.state(), "Locked" | "Unlocked"));
    machine.stop();
    worker.join().unwrap().unwrap();
}

#[test]
fn inject_jumps_ahead_of_queued_events() {
    let gate = Arc::new(Gate::default());
    let machine = stallable(Arc::clone(&gate));
    let worker = machine.spawn().unwrap();

    let jam = machine.submit("jam");
    gate.wait_for_arrival();

    let coin = machine.submit("coin");
    let kick = machine.inject("kick");
    assert_eq!(machine.pending_events(), vec!["kick", "coin"]);

    gate.release();
    assert!(jam.wait().unwrap().is_some());
    assert_eq!(kick.wait(), Ok(Some(ResolvedTransition::new("Stalled", "Locked"))));
    assert_eq!(coin.wait(), Ok(Some(ResolvedTransition::new("Locked", "Unlocked"))));

    machine.stop();
    worker.join().unwrap().unwrap();
}

#[test]
fn stop_lets_queued_events_finish() {
    let gate = Arc::new(Gate::default());
    let machine = stallable(Arc::clone(&gate));
    let worker = machine.spawn().unwrap();

    machine.submit("jam");
    gate.wait_for_arrival();
    let kick = machine.submit("kick");
    let coin = machine.submit("coin");
    machine.stop();
    let late = machine.submit("push");

    assert!(machine.is_running());
    gate.release();
    worker.join().unwrap().unwrap();

    assert!(!machine.is_running());
    assert!(kick.is_done());
    assert!(coin.is_done());
    assert_eq!(machine.state(), "Unlocked");
    assert!(!late.is_done());
    assert_eq!(machine.pending_events(), vec!["push"]);
}

#[test]
fn clear_cancels_queued_events_but_not_a_pending_stop() {
    let gate = Arc::new(Gate::default());
    let machine = stallable(Arc::clone(&gate));
    let worker = machine.spawn().unwrap();

    let jam = machine.submit("jam");
    gate.wait_for_arrival();
    let kick = machine.submit("kick");
    machine.stop();
    let coin = machine.submit("coin");

    machine.clear();
    assert!(machine.pending_events().is_empty());
    gate.release();
    worker.join().unwrap().unwrap();

    assert!(jam.wait().unwrap().is_some());
    assert_eq!(kick.wait(), Err(HsmError::Cancelled));
    assert_eq!(coin.wait(), Err(HsmError::Cancelled));
    assert_eq!(machine.state(), "Stalled");
    assert!(!machine.is_running());
}

#[test]
fn cancelled_handle_is_skipped() {
    let machine = turnstile();
    let coin = machine.submit("coin");
    let push = machine.submit("push");

    assert!(coin.cancel());
    let worker = machine.spawn().unwrap();

    assert_eq!(push.wait(), Ok(None));
    assert_eq!(machine.state(), "Locked");
    assert_eq!(coin.wait(), Err(HsmError::Cancelled));

    machine.stop();
    worker.join().unwrap().unwrap();
}

#[test]
fn fire_from_an_action_is_rejected() {
    let slot: Arc<Mutex<Option<Arc<Turnstile>>>> = Arc::new(Mutex::new(None));
    let outcome = Arc::new(Mutex::new(None));

    let builder = StateMachineBuilder::new();
    builder.configure("Locked").handle_to("coin", "Unlocked");
    let machine_slot = Arc::clone(&slot);
    let sink = Arc::clone(&outcome);
    builder
        .configure("Unlocked")
        .on_entry(Action::on_context(move |_: &mut ()| {
            if let Some(machine) = machine_slot.lock().clone() {
                *sink.lock() = Some(machine.fire("push"));
            }
        }))
        .handle_to("push", "Locked");
    let machine: Arc<Turnstile> = Arc::new(builder.build_async("Locked", ()));
    *slot.lock() = Some(Arc::clone(&machine));
    let worker = machine.spawn().unwrap();

    assert!(machine.fire("coin").unwrap().is_some());
    assert_eq!(*outcome.lock(), Some(Err(HsmError::Reentrancy)));

    machine.stop();
    worker.join().unwrap().unwrap();
    slot.lock().take();
}

#[test]
fn failed_worker_can_be_restarted() {
    let builder = StateMachineBuilder::<&str, &str, ()>::new();
    builder
        .configure("Locked")
        .handle_to("coin", "Unlocked")
        .handle_to("coin", "Broken");
    builder.configure("Unlocked").handle_to("push", "Locked");
    let machine = Arc::new(builder.build_async("Unlocked", ()));

    let push = machine.submit("push");
    let coin = machine.submit("coin");
    let after = machine.submit("push");
    let worker = machine.spawn().unwrap();

    assert!(push.wait().unwrap().is_some());
    assert!(matches!(
        coin.wait(),
        Err(HsmError::AmbiguousTransition { count: 2, .. })
    ));
    assert!(matches!(worker.join().unwrap(), Err(HsmError::WorkerFailure { .. })));
    assert!(!machine.is_running());
    assert_eq!(after.wait_timeout(Duration::from_millis(20)), None);

    machine.force_state("Unlocked");
    let worker = machine.spawn().unwrap();
    assert!(after.wait().unwrap().is_some());
    assert_eq!(machine.state(), "Locked");

    machine.stop();
    worker.join().unwrap().unwrap();
}
