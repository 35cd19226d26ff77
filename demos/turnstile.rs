//! Turnstile State Machine
//!
//! The smallest useful machine: two flat states and two events.
//!
//! Key concepts:
//! - Transitions declared through the builder
//! - Events a state does not handle leave it unchanged
//! - History recorded by a listener
//!
//! Run with: cargo run --example turnstile

use arbor::builder::StateMachineBuilder;
use arbor::core::Action;
use arbor::engine::HistoryListener;

fn main() {
    println!("=== Turnstile State Machine ===\n");

    let builder = StateMachineBuilder::<&str, &str, u32>::new();
    builder.configure("Locked").handle_to("coin", "Unlocked");
    builder
        .configure("Unlocked")
        .on_entry(Action::on_context(|coins: &mut u32| *coins += 1))
        .handle_to("push", "Locked");

    let mut machine = builder.build("Locked", 0);
    let history = HistoryListener::new("Locked");
    machine.add_listener(history.clone());

    println!("Initial state: {}\n", machine.state());

    for event in ["push", "coin", "coin", "push", "coin", "push"] {
        match machine.fire(&event) {
            Ok(Some(transition)) => println!(
                "  {event:<5} {} -> {}",
                transition.source, transition.destination
            ),
            Ok(None) => println!("  {event:<5} ignored in {}", machine.state()),
            Err(e) => println!("  {event:<5} failed: {e}"),
        }
    }

    println!("\nCoins collected: {}", machine.context());
    println!("Path taken: {:?}", history.history().get_path());

    println!("\n=== Example Complete ===");
}
