//! DVD Player State Machine
//!
//! A hierarchical machine: `Playing` and `Paused` live inside `Active`, so
//! one `Stop` handler on the parent serves both children.
//!
//! Key concepts:
//! - Parent states handling events for their children
//! - Exit and entry cascades around the common ancestor
//! - Guards reading the context
//! - Ordered entry actions on a sorted structure
//! - The same structure driven by an asynchronous worker
//!
//! Run with: cargo run --example dvd_player

use arbor::builder::StateMachineBuilder;
use arbor::core::{Action, ResolvedTransition, TransitionAction};
use arbor::structure::Structure;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Player {
    Stopped,
    Active,
    Playing,
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Button {
    Play,
    Pause,
    Stop,
}

#[derive(Debug, Default)]
struct Deck {
    has_disc: bool,
}

fn announce(verb: &'static str) -> Action<Player, Button, Deck> {
    Action::new(move |state: &Player, _: &Button, _: &ResolvedTransition<Player>, _: &mut Deck| {
        println!("    {verb} {state:?}")
    })
}

fn main() {
    println!("=== DVD Player State Machine ===\n");

    // Higher priority entry actions run first.
    let structure = Structure::with_action_order(
        |a: &Action<Player, Button, Deck>, b: &Action<Player, Button, Deck>| b.priority().cmp(&a.priority()),
        |a: &Action<Player, Button, Deck>, b: &Action<Player, Button, Deck>| a.priority().cmp(&b.priority()),
    );
    let builder = StateMachineBuilder::from_structure(structure);
    builder
        .configure(Player::Stopped)
        .on_entry(announce("enter"))
        .on_exit(announce("exit"))
        .handle_when(Button::Play, Player::Playing, |_, _, deck: &Deck| deck.has_disc);
    builder
        .configure(Player::Active)
        .on_entry(announce("enter"))
        .on_entry(Action::on_context(|_: &mut Deck| println!("    spin up disc")).with_priority(1))
        .on_exit(announce("exit"))
        .handle_with(
            Button::Stop,
            Player::Stopped,
            TransitionAction::new(|ancestor: Option<&Player>, _: &Button, _: &ResolvedTransition<Player>, _: &mut Deck| {
                println!("    between cascades, common ancestor: {ancestor:?}")
            }),
        );
    for child in [Player::Playing, Player::Paused] {
        if let Err(e) = builder.configure(child).child_of(Player::Active) {
            println!("Could not configure {child:?}: {e}");
            return;
        }
    }
    builder
        .configure(Player::Playing)
        .on_entry(announce("enter"))
        .on_exit(announce("exit"))
        .handle_to(Button::Pause, Player::Paused);
    builder
        .configure(Player::Paused)
        .on_entry(announce("enter"))
        .on_exit(announce("exit"))
        .handle_to(Button::Play, Player::Playing);

    println!("Hierarchy:");
    println!("  Stopped");
    println!("  Active > {{ Playing, Paused }}\n");

    let mut empty = builder.build(Player::Stopped, Deck { has_disc: false });
    println!("Without a disc:");
    match empty.fire(&Button::Play) {
        Ok(None) => println!("  Play ignored, still {:?}\n", empty.state()),
        other => println!("  Unexpected result: {other:?}\n"),
    }

    let mut machine = builder.build(Player::Stopped, Deck { has_disc: true });
    println!("With a disc:");
    for button in [Button::Play, Button::Pause, Button::Play, Button::Stop] {
        println!("  {button:?}");
        match machine.fire(&button) {
            Ok(Some(transition)) => println!(
                "  handled by {:?}, now {:?}",
                transition.source,
                machine.state()
            ),
            Ok(None) => println!("  ignored"),
            Err(e) => println!("  failed: {e}"),
        }
    }

    println!("\nSame structure, asynchronous worker:");
    let player = Arc::new(builder.build_async(Player::Stopped, Deck { has_disc: true }));
    let worker = match player.spawn() {
        Ok(worker) => worker,
        Err(e) => {
            println!("  Could not start worker: {e}");
            return;
        }
    };
    let handles: Vec<_> = [Button::Play, Button::Pause, Button::Stop]
        .into_iter()
        .map(|button| player.submit(button))
        .collect();
    for handle in handles {
        if let Err(e) = handle.wait() {
            println!("  failed: {e}");
        }
    }
    player.stop();
    match worker.join() {
        Ok(Ok(())) => println!("  worker stopped in {:?}", player.state()),
        Ok(Err(e)) => println!("  worker failed: {e}"),
        Err(_) => println!("  worker panicked"),
    }

    println!("\n=== Example Complete ===");
}
