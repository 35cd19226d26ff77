//! Property-based tests for the hierarchy and the transition engine.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated hierarchies and event sequences.

use arbor::core::Transition;
use arbor::engine::HistoryListener;
use arbor::structure::Structure;
use proptest::prelude::*;
use proptest::sample::Index;

type Forest = Structure<u32, u32, ()>;

/// Node `i` optionally hangs beneath one of the nodes created before it.
fn forest(parents: &[Option<Index>]) -> Forest {
    let structure = Structure::new();
    structure.get_or_create(0);
    for (i, parent) in parents.iter().enumerate() {
        let node = i as u32 + 1;
        structure.get_or_create(node);
        if let Some(parent) = parent {
            let parent = parent.index(node as usize) as u32;
            structure.set_parent(node, &parent).unwrap();
        }
    }
    structure
}

fn root_of(structure: &Forest, mut state: u32) -> u32 {
    while let Some(parent) = structure.parent_of(&state) {
        state = parent;
    }
    state
}

prop_compose! {
    fn arbitrary_forest()(parents in prop::collection::vec(prop::option::of(any::<Index>()), 0..12)) -> (Forest, u32) {
        let size = parents.len() as u32 + 1;
        (forest(&parents), size)
    }
}

prop_compose! {
    fn arbitrary_transitions()(
        edges in prop::collection::vec((0..3u32, 0..6u32, 0..6u32), 0..16)
    ) -> Vec<(u32, u32, u32)> {
        edges
    }
}

proptest! {
    #[test]
    fn common_ancestor_is_symmetric((structure, size) in arbitrary_forest(), a in 0..12u32, b in 0..12u32) {
        let (a, b) = (a % size, b % size);
        prop_assert_eq!(structure.common_ancestor(&a, &b), structure.common_ancestor(&b, &a));
    }

    #[test]
    fn common_ancestor_sits_above_both((structure, size) in arbitrary_forest(), a in 0..12u32, b in 0..12u32) {
        let (a, b) = (a % size, b % size);
        match structure.common_ancestor(&a, &b) {
            Some(ancestor) => {
                prop_assert!(ancestor == a || structure.is_ancestor(&a, &ancestor));
                prop_assert!(ancestor == b || structure.is_ancestor(&b, &ancestor));
                prop_assert!(ancestor != a || a != b);
            }
            None => prop_assert_ne!(root_of(&structure, a), root_of(&structure, b)),
        }
    }

    #[test]
    fn common_ancestor_of_a_state_with_itself_is_its_parent((structure, size) in arbitrary_forest(), a in 0..12u32) {
        let a = a % size;
        prop_assert_eq!(structure.common_ancestor(&a, &a), structure.parent_of(&a));
    }

    #[test]
    fn fire_moves_to_destination_or_stays(
        parents in prop::collection::vec(prop::option::of(any::<Index>()), 5),
        edges in arbitrary_transitions(),
        events in prop::collection::vec(0..4u32, 1..20),
    ) {
        let structure = forest(&parents);
        for (event, source, destination) in edges {
            structure.add_transition(event, Transition::new(source, destination));
        }
        let mut machine = structure.build(0, ());

        for event in events {
            let before = *machine.state();
            match machine.fire(&event) {
                Ok(Some(transition)) => prop_assert_eq!(*machine.state(), transition.destination),
                Ok(None) => prop_assert_eq!(*machine.state(), before),
                // Ambiguity is reported before anything runs.
                Err(_) => prop_assert_eq!(*machine.state(), before),
            }
        }
    }

    #[test]
    fn history_path_follows_taken_transitions(coins in prop::collection::vec(any::<bool>(), 0..24)) {
        let structure: Structure<&str, &str, ()> = Structure::new();
        structure.add_transition("coin", Transition::new("Locked", "Unlocked"));
        structure.add_transition("push", Transition::new("Unlocked", "Locked"));
        let mut machine = structure.build("Locked", ());
        let history = HistoryListener::new("Locked");
        machine.add_listener(history.clone());

        let mut expected = vec!["Locked"];
        for coin in coins {
            let event = if coin { "coin" } else { "push" };
            if let Some(transition) = machine.fire(&event).unwrap() {
                expected.push(transition.destination);
            }
        }

        let recorded = history.history();
        let path: Vec<&str> = recorded.get_path().into_iter().copied().collect();
        if recorded.is_empty() {
            prop_assert!(path.is_empty());
        } else {
            prop_assert_eq!(path, expected);
        }
    }
}
