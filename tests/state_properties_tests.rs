//! Property tests for board generation and match counters.

use clue_arena::board::{Board, CardColor, WordList};
use clue_arena::core::{Competition, GameRng, Role, SeatMap, Team};
use clue_arena::game::{Clue, EndReason, GameState, MissKind, Occupant};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Step {
    Clue(u32),
    Guess(Vec<usize>),
    Miss,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1u32..5).prop_map(Step::Clue),
        prop::collection::vec(0usize..25, 1..6).prop_map(Step::Guess),
        Just(Step::Miss),
    ]
}

fn new_game(seed: u64) -> GameState {
    let mut rng = GameRng::new(seed);
    GameState::generate(
        Competition::ClueCompetition,
        SeatMap::with_value(Occupant::local("v")),
        &WordList::default(),
        &mut rng,
        0,
    )
    .unwrap()
}

proptest! {
    #[test]
    fn prop_board_layout(seed in any::<u64>()) {
        let board = Board::generate(&WordList::default(), &mut GameRng::new(seed)).unwrap();
        let count = |color| board.cards().filter(|c| c.color == color).count();

        prop_assert_eq!(board.len(), 25);
        prop_assert_eq!(count(CardColor::Red), 9);
        prop_assert_eq!(count(CardColor::Blue), 8);
        prop_assert_eq!(count(CardColor::Bystander), 7);
        prop_assert_eq!(count(CardColor::Assassin), 1);

        let mut words = board.words();
        words.sort();
        words.dedup();
        prop_assert_eq!(words.len(), 25);
    }

    #[test]
    fn prop_counters_never_increase(seed in any::<u64>(), steps in prop::collection::vec(step(), 1..60)) {
        let mut state = new_game(seed);
        let mut red = state.remaining(Team::Red);
        let mut blue = state.remaining(Team::Blue);

        for step in steps {
            if state.is_over() {
                break;
            }
            match (state.current_role(), step) {
                (_, Step::Miss) => {
                    state.record_miss(MissKind::NoResponse).unwrap();
                }
                (Role::Spymaster, Step::Clue(n)) => {
                    state.apply_clue(Clue::new("zebra", n), None).unwrap();
                }
                (Role::Operative, Step::Guess(indices)) => {
                    let words: Vec<String> = indices
                        .iter()
                        .filter_map(|&i| state.board().card(i).map(|c| c.word.clone()))
                        .collect();
                    state.apply_guesses(&words, None).unwrap();
                }
                _ => continue,
            }

            prop_assert!(state.remaining(Team::Red) <= red);
            prop_assert!(state.remaining(Team::Blue) <= blue);
            red = state.remaining(Team::Red);
            blue = state.remaining(Team::Blue);
        }

        if state.end_reason() == Some(EndReason::AllRevealed) {
            let winner = state.winner().unwrap();
            prop_assert_eq!(state.remaining(winner), 0);
            prop_assert!(state.remaining(winner.other()) > 0);
        }
    }
}
