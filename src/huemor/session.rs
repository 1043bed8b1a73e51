use huemor_model::{ColourCard, ColourName, Phase};
use itertools::Itertools;
use log::{debug, warn};
use rand::seq::SliceRandom;

use super::ui_state::{UiColour, UiState};

pub const DRAW_COUNT: usize = 5;
pub const MAX_SELECTIONS: usize = 2;

/// Shown when the request path failed before the joke facade produced any text.
pub const LOCAL_FALLBACK_JOKE: &str =
    "Couldn't think of a joke... guess my humour is feeling a bit grey today 😅";

/// Emitted exactly once per completed pair of selections.
#[derive(Debug, Clone, PartialEq)]
pub struct JokeRequest {
    pub generation: u64,
    pub first: ColourCard,
    pub second: ColourCard,
}

#[derive(Default)]
pub struct Session {
    phase: Phase,
    drawn: Vec<ColourCard>,
    selections: Vec<ColourName>,
    joke_text: String,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn drawn(&self) -> &[ColourCard] {
        &self.drawn
    }

    pub fn joke_text(&self) -> &str {
        &self.joke_text
    }

    /// Idle -> Picking: samples `DRAW_COUNT` distinct cards from the pool.
    pub fn draw(&mut self, pool: &[ColourCard]) {
        if self.phase != Phase::Idle {
            debug!("Ignoring draw while {:?}", self.phase);
            return;
        }
        self.drawn = pool
            .choose_multiple(&mut rand::thread_rng(), DRAW_COUNT)
            .cloned()
            .collect();
        self.selections.clear();
        self.joke_text.clear();
        self.phase = Phase::Picking;
        debug!(
            "Drew {}",
            self.drawn.iter().map(|c| c.name.as_str()).join(", ")
        );
    }

    /// Toggles selection of a drawn card. Completing the pair moves the
    /// session to Loading and returns the one joke request to dispatch.
    pub fn toggle(&mut self, name: &ColourName) -> Option<JokeRequest> {
        if self.phase != Phase::Picking {
            debug!("Ignoring toggle of {name} while {:?}", self.phase);
            return None;
        }
        if self.card(name).is_none() {
            warn!("Toggle for {name} which is not among the drawn cards");
            return None;
        }
        if let Some(pos) = self.selections.iter().position(|s| s == name) {
            self.selections.remove(pos);
            return None;
        }
        if self.selections.len() >= MAX_SELECTIONS {
            // Selection already full
            return None;
        }
        self.selections.push(name.clone());
        if self.selections.len() < MAX_SELECTIONS {
            return None;
        }

        let pair = (
            self.card(&self.selections[0]).cloned(),
            self.card(&self.selections[1]).cloned(),
        );
        let (Some(first), Some(second)) = pair else {
            // Unreachable: selections are always a subset of drawn
            return None;
        };
        self.phase = Phase::Loading;
        self.generation += 1;
        Some(JokeRequest {
            generation: self.generation,
            first,
            second,
        })
    }

    /// Loading -> Result. Returns false when the response is stale (wrong
    /// generation, or the session has since moved on) and was dropped.
    pub fn settle(&mut self, generation: u64, joke: Option<String>) -> bool {
        if self.phase != Phase::Loading || generation != self.generation {
            return false;
        }
        self.joke_text = joke
            .map(|j| j.trim().to_string())
            .filter(|j| !j.is_empty())
            .unwrap_or_else(|| LOCAL_FALLBACK_JOKE.to_string());
        self.phase = Phase::Result;
        true
    }

    /// Back to Idle. The generation counter survives so a response still in
    /// flight can never match a request fired after the reset.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.drawn.clear();
        self.selections.clear();
        self.joke_text.clear();
    }

    pub fn ui_state(&self) -> UiState {
        UiState {
            phase: self.phase,
            colours: self
                .drawn
                .iter()
                .map(|c| UiColour {
                    name: c.name.clone(),
                    mood: c.mood.clone(),
                    hex: c.hex.clone(),
                    selected: self.selections.contains(&c.name),
                })
                .collect(),
            joke: self.joke_text.clone(),
        }
    }

    fn card(&self, name: &ColourName) -> Option<&ColourCard> {
        self.drawn.iter().find(|c| &c.name == name)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use huemor_model::pool::standard_pool;

    use super::*;

    fn picking_session() -> Session {
        let mut session = Session::new();
        session.draw(&standard_pool());
        session
    }

    fn drawn_name(session: &Session, idx: usize) -> ColourName {
        session.drawn()[idx].name.clone()
    }

    #[test]
    fn draw_samples_five_distinct_cards() {
        let session = picking_session();
        assert_eq!(session.phase(), Phase::Picking);
        assert_eq!(session.drawn().len(), DRAW_COUNT);
        let names: HashSet<_> = session.drawn().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names.len(), DRAW_COUNT);
    }

    #[test]
    fn draw_is_ignored_outside_idle() {
        let mut session = picking_session();
        let drawn_before: Vec<_> = session.drawn().to_vec();
        session.draw(&standard_pool());
        assert_eq!(session.drawn(), drawn_before.as_slice());
        assert_eq!(session.phase(), Phase::Picking);
    }

    #[test]
    fn toggle_selects_and_deselects() {
        let mut session = picking_session();
        let a = drawn_name(&session, 0);
        assert!(session.toggle(&a).is_none());
        assert!(session.ui_state().colours[0].selected);
        assert!(session.toggle(&a).is_none());
        assert!(!session.ui_state().colours[0].selected);
    }

    #[test]
    fn toggle_of_unknown_name_is_ignored() {
        let mut session = picking_session();
        assert!(session.toggle(&ColourName::from("Paisley")).is_none());
        assert_eq!(session.phase(), Phase::Picking);
        assert!(session.ui_state().colours.iter().all(|c| !c.selected));
    }

    #[test]
    fn second_selection_fires_exactly_one_request() {
        let mut session = picking_session();
        let (a, b) = (drawn_name(&session, 0), drawn_name(&session, 1));
        assert!(session.toggle(&a).is_none());
        let request = session.toggle(&b).expect("joke request");
        assert_eq!(request.generation, 1);
        assert_eq!(request.first.name, a);
        assert_eq!(request.second.name, b);
        assert_eq!(session.phase(), Phase::Loading);
    }

    #[test]
    fn deselect_churn_still_fires_exactly_once() {
        let mut session = picking_session();
        let (a, b, c) = (
            drawn_name(&session, 0),
            drawn_name(&session, 1),
            drawn_name(&session, 2),
        );
        assert!(session.toggle(&a).is_none());
        assert!(session.toggle(&a).is_none());
        assert!(session.toggle(&b).is_none());
        let request = session.toggle(&c).expect("joke request");
        assert_eq!(request.first.name, b);
        assert_eq!(request.second.name, c);
        // Selection is full and the session left Picking: no further requests.
        assert!(session.toggle(&a).is_none());
        assert_eq!(session.phase(), Phase::Loading);
    }

    #[test]
    fn toggle_while_full_leaves_state_unchanged() {
        let mut session = picking_session();
        let (a, b, c) = (
            drawn_name(&session, 0),
            drawn_name(&session, 1),
            drawn_name(&session, 2),
        );
        session.toggle(&a);
        session.toggle(&b);
        let state_before = session.ui_state();
        assert!(session.toggle(&c).is_none());
        let state_after = session.ui_state();
        assert_eq!(state_after.phase, state_before.phase);
        assert_eq!(
            state_after
                .colours
                .iter()
                .filter(|c| c.selected)
                .map(|c| c.name.clone())
                .collect::<Vec<_>>(),
            vec![a, b]
        );
    }

    #[test]
    fn settle_with_matching_generation_lands_in_result() {
        let mut session = picking_session();
        session.toggle(&drawn_name(&session, 0));
        let request = session.toggle(&drawn_name(&session, 1)).unwrap();
        assert!(session.settle(request.generation, Some("  What a joke!  ".into())));
        assert_eq!(session.phase(), Phase::Result);
        assert_eq!(session.joke_text(), "What a joke!");
    }

    #[test]
    fn settle_without_joke_uses_local_fallback() {
        let mut session = picking_session();
        session.toggle(&drawn_name(&session, 0));
        let request = session.toggle(&drawn_name(&session, 1)).unwrap();
        assert!(session.settle(request.generation, None));
        assert_eq!(session.joke_text(), LOCAL_FALLBACK_JOKE);
    }

    #[test]
    fn settle_with_blank_joke_uses_local_fallback() {
        let mut session = picking_session();
        session.toggle(&drawn_name(&session, 0));
        let request = session.toggle(&drawn_name(&session, 1)).unwrap();
        assert!(session.settle(request.generation, Some("   ".into())));
        assert_eq!(session.phase(), Phase::Result);
        assert_eq!(session.joke_text(), LOCAL_FALLBACK_JOKE);
    }

    #[test]
    fn settle_with_wrong_generation_is_dropped() {
        let mut session = picking_session();
        session.toggle(&drawn_name(&session, 0));
        let request = session.toggle(&drawn_name(&session, 1)).unwrap();
        assert!(!session.settle(request.generation + 1, Some("Stale".into())));
        assert_eq!(session.phase(), Phase::Loading);
        assert_eq!(session.joke_text(), "");
    }

    #[test]
    fn late_response_after_reset_is_dropped() {
        let mut session = picking_session();
        session.toggle(&drawn_name(&session, 0));
        let request = session.toggle(&drawn_name(&session, 1)).unwrap();
        session.reset();
        assert!(!session.settle(request.generation, Some("Too late".into())));
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.joke_text(), "");
    }

    #[test]
    fn reset_returns_to_idle_defaults() {
        let mut session = picking_session();
        session.toggle(&drawn_name(&session, 0));
        let request = session.toggle(&drawn_name(&session, 1)).unwrap();
        session.settle(request.generation, Some("A joke".into()));
        session.reset();
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.drawn().is_empty());
        assert_eq!(session.joke_text(), "");
        assert!(session.ui_state().colours.is_empty());
    }

    #[test]
    fn full_round_ends_with_non_empty_joke() {
        let mut session = Session::new();
        assert_eq!(session.phase(), Phase::Idle);
        session.draw(&standard_pool());
        assert_eq!(session.phase(), Phase::Picking);
        session.toggle(&drawn_name(&session, 3));
        let request = session.toggle(&drawn_name(&session, 4)).unwrap();
        assert_eq!(session.phase(), Phase::Loading);
        assert!(session.settle(request.generation, Some("Teal deal!".into())));
        assert_eq!(session.phase(), Phase::Result);
        assert!(!session.joke_text().is_empty());
        session.reset();
        assert_eq!(session.phase(), Phase::Idle);
    }
}
