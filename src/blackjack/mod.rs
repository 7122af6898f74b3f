//! A simplified blackjack simulator with an infinite deck.
//!
//! States are small tuples so they can key the learning agent's tables and
//! round-trip through its text checkpoints: the player's hand sum counting
//! every ace as 1, a flag for whether one ace can currently count as 11, and
//! the dealer's up-card.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

/// Totals at or above this end the dealer's drawing phase.
const DEALER_STAND: u8 = 17;
const BLACKJACK: u8 = 21;

/// The two player actions, with the indices used by the Q tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Hit = 0,
    Stand = 1,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::Hit, Action::Stand];

    pub fn disc(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Hit => write!(f, "hit"),
            Action::Stand => write!(f, "stand"),
        }
    }
}

/// An observable game state.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct State {
    /// Hand sum with every ace counted as 1.
    pub hand: u8,
    /// Whether one ace can currently be upgraded to 11 without busting.
    pub ace: bool,
    /// The dealer's up-card value (1..=10).
    pub dealer: u8,
}

impl State {
    /// The hand total with a usable ace counted as 11.
    pub fn total(self) -> u8 {
        if self.ace {
            self.hand + 10
        } else {
            self.hand
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.hand, self.ace as u8, self.dealer)
    }
}

impl FromStr for State {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let inner = input
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| format!("State \"{}\" is not a parenthesized tuple", input))?;
        let mut fields = inner.split(',');
        let mut next_number = || -> Result<u8, String> {
            fields
                .next()
                .ok_or_else(|| format!("State \"{}\" has too few fields", input))?
                .trim()
                .parse::<u8>()
                .map_err(|err| format!("State \"{}\": {}", input, err))
        };
        let hand = next_number()?;
        let ace = next_number()?;
        let dealer = next_number()?;
        if ace > 1 {
            return Err(format!("State \"{}\" has a non-boolean ace flag", input));
        }
        if fields.next().is_some() {
            return Err(format!("State \"{}\" has too many fields", input));
        }
        Ok(State {
            hand,
            ace: ace == 1,
            dealer,
        })
    }
}

/// Every state the learning tables are initialized over.
pub fn states() -> impl Iterator<Item = State> {
    (1..=BLACKJACK).flat_map(|hand| {
        [false, true].into_iter().flat_map(move |ace| {
            (1..=10).map(move |dealer| State { hand, ace, dealer })
        })
    })
}

/// Draw one card from the infinite deck: uniform rank, face cards worth 10.
fn draw(rng: &mut impl Rng) -> u8 {
    let rank: u8 = rng.gen_range(1..=13);
    rank.min(10)
}

/// One blackjack round. The observable state is `None` once the round is
/// settled.
#[derive(Clone, Debug)]
pub struct Game {
    hand: u8,
    has_ace: bool,
    dealer: u8,
    finished: bool,
}

impl Game {
    /// Deal a fresh round: two player cards and the dealer's up-card.
    pub fn deal(rng: &mut impl Rng) -> Self {
        let mut game = Game {
            hand: 0,
            has_ace: false,
            dealer: draw(rng),
            finished: false,
        };
        game.take_card(rng);
        game.take_card(rng);
        game
    }

    pub fn reset(&mut self, rng: &mut impl Rng) {
        *self = Game::deal(rng);
    }

    fn take_card(&mut self, rng: &mut impl Rng) {
        let card = draw(rng);
        self.hand += card;
        self.has_ace |= card == 1;
    }

    fn ace_usable(&self) -> bool {
        self.has_ace && self.hand + 10 <= BLACKJACK
    }

    fn player_total(&self) -> u8 {
        if self.ace_usable() {
            self.hand + 10
        } else {
            self.hand
        }
    }

    pub fn state(&self) -> Option<State> {
        if self.finished {
            None
        } else {
            Some(State {
                hand: self.hand,
                ace: self.ace_usable(),
                dealer: self.dealer,
            })
        }
    }

    /// Apply one action. Returns the reward for the transition and the
    /// successor state, `None` when the round is over.
    pub fn step(&mut self, action: Action, rng: &mut impl Rng) -> (f64, Option<State>) {
        debug_assert!(!self.finished, "stepping a settled round");
        match action {
            Action::Hit => {
                self.take_card(rng);
                if self.hand > BLACKJACK {
                    self.finished = true;
                    (-1.0, None)
                } else {
                    (0.0, self.state())
                }
            }
            Action::Stand => {
                let player = self.player_total();
                let dealer = self.dealer_total(rng);
                self.finished = true;
                let reward = if dealer > BLACKJACK || player > dealer {
                    1.0
                } else if player < dealer {
                    -1.0
                } else {
                    0.0
                };
                (reward, None)
            }
        }
    }

    /// Dealer draws to 17, counting one ace as 11 while that does not bust.
    fn dealer_total(&self, rng: &mut impl Rng) -> u8 {
        let mut sum = self.dealer;
        let mut has_ace = self.dealer == 1;
        loop {
            let total = if has_ace && sum + 10 <= BLACKJACK {
                sum + 10
            } else {
                sum
            };
            if total >= DEALER_STAND {
                return total;
            }
            let card = draw(rng);
            sum += card;
            has_ace |= card == 1;
        }
    }

    /// Play one full round under `policy`, returning each visited state with
    /// the reward received for leaving it.
    pub fn episode(
        &mut self,
        policy: impl Fn(State) -> Action,
        rng: &mut impl Rng,
    ) -> Vec<(State, f64)> {
        let mut steps = vec![];
        while let Some(state) = self.state() {
            let (reward, _) = self.step(policy(state), rng);
            steps.push((state, reward));
        }
        steps
    }
}
