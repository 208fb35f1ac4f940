//! Player hands and the card deck

use crate::cards::{Card, CardKind};
use crate::error::GameError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Most cards a hand can hold
pub const HAND_LIMIT: usize = 3;

/// A card in a hand, with its "drawn this turn" tag
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandCard {
    #[serde(flatten)]
    pub card: Card,
    pub newly_drawn: bool,
}

/// Ordered hand of at most `HAND_LIMIT` cards
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    cards: Vec<HandCard>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a hand from stored cards; anything past the limit is dropped
    pub fn from_cards(cards: impl IntoIterator<Item = HandCard>) -> Self {
        Self {
            cards: cards.into_iter().take(HAND_LIMIT).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.cards.len() >= HAND_LIMIT
    }

    pub fn cards(&self) -> &[HandCard] {
        &self.cards
    }

    /// Add a newly drawn card. A full hand ignores the draw.
    pub fn draw(&mut self, card: Card) -> bool {
        if self.is_full() {
            return false;
        }
        self.cards.push(HandCard {
            card,
            newly_drawn: true,
        });
        true
    }

    /// The card at `index` if it may be played now
    pub fn playable(&self, index: usize) -> Result<&Card, GameError> {
        let entry = self.cards.get(index).ok_or(GameError::NoSuchCard(index))?;
        if entry.newly_drawn {
            return Err(GameError::NewlyDrawnCard);
        }
        Ok(&entry.card)
    }

    /// Remove a spent card
    pub fn remove(&mut self, index: usize) -> Option<Card> {
        if index < self.cards.len() {
            Some(self.cards.remove(index).card)
        } else {
            None
        }
    }

    /// Cards drawn last turn become playable
    pub fn clear_newly_drawn(&mut self) {
        for entry in &mut self.cards {
            entry.newly_drawn = false;
        }
    }
}

/// Source of drawn cards: uniform over the four kinds, with replacement
#[derive(Clone, Debug)]
pub struct Deck {
    rng: ChaCha8Rng,
}

impl Deck {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Deterministic deck for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn draw(&mut self) -> Card {
        let kind = CardKind::ALL[self.rng.gen_range(0..CardKind::ALL.len())];
        Card::new(kind)
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}
