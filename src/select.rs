// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Selecting which cards to study, and in what order.

use std::cmp::Reverse;

use crate::types::card::Card;
use crate::types::timestamp::MILLIS_PER_DAY;
use crate::types::timestamp::Timestamp;

/// The cards due at `now`, earliest-due first. Ties keep collection order.
pub fn due_cards(cards: &[Card], now: Timestamp) -> Vec<&Card> {
    let mut due: Vec<&Card> = cards.iter().filter(|card| card.is_due(now)).collect();
    due.sort_by_key(|card| card.next_review);
    due
}

/// The position in `cards` of the card to study next, if any is due.
pub fn next_due_index(cards: &[Card], now: Timestamp) -> Option<usize> {
    cards
        .iter()
        .enumerate()
        .filter(|(_, card)| card.is_due(now))
        .min_by_key(|(idx, card)| (card.next_review, *idx))
        .map(|(idx, _)| idx)
}

pub fn next_due(cards: &[Card], now: Timestamp) -> Option<&Card> {
    next_due_index(cards, now).map(|idx| &cards[idx])
}

pub fn due_count(cards: &[Card], now: Timestamp) -> usize {
    cards.iter().filter(|card| card.is_due(now)).count()
}

/// Pretend a day has passed by pulling every card's due time one day
/// earlier. Nothing else about the cards changes.
pub fn skip_one_day(cards: &mut [Card]) {
    for card in cards.iter_mut() {
        card.next_review = card.next_review.plus_millis(-MILLIS_PER_DAY);
    }
}

/// Every card, soonest-due first.
pub fn by_next_review(cards: &[Card]) -> Vec<&Card> {
    let mut sorted: Vec<&Card> = cards.iter().collect();
    sorted.sort_by_key(|card| card.next_review);
    sorted
}

/// Cards that have been rated at least once, most recently rated first.
pub fn recent(cards: &[Card], limit: usize) -> Vec<&Card> {
    let mut reviewed: Vec<&Card> = cards
        .iter()
        .filter(|card| card.last_reviewed.is_some())
        .collect();
    reviewed.sort_by_key(|card| Reverse(card.last_reviewed));
    reviewed.truncate(limit);
    reviewed
}

/// Starred cards, most recently starred first.
pub fn starred(cards: &[Card]) -> Vec<&Card> {
    let mut starred: Vec<&Card> = cards.iter().filter(|card| card.starred).collect();
    starred.sort_by_key(|card| Reverse(card.starred_at));
    starred
}
