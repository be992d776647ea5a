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

//! The browsing order of the collection.
//!
//! Manual ordering keeps every card's `order` dense and 0-based, with all
//! pinned cards ahead of all unpinned cards. Call [`normalize_orders`] after
//! anything that changes pins or membership, before persisting.

use std::cmp::Ordering;

use feruca::Collator;
use unidecode::unidecode_char;

use crate::types::card::Card;
use crate::types::review_mode::ReviewMode;

/// Cards sharing a first letter, in alphabetical order.
pub struct Cluster<'a> {
    pub label: String,
    pub cards: Vec<&'a Card>,
}

/// The order in which to list cards for browsing.
pub fn review_order(cards: &[Card], mode: ReviewMode) -> Vec<&Card> {
    let mut sorted: Vec<&Card> = cards.iter().collect();
    match mode {
        ReviewMode::PinnedManual => {
            sorted.sort_by_key(|card| (!card.pinned, card.order));
        }
        ReviewMode::AlphabeticalClustered => {
            let mut collator = Collator::default();
            sorted.sort_by(|a, b| {
                collate(&mut collator, a.display_title(), b.display_title())
            });
        }
    }
    sorted
}

/// Group alphabetically sorted cards by the uppercased first letter of their
/// title, with accents dropped from Latin letters. Only consecutive runs are
/// merged, so the input order is preserved.
pub fn clusters<'a>(sorted: &[&'a Card]) -> Vec<Cluster<'a>> {
    let mut clusters: Vec<Cluster<'a>> = Vec::new();
    for &card in sorted {
        let label = cluster_label(card.display_title());
        if let Some(last) = clusters.last_mut() {
            if last.label == label {
                last.cards.push(card);
                continue;
            }
        }
        clusters.push(Cluster {
            label,
            cards: vec![card],
        });
    }
    clusters
}

/// Reassign dense `order` keys: pinned cards first, then unpinned, each
/// group keeping its relative `order`. The slice itself is left in that
/// canonical order.
pub fn normalize_orders(cards: &mut [Card]) {
    cards.sort_by_key(|card| (!card.pinned, card.order));
    for (idx, card) in cards.iter_mut().enumerate() {
        card.order = idx as i64;
    }
}

/// Pin or unpin the card at `idx`. A newly pinned card goes to the top of
/// the pinned group; a newly unpinned card goes to the bottom of the list.
pub fn toggle_pin(cards: &mut [Card], idx: usize) {
    let pinned = !cards[idx].pinned;
    let order = if pinned {
        cards
            .iter()
            .enumerate()
            .filter(|(i, card)| *i != idx && card.pinned)
            .map(|(_, card)| card.order)
            .min()
            .map(|min| min - 1)
            .unwrap_or(0)
    } else {
        max_order(cards).map(|max| max + 1).unwrap_or(0)
    };
    let card = &mut cards[idx];
    card.pinned = pinned;
    card.order = order;
    normalize_orders(cards);
}

/// Add a card at the end of the unpinned group.
pub fn append_card(cards: &mut Vec<Card>, mut card: Card) {
    card.order = max_order(cards).map(|max| max + 1).unwrap_or(0);
    cards.push(card);
    normalize_orders(cards);
}

/// Remove the card at `idx`, closing the gap it leaves.
pub fn remove_card(cards: &mut Vec<Card>, idx: usize) -> Card {
    let card = cards.remove(idx);
    normalize_orders(cards);
    card
}

fn max_order(cards: &[Card]) -> Option<i64> {
    cards.iter().map(|card| card.order).max()
}

/// Case-insensitive comparison under the Unicode collation algorithm (CLDR
/// root order), falling back to the exact text so the order is total.
fn collate(collator: &mut Collator, a: &str, b: &str) -> Ordering {
    let folded_a = a.to_lowercase();
    let folded_b = b.to_lowercase();
    collator
        .collate(folded_a.as_str(), folded_b.as_str())
        .then_with(|| a.cmp(b))
}

/// End of the Latin Extended-B block.
const LATIN_END: char = '\u{024F}';

fn cluster_label(title: &str) -> String {
    let Some(c) = title.chars().next() else {
        return "#".to_string();
    };
    if !c.is_ascii() && c <= LATIN_END {
        let mut base = unidecode_char(c).chars();
        if let (Some(letter), None) = (base.next(), base.next()) {
            if letter.is_ascii_alphabetic() {
                return letter.to_ascii_uppercase().to_string();
            }
        }
    }
    c.to_uppercase().collect()
}
