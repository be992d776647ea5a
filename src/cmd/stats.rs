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

use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::select::due_count;
use crate::types::card::Card;
use crate::types::rating::Rating;
use crate::types::timestamp::MILLIS_PER_DAY;
use crate::types::timestamp::Timestamp;

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    card_count: usize,
    due_count: usize,
    new_count: usize,
    pinned_count: usize,
    starred_count: usize,
    mean_ease_factor: Option<f64>,
    reviews_last_day_count: usize,
    easy_last_day_count: usize,
}

pub fn collection_stats(coll: &Collection, now: Timestamp) -> Fallible<Stats> {
    let cards = coll.load_cards(now)?;
    let ratings = coll.db.ratings_since(now.plus_millis(-MILLIS_PER_DAY))?;
    Ok(compute_stats(&cards, now, &ratings))
}

fn compute_stats(cards: &[Card], now: Timestamp, last_day: &[Rating]) -> Stats {
    let mean_ease_factor = if cards.is_empty() {
        None
    } else {
        let total: f64 = cards.iter().map(|card| card.ease_factor).sum();
        Some(total / cards.len() as f64)
    };
    Stats {
        card_count: cards.len(),
        due_count: due_count(cards, now),
        new_count: cards.iter().filter(|card| card.last_reviewed.is_none()).count(),
        pinned_count: cards.iter().filter(|card| card.pinned).count(),
        starred_count: cards.iter().filter(|card| card.starred).count(),
        mean_ease_factor,
        reviews_last_day_count: last_day.len(),
        easy_last_day_count: last_day.iter().filter(|rating| rating.is_easy()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::card_id::CardId;

    const T: Timestamp = Timestamp::from_millis(1_700_000_000_000);

    #[test]
    fn test_empty_stats() -> Fallible<()> {
        let stats = compute_stats(&[], T, &[]);
        assert_eq!(stats.card_count, 0);
        assert_eq!(stats.mean_ease_factor, None);
        let json = serde_json::to_string(&stats)?;
        assert!(json.contains("\"cardCount\":0"));
        assert!(json.contains("\"meanEaseFactor\":null"));
        Ok(())
    }

    #[test]
    fn test_stats() -> Fallible<()> {
        let mut a = Card::new(CardId::new("a")?, "q", "a", T);
        a.pinned = true;
        a.ease_factor = 1.5;
        a.last_reviewed = Some(T);
        let mut b = Card::new(CardId::new("b")?, "q", "a", T.plus_millis(1));
        b.toggle_star(T);
        let stats = compute_stats(&[a, b], T, &[Rating::Easy, Rating::Hard, Rating::Easy]);
        assert_eq!(
            stats,
            Stats {
                card_count: 2,
                due_count: 1,
                new_count: 1,
                pinned_count: 1,
                starred_count: 1,
                mean_ease_factor: Some(2.0),
                reviews_last_day_count: 3,
                easy_last_day_count: 2,
            }
        );
        Ok(())
    }
}
