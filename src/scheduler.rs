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

//! A two-outcome variant of SM-2.
//!
//! A "hard" rating resets the learning cycle and lowers the ease factor. An
//! "easy" rating grows the interval (1 day, then 3 days, then the previous
//! interval times the ease factor) and raises the ease factor up to its
//! ceiling.

use crate::types::card::Card;
use crate::types::card::MAX_EASE_FACTOR;
use crate::types::card::MIN_EASE_FACTOR;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

/// Subtracted from the ease factor on a "hard" rating.
const HARD_PENALTY: f64 = 0.15;

/// Added to the ease factor on an "easy" rating.
const EASY_BONUS: f64 = 0.05;

/// Interval after the first successful recall.
const FIRST_INTERVAL: u32 = 1;

/// Interval after the second consecutive successful recall.
const SECOND_INTERVAL: u32 = 3;

/// Interval after a "hard" rating.
const RELEARN_INTERVAL: u32 = 1;

/// Update a card's scheduling state after it was rated at `now`.
pub fn rate(card: &mut Card, rating: Rating, now: Timestamp) {
    match rating {
        Rating::Hard => {
            card.repetitions = 0;
            card.interval = RELEARN_INTERVAL;
            card.ease_factor = (card.ease_factor - HARD_PENALTY).max(MIN_EASE_FACTOR);
        }
        Rating::Easy => {
            card.interval = match card.repetitions {
                0 => FIRST_INTERVAL,
                1 => SECOND_INTERVAL,
                _ => grow(card.interval, card.ease_factor),
            };
            card.repetitions = card.repetitions.saturating_add(1);
            card.ease_factor = (card.ease_factor + EASY_BONUS).min(MAX_EASE_FACTOR);
        }
    }
    card.next_review = now.plus_days(i64::from(card.interval));
}

/// The interval, in days, that rating the card would produce.
pub fn preview_interval(card: &Card, rating: Rating) -> u32 {
    let mut card = card.clone();
    let at = card.next_review;
    rate(&mut card, rating, at);
    card.interval
}

fn grow(interval: u32, ease_factor: f64) -> u32 {
    // `as` saturates for out-of-range floats.
    (f64::from(interval) * ease_factor).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;
    use crate::types::card_id::CardId;
    use crate::types::timestamp::MILLIS_PER_DAY;

    const T0: Timestamp = Timestamp::from_millis(1_700_000_000_000);

    fn new_card() -> Card {
        Card::new(CardId::new("card").unwrap(), "q", "a", T0)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_first_easy() {
        let mut card = new_card();
        rate(&mut card, Rating::Easy, T0);
        assert_eq!(card.interval, 1);
        assert_eq!(card.repetitions, 1);
        assert_close(card.ease_factor, 2.5);
        assert_eq!(card.next_review.into_millis(), T0.into_millis() + MILLIS_PER_DAY);
    }

    #[test]
    fn test_easy_then_hard() {
        let mut card = new_card();
        rate(&mut card, Rating::Easy, T0);
        let t1 = T0.plus_millis(MILLIS_PER_DAY);
        rate(&mut card, Rating::Hard, t1);
        assert_eq!(card.interval, 1);
        assert_eq!(card.repetitions, 0);
        assert_close(card.ease_factor, 2.35);
        assert_eq!(
            card.next_review.into_millis(),
            T0.into_millis() + 2 * MILLIS_PER_DAY
        );
    }

    #[test]
    fn test_three_easy_ratings() {
        let mut card = new_card();
        let mut intervals = Vec::new();
        for _ in 0..3 {
            rate(&mut card, Rating::Easy, T0);
            intervals.push(card.interval);
            assert_close(card.ease_factor, 2.5);
        }
        assert_eq!(intervals, vec![1, 3, 8]);
        assert_eq!(card.repetitions, 3);
    }

    #[test]
    fn test_growth_uses_current_ease() {
        let mut card = new_card();
        card.repetitions = 4;
        card.interval = 10;
        card.ease_factor = 1.3;
        rate(&mut card, Rating::Easy, T0);
        assert_eq!(card.interval, 13);
        assert_close(card.ease_factor, 1.35);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        let mut card = new_card();
        card.repetitions = 2;
        card.interval = 5;
        card.ease_factor = 1.5;
        rate(&mut card, Rating::Easy, T0);
        // 5 * 1.5 = 7.5
        assert_eq!(card.interval, 8);
    }

    #[test]
    fn test_hard_resets_from_any_state() {
        for (repetitions, interval, ease) in [(0, 0, 2.5), (1, 1, 2.0), (7, 120, 1.3)] {
            let mut card = new_card();
            card.repetitions = repetitions;
            card.interval = interval;
            card.ease_factor = ease;
            rate(&mut card, Rating::Hard, T0);
            assert_eq!(card.repetitions, 0);
            assert_eq!(card.interval, 1);
            assert_eq!(card.next_review, T0.plus_millis(MILLIS_PER_DAY));
        }
    }

    #[test]
    fn test_ease_stays_in_bounds() {
        let mut card = new_card();
        // A fixed but irregular pattern of ratings.
        let pattern = [
            true, false, false, false, false, false, false, false, false, false, true, true,
            true, true, true, true, true, true, true, true, true, true, true, false, true,
        ];
        for is_easy in pattern {
            rate(&mut card, Rating::from_is_easy(is_easy), T0);
            assert!(card.ease_factor >= MIN_EASE_FACTOR);
            assert!(card.ease_factor <= MAX_EASE_FACTOR);
        }
    }

    #[test]
    fn test_ease_floor() {
        let mut card = new_card();
        for _ in 0..20 {
            rate(&mut card, Rating::Hard, T0);
        }
        assert_close(card.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_interval_is_at_least_one_after_rating() -> Fallible<()> {
        for rating in [Rating::Easy, Rating::Hard] {
            let mut card = new_card();
            rate(&mut card, rating, T0);
            assert!(card.interval >= 1);
            assert!(!card.is_due(T0));
        }
        Ok(())
    }

    #[test]
    fn test_preview_interval() {
        let mut card = new_card();
        card.repetitions = 1;
        card.interval = 1;
        assert_eq!(preview_interval(&card, Rating::Easy), 3);
        assert_eq!(preview_interval(&card, Rating::Hard), 1);
        // Previewing leaves the card alone.
        assert_eq!(card.repetitions, 1);
    }
}
