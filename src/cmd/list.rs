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

//! Read-only listings of the collection.

use crate::order::clusters;
use crate::order::review_order;
use crate::select::by_next_review;
use crate::select::due_cards;
use crate::select::recent;
use crate::select::starred;
use crate::types::card::Card;
use crate::types::review_mode::ReviewMode;
use crate::types::timestamp::Timestamp;

pub fn render_due(cards: &[Card], now: Timestamp) -> String {
    let due = due_cards(cards, now);
    if due.is_empty() {
        return "No cards due.\n".to_string();
    }
    let mut lines = vec![format!("{} due:", due.len())];
    lines.extend(due.into_iter().map(line));
    unlines(lines)
}

pub fn render_list(cards: &[Card], mode: ReviewMode) -> String {
    let sorted = review_order(cards, mode);
    let mut lines = Vec::new();
    match mode {
        ReviewMode::PinnedManual => {
            for card in sorted {
                let marker = if card.pinned { "*" } else { " " };
                lines.push(format!("{marker} {:>3}  {}", card.order, line(card)));
            }
        }
        ReviewMode::AlphabeticalClustered => {
            for cluster in clusters(&sorted) {
                lines.push(format!("[{}]", cluster.label));
                for card in cluster.cards {
                    lines.push(format!("  {}", line(card)));
                }
            }
        }
    }
    unlines(lines)
}

pub fn render_schedule(cards: &[Card], now: Timestamp) -> String {
    let lines = by_next_review(cards).into_iter().map(|card| {
        let days = now.days_until(card.next_review);
        let when = if days == 0 {
            "due".to_string()
        } else if days == 1 {
            "1 day".to_string()
        } else {
            format!("{days} days")
        };
        format!(
            "{when:>9}  x{:.2}  {:>4}d  {}",
            card.ease_factor,
            card.interval,
            line(card)
        )
    });
    unlines(lines)
}

pub fn render_recent(cards: &[Card], limit: usize) -> String {
    let lines = recent(cards, limit)
        .into_iter()
        .filter_map(|card| card.last_reviewed.map(|at| format!("{at}  {}", line(card))));
    unlines(lines)
}

pub fn render_starred(cards: &[Card]) -> String {
    let lines = starred(cards).into_iter().map(|card| match card.starred_at {
        Some(at) => format!("{at}  {}", line(card)),
        None => line(card),
    });
    unlines(lines)
}

/// Join lines, ending each with a newline.
fn unlines(lines: impl IntoIterator<Item = String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

fn line(card: &Card) -> String {
    format!("{}: {}", card.display_title(), card.question)
}
