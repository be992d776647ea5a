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

use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

/// The ease factor of a new card, which is also the ceiling.
pub const MAX_EASE_FACTOR: f64 = 2.5;

/// The floor for the ease factor.
pub const MIN_EASE_FACTOR: f64 = 1.3;

#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    /// The card's stable identifier.
    pub id: CardId,
    /// An optional display title. Cards from a content feed usually have one.
    pub title: Option<String>,
    pub question: String,
    pub answer: String,
    /// The name of an audio file attached to the card.
    pub audio_file: Option<String>,
    /// Days until the next review after a successful recall.
    pub interval: u32,
    /// Consecutive "easy" ratings since the last reset.
    pub repetitions: u32,
    /// Multiplier controlling how fast intervals grow, in `[1.3, 2.5]`.
    pub ease_factor: f64,
    /// The card is due at or after this instant.
    pub next_review: Timestamp,
    /// Pinned cards come first in the manual ordering.
    pub pinned: bool,
    /// Manual sort key within the pinned and unpinned groups.
    pub order: i64,
    pub starred: bool,
    pub starred_at: Option<Timestamp>,
    /// When the card was last rated.
    pub last_reviewed: Option<Timestamp>,
}

impl Card {
    /// Create a card that has never been studied. It is due immediately.
    pub fn new(
        id: CardId,
        question: impl Into<String>,
        answer: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            title: None,
            question: question.into().trim().to_string(),
            answer: answer.into().trim().to_string(),
            audio_file: None,
            interval: 0,
            repetitions: 0,
            ease_factor: MAX_EASE_FACTOR,
            next_review: now,
            pinned: false,
            order: 0,
            starred: false,
            starred_at: None,
            last_reviewed: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title: String = title.into();
        let title = title.trim();
        self.title = if title.is_empty() {
            None
        } else {
            Some(title.to_string())
        };
        self
    }

    pub fn with_audio_file(mut self, audio_file: Option<String>) -> Self {
        self.audio_file = audio_file;
        self
    }

    /// The title if there is one, otherwise the id.
    pub fn display_title(&self) -> &str {
        match &self.title {
            Some(title) => title,
            None => self.id.as_str(),
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review <= now
    }

    pub fn toggle_star(&mut self, now: Timestamp) {
        self.starred = !self.starred;
        self.starred_at = if self.starred { Some(now) } else { None };
    }
}
