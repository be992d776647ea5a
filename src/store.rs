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

use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::timestamp::Timestamp;

/// Persistent storage for the collection.
///
/// Writes are upserts keyed by card id, so retrying a save is harmless.
pub trait CardStore {
    /// Load every card. Progress that was never saved is filled in with the
    /// defaults of a new card, due at `now`.
    fn load(&self, now: Timestamp) -> Fallible<Vec<Card>>;

    /// Persist one card's scheduling state.
    fn save_progress(&self, card: &Card) -> Fallible<()>;

    /// Persist every card: content, manual order, and scheduling state.
    fn save_all(&self, cards: &[Card]) -> Fallible<()>;
}
