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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::clock::Clock;
use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::review_mode::ReviewMode;

#[derive(Clone)]
pub struct ServerState {
    pub review_mode: ReviewMode,
    pub clock: Arc<dyn Clock>,
    pub db: Database,
    pub mutable: Arc<Mutex<MutableState>>,
}

pub struct MutableState {
    pub reveal: bool,
    /// The whole collection, in manual order.
    pub cards: Vec<Card>,
    /// Ratings given since the server started.
    pub reviewed: usize,
    pub finished: bool,
}

impl ServerState {
    pub fn lock(&self) -> Fallible<MutexGuard<'_, MutableState>> {
        self.mutable
            .lock()
            .map_err(|_| ErrorReport::new("session state lock poisoned"))
    }
}
