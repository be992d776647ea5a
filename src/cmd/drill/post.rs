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

use axum::Form;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;

use crate::cmd::drill::state::ServerState;
use crate::collection::find_card;
use crate::error::Fallible;
use crate::order::toggle_pin;
use crate::scheduler::rate;
use crate::select::next_due_index;
use crate::select::skip_one_day;
use crate::store::CardStore;
use crate::types::card_id::CardId;
use crate::types::rating::Rating;

#[derive(Debug, Deserialize)]
enum Action {
    Reveal,
    Easy,
    Hard,
    SkipDay,
    End,
}

#[derive(Deserialize)]
pub struct FormData {
    action: Action,
}

#[derive(Debug, Deserialize)]
enum CardAction {
    Pin,
    Star,
}

#[derive(Deserialize)]
pub struct CardFormData {
    action: CardAction,
    id: String,
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(form): Form<FormData>,
) -> Redirect {
    if let Err(e) = action_handler(&state, form.action) {
        log::error!("{e}");
    }
    Redirect::to("/")
}

pub async fn cards_post_handler(
    State(state): State<ServerState>,
    Form(form): Form<CardFormData>,
) -> Redirect {
    if let Err(e) = card_action_handler(&state, form.action, form.id) {
        log::error!("{e}");
    }
    Redirect::to("/cards")
}

fn action_handler(state: &ServerState, action: Action) -> Fallible<()> {
    let mut mutable = state.lock()?;
    let now = state.clock.now();
    match action {
        Action::Reveal => {
            if next_due_index(&mutable.cards, now).is_some() {
                mutable.reveal = true;
            }
        }
        Action::Easy | Action::Hard => {
            if !mutable.reveal {
                log::error!("Rating a card that is not revealed.");
                return Ok(());
            }
            let Some(idx) = next_due_index(&mutable.cards, now) else {
                mutable.reveal = false;
                return Ok(());
            };
            let rating = Rating::from_is_easy(matches!(action, Action::Easy));
            let card = &mut mutable.cards[idx];
            rate(card, rating, now);
            card.last_reviewed = Some(now);
            log::debug!(
                "{} {} interval={}d ease={:.2} due={}",
                card.id,
                rating.as_str(),
                card.interval,
                card.ease_factor,
                card.next_review
            );
            state.db.save_progress(card)?;
            state.db.record_review(card, rating, now)?;
            mutable.reviewed += 1;
            mutable.reveal = false;
        }
        Action::SkipDay => {
            skip_one_day(&mut mutable.cards);
            state.db.save_all(&mutable.cards)?;
            mutable.reveal = false;
        }
        Action::End => {
            log::debug!("Session ended after {} reviews.", mutable.reviewed);
            mutable.finished = true;
        }
    }
    Ok(())
}

fn card_action_handler(state: &ServerState, action: CardAction, id: String) -> Fallible<()> {
    let mut mutable = state.lock()?;
    let id = CardId::new(id)?;
    let idx = find_card(&mutable.cards, &id)?;
    match action {
        CardAction::Pin => {
            toggle_pin(&mut mutable.cards, idx);
            state.db.save_all(&mutable.cards)?;
            // Normalizing reorders the collection, which can change which
            // card is next.
            mutable.reveal = false;
        }
        CardAction::Star => {
            let now = state.clock.now();
            let card = &mut mutable.cards[idx];
            card.toggle_star(now);
            state.db.save_progress(card)?;
        }
    }
    Ok(())
}

