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

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use maud::Markup;
use maud::html;

use crate::cmd::drill::state::ServerState;
use crate::cmd::drill::template::page_template;
use crate::error::Fallible;
use crate::order::clusters;
use crate::order::review_order;
use crate::scheduler::preview_interval;
use crate::select::due_count;
use crate::select::next_due;
use crate::types::card::Card;
use crate::types::rating::Rating;
use crate::types::review_mode::ReviewMode;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    respond(render_study(&state))
}

pub async fn cards_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    respond(render_cards(&state))
}

fn respond(body: Fallible<Markup>) -> (StatusCode, Html<String>) {
    match body {
        Ok(body) => (StatusCode::OK, Html(page_template(body).into_string())),
        Err(e) => {
            log::error!("{e}");
            let body = html! { p.error { (e.to_string()) } };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page_template(body).into_string()),
            )
        }
    }
}

fn render_study(state: &ServerState) -> Fallible<Markup> {
    let mutable = state.lock()?;
    if mutable.finished {
        return Ok(html! {
            div.finished {
                h1 { "Session Completed" }
                p { (mutable.reviewed) " reviewed" }
            }
        });
    }
    let now = state.clock.now();
    let due = due_count(&mutable.cards, now);
    let progress = format!("{due} due, {} reviewed", mutable.reviewed);
    let Some(card) = next_due(&mutable.cards, now) else {
        return Ok(html! {
            div.root {
                div.card {
                    div.header {
                        h1 { "No cards due" }
                        div.progress { (progress) }
                    }
                    div.controls {
                        form action="/" method="post" {
                            input id="skip-day" type="submit" name="action" value="SkipDay";
                            div.spacer {}
                            input id="end" type="submit" name="action" value="End";
                        }
                    }
                }
            }
        });
    };
    let controls = if mutable.reveal {
        let hard = preview_interval(card, Rating::Hard);
        let easy = preview_interval(card, Rating::Easy);
        html! {
            form action="/" method="post" {
                input id="skip-day" type="submit" name="action" value="SkipDay";
                div.spacer {}
                input id="hard" type="submit" name="action" value="Hard" title=(days(hard));
                input id="easy" type="submit" name="action" value="Easy" title=(days(easy));
                div.spacer {}
                input id="end" type="submit" name="action" value="End";
            }
        }
    } else {
        html! {
            form action="/" method="post" {
                input id="skip-day" type="submit" name="action" value="SkipDay";
                div.spacer {}
                input id="reveal" type="submit" name="action" value="Reveal";
                div.spacer {}
                input id="end" type="submit" name="action" value="End";
            }
        }
    };
    Ok(html! {
        div.root {
            div.card {
                div.header {
                    h1 { (card.display_title()) }
                    div.progress { (progress) }
                }
                div.content {
                    div.question { p { (card.question) } }
                    @if mutable.reveal {
                        div.answer { p { (card.answer) } }
                    } @else {
                        div.answer {}
                    }
                    @if let Some(audio) = &card.audio_file {
                        div.audio { (audio) }
                    }
                }
                div.controls { (controls) }
            }
        }
    })
}

fn render_cards(state: &ServerState) -> Fallible<Markup> {
    let mutable = state.lock()?;
    let sorted = review_order(&mutable.cards, state.review_mode);
    let list = match state.review_mode {
        ReviewMode::PinnedManual => html! {
            ul.cards {
                @for card in &sorted {
                    (card_row(card))
                }
            }
        },
        ReviewMode::AlphabeticalClustered => html! {
            @for cluster in clusters(&sorted) {
                h2.cluster { (cluster.label) }
                ul.cards {
                    @for card in &cluster.cards {
                        (card_row(card))
                    }
                }
            }
        },
    };
    Ok(html! {
        div.browse {
            h1 { (sorted.len()) " cards" }
            @if sorted.is_empty() {
                p { "No cards." }
            }
            (list)
        }
    })
}

fn card_row(card: &Card) -> Markup {
    let pin = if card.pinned { "Unpin" } else { "Pin" };
    let star = if card.starred { "Unstar" } else { "Star" };
    html! {
        li.pinned[card.pinned] .starred[card.starred] {
            span.title { (card.display_title()) }
            span.question { (card.question) }
            form action="/cards" method="post" {
                input type="hidden" name="id" value=(card.id.as_str());
                button type="submit" name="action" value="Pin" { (pin) }
                button type="submit" name="action" value="Star" { (star) }
            }
        }
    }
}

fn days(n: u32) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{n} days")
    }
}
