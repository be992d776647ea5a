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

use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::error::fail;
use crate::order::normalize_orders;
use crate::types::card::Card;
use crate::types::card::MAX_EASE_FACTOR;
use crate::types::card::MIN_EASE_FACTOR;
use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

pub fn export_collection(coll: &Collection, now: Timestamp) -> Fallible<String> {
    let cards = coll.load_cards(now)?;
    let export: Vec<CardRecord> = cards.iter().map(CardRecord::from).collect();
    let json: String = serde_json::to_string_pretty(&export)?;
    Ok(json)
}

/// Summary of an import.
#[derive(Debug, PartialEq)]
pub struct ImportReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Import a JSON array of cards. Cards whose id is already stored are
/// overwritten, including their progress. With `replace`, stored cards that
/// are absent from the file are deleted.
pub fn import_cards(
    coll: &Collection,
    path: &Path,
    replace: bool,
    now: Timestamp,
) -> Fallible<ImportReport> {
    if !path.exists() {
        return fail(format!("file not found: {}", path.display()));
    }
    let content = read_to_string(path)?;
    let records: Vec<ImportRecord> = serde_json::from_str(&content)?;
    let imported = records_to_cards(records, now)?;
    let imported_ids: HashSet<&CardId> = imported.iter().map(|card| &card.id).collect();

    let existing = coll.load_cards(now)?;
    let existing_ids: HashSet<CardId> = existing.iter().map(|card| card.id.clone()).collect();

    let mut cards: Vec<Card> = Vec::new();
    let mut removed: Vec<CardId> = Vec::new();
    for card in existing {
        if imported_ids.contains(&card.id) {
            continue;
        }
        if replace {
            removed.push(card.id);
        } else {
            cards.push(card);
        }
    }
    let updated = imported
        .iter()
        .filter(|card| existing_ids.contains(&card.id))
        .count();
    let added = imported.len() - updated;
    cards.extend(imported);
    normalize_orders(&mut cards);
    coll.db.replace_all(&removed, &cards)?;
    let removed = removed.len();
    log::debug!("Imported {added} new and {updated} existing cards, removed {removed}.");
    Ok(ImportReport {
        added,
        updated,
        removed,
    })
}

/// A card as written by `export`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CardRecord {
    id: CardId,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    question: String,
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_file: Option<String>,
    interval: u32,
    repetitions: u32,
    ease_factor: f64,
    next_review: Timestamp,
    pinned: bool,
    order: i64,
    starred: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    starred_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_reviewed: Option<Timestamp>,
}

impl From<&Card> for CardRecord {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id.clone(),
            title: card.title.clone(),
            question: card.question.clone(),
            answer: card.answer.clone(),
            audio_file: card.audio_file.clone(),
            interval: card.interval,
            repetitions: card.repetitions,
            ease_factor: card.ease_factor,
            next_review: card.next_review,
            pinned: card.pinned,
            order: card.order,
            starred: card.starred,
            starred_at: card.starred_at,
            last_reviewed: card.last_reviewed,
        }
    }
}

/// A card as read by `import`. Everything but the content may be missing.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    question: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    audio_file: Option<String>,
    #[serde(default)]
    interval: Option<f64>,
    #[serde(default)]
    repetitions: Option<f64>,
    #[serde(default)]
    ease_factor: Option<f64>,
    #[serde(default)]
    next_review: Option<i64>,
    #[serde(default)]
    pinned: Option<bool>,
    #[serde(default)]
    order: Option<i64>,
    #[serde(default)]
    starred: Option<bool>,
    #[serde(default)]
    starred_at: Option<i64>,
    #[serde(default)]
    last_reviewed: Option<i64>,
}

fn records_to_cards(records: Vec<ImportRecord>, now: Timestamp) -> Fallible<Vec<Card>> {
    let mut seen: HashSet<CardId> = HashSet::new();
    let mut cards = Vec::with_capacity(records.len());
    for (idx, record) in records.into_iter().enumerate() {
        let id = match record.id {
            Some(id) => CardId::new(id)?,
            None => CardId::generate(&record.question, &record.answer, now),
        };
        if !seen.insert(id.clone()) {
            return fail(format!("duplicate card id in import: {id}"));
        }
        let mut card = Card::new(id, record.question, record.answer, now)
            .with_audio_file(record.audio_file);
        if let Some(title) = record.title {
            card = card.with_title(title);
        }
        card.interval = record.interval.map(count).unwrap_or(0);
        card.repetitions = record.repetitions.map(count).unwrap_or(0);
        card.ease_factor = record
            .ease_factor
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR))
            .unwrap_or(MAX_EASE_FACTOR);
        card.next_review = record
            .next_review
            .map(Timestamp::from_millis)
            .unwrap_or(now);
        card.pinned = record.pinned.unwrap_or(false);
        card.order = record.order.unwrap_or(idx as i64);
        card.starred = record.starred.unwrap_or(false);
        if card.starred {
            card.starred_at = Some(record.starred_at.map(Timestamp::from_millis).unwrap_or(now));
        }
        card.last_reviewed = record.last_reviewed.map(Timestamp::from_millis);
        cards.push(card);
    }
    Ok(cards)
}

/// Round a JSON number into a non-negative count.
fn count(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}
