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

//! Content feeds: a `cards.json` file listing card content without any
//! study progress, usually generated from a folder of lesson files.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "m4a", "wav", "ogg", "webm"];

const TEXT_EXTENSION: &str = "txt";

#[derive(Serialize, Deserialize, Default)]
pub struct Feed {
    #[serde(default)]
    pub cards: Vec<FeedCard>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedCard {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
}

impl Feed {
    pub fn parse(json: &str) -> Fallible<Self> {
        let feed: Feed = serde_json::from_str(json)?;
        Ok(feed)
    }

    /// Turn the feed into new cards, positioned in feed order and due at
    /// `now`.
    pub fn into_cards(self, now: Timestamp) -> Fallible<Vec<Card>> {
        let mut seen: HashSet<CardId> = HashSet::new();
        let mut cards = Vec::with_capacity(self.cards.len());
        for (idx, entry) in self.cards.into_iter().enumerate() {
            let id = CardId::new(entry.id)?;
            if !seen.insert(id.clone()) {
                return fail(format!("duplicate card id in feed: {id}"));
            }
            let mut card = Card::new(id, entry.question, entry.answer, now)
                .with_audio_file(entry.audio_file);
            if let Some(title) = entry.title {
                card = card.with_title(title);
            }
            card.order = idx as i64;
            cards.push(card);
        }
        Ok(cards)
    }
}

/// Read a feed from a local path (relative to `directory`) or an http(s)
/// URL.
pub async fn fetch_feed(source: &str, directory: &Path) -> Fallible<Feed> {
    let json = if source.starts_with("http://") || source.starts_with("https://") {
        log::debug!("Fetching feed from {source}");
        let response = reqwest::get(source).await?.error_for_status()?;
        response.text().await?
    } else {
        let path = directory.join(source);
        if !path.exists() {
            return fail(format!("feed not found: {}", path.display()));
        }
        tokio::fs::read_to_string(&path).await?
    };
    Feed::parse(&json)
}

/// The result of scanning a folder of lessons.
pub struct GeneratedFeed {
    pub feed: Feed,
    /// Stems that had only a text file or only an audio file.
    pub incomplete: Vec<String>,
    /// Stems whose text file had no question.
    pub empty: Vec<String>,
    /// Stems whose id was already taken by an earlier stem, with the id they
    /// got instead.
    pub renamed: Vec<(String, String)>,
}

#[derive(Default)]
struct Pair {
    text: Option<String>,
    audio: Option<String>,
}

/// Build a feed from a folder of `<stem>.txt` + `<stem>.<audio>` pairs. The
/// first line of each text file is the question; the rest is the answer.
pub fn generate_feed(source: &Path) -> Fallible<GeneratedFeed> {
    if !source.is_dir() {
        return fail("source directory does not exist.");
    }
    let mut pairs: BTreeMap<String, Pair> = BTreeMap::new();
    for entry in WalkDir::new(source).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let (Some(stem), Some(ext), Some(name)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|s| s.to_str()),
            path.file_name().and_then(|s| s.to_str()),
        ) else {
            continue;
        };
        let ext = ext.to_lowercase();
        let pair = pairs.entry(stem.to_string()).or_default();
        if ext == TEXT_EXTENSION {
            pair.text = Some(name.to_string());
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            pair.audio = Some(name.to_string());
        }
    }

    let mut complete: Vec<(String, String, String)> = Vec::new();
    let mut incomplete: Vec<String> = Vec::new();
    for (stem, pair) in pairs {
        match (pair.text, pair.audio) {
            (Some(text), Some(audio)) => complete.push((stem, text, audio)),
            (None, None) => {}
            _ => incomplete.push(stem),
        }
    }
    complete.sort_by(|a, b| natural_cmp(&a.0, &b.0));

    let mut cards = Vec::new();
    let mut empty = Vec::new();
    let mut renamed = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();
    for (stem, text, audio) in complete {
        let content = read_to_string(source.join(&text))?;
        let (question, answer) = split_lesson(&content);
        if question.is_empty() {
            empty.push(stem);
            continue;
        }
        let base = CardId::from_stem(&stem).to_string();
        let id = unique_id(&base, &mut taken);
        if id != base {
            renamed.push((stem, id.clone()));
        }
        cards.push(FeedCard {
            id,
            title: None,
            question,
            answer,
            audio_file: Some(audio),
        });
    }
    Ok(GeneratedFeed {
        feed: Feed { cards },
        incomplete,
        empty,
        renamed,
    })
}

/// `base`, or `base-2`, `base-3`, ... if that is taken. The result is marked
/// as taken.
fn unique_id(base: &str, taken: &mut HashSet<String>) -> String {
    let mut id = base.to_string();
    let mut n = 2;
    while taken.contains(&id) {
        id = format!("{base}-{n}");
        n += 1;
    }
    taken.insert(id.clone());
    id
}

fn split_lesson(content: &str) -> (String, String) {
    let mut lines = content.trim().lines();
    let question = lines.next().unwrap_or("").trim().to_string();
    let answer = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    (question, answer)
}

/// Compare strings so that embedded numbers sort by value: `lesson2` comes
/// before `lesson10`. Letters compare case-insensitively, with the exact text
/// as the tie-breaker.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_cmp_folded(a, b).then_with(|| a.cmp(b))
}

fn natural_cmp_folded(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x = take_number(&mut a);
                let y = take_number(&mut b);
                let ord = x.len().cmp(&y.len()).then_with(|| x.cmp(&y));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                a.next();
                b.next();
            }
        }
    }
}

/// Consume a run of digits, dropping leading zeros.
fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        if !(digits.is_empty() && c == '0') {
            digits.push(c);
        }
        chars.next();
    }
    digits
}
