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
use std::fs::copy;
use std::fs::create_dir_all;
use std::fs::write;
use std::path::Path;

use crate::collection::Collection;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::feed::Feed;
use crate::feed::GeneratedFeed;
use crate::feed::fetch_feed;
use crate::feed::generate_feed;
use crate::order::normalize_orders;
use crate::store::CardStore;
use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

/// Merge a content feed into the collection. New cards are appended after
/// the existing ones, in feed order. Returns the number of new cards.
pub async fn sync_feed(
    coll: &Collection,
    source: Option<String>,
    now: Timestamp,
) -> Fallible<usize> {
    let source = resolve_source(coll, source)?;
    let feed = fetch_feed(&source, &coll.directory).await?;
    let mut incoming = feed.into_cards(now)?;
    let existing = coll.db.card_ids()?;
    let offset = coll.db.card_count()? as i64;
    for (idx, card) in incoming
        .iter_mut()
        .filter(|card| !existing.contains(&card.id))
        .enumerate()
    {
        card.order = offset + idx as i64;
    }
    let added = coll.db.sync_content(&incoming)?;
    // Re-densify in case positions in the store had gaps.
    let mut cards = coll.load_cards(now)?;
    normalize_orders(&mut cards);
    coll.db.save_all(&cards)?;
    log::debug!("Synced {} feed cards from {source}, {added} new.", incoming.len());
    Ok(added)
}

/// Audio files are copied into this folder, next to the feed file.
const AUDIO_DIR: &str = "audio";

/// Scan `source` for lessons, copy their audio next to `output`, and write
/// the feed to `output`.
pub fn write_generated_feed(source: &Path, output: &Path) -> Fallible<GeneratedFeed> {
    let generated = generate_feed(source)?;
    let audio_dir = output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(AUDIO_DIR);
    create_dir_all(&audio_dir)?;
    for card in &generated.feed.cards {
        if let Some(audio) = &card.audio_file {
            copy(source.join(audio), audio_dir.join(audio))?;
        }
    }
    log::debug!(
        "Copied {} audio files to {}",
        generated.feed.cards.len(),
        audio_dir.display()
    );
    let json = serde_json::to_string_pretty(&generated.feed)?;
    write(output, json)?;
    Ok(generated)
}

/// Stored cards that the configured feed no longer lists.
pub async fn find_orphans(coll: &Collection) -> Fallible<Vec<CardId>> {
    let source = resolve_source(coll, None)?;
    let feed: Feed = fetch_feed(&source, &coll.directory).await?;
    let feed_ids: HashSet<String> = feed.cards.into_iter().map(|card| card.id).collect();
    let mut orphans: Vec<CardId> = coll
        .db
        .card_ids()?
        .into_iter()
        .filter(|id| !feed_ids.contains(id.as_str()))
        .collect();
    orphans.sort();
    Ok(orphans)
}

fn resolve_source(coll: &Collection, source: Option<String>) -> Fallible<String> {
    source.or_else(|| coll.config.feed.clone()).ok_or_else(|| {
        ErrorReport::new("no feed given, and none is configured in listencards.toml.")
    })
}

#[cfg(test)]
mod tests {
    use std::fs::create_dir;

    use tempfile::TempDir;
    use tempfile::tempdir;

    use super::*;
    use crate::cmd::cards::add_card;
    use crate::cmd::cards::pin_card;
    use crate::config::CONFIG_FILE_NAME;

    const T0: Timestamp = Timestamp::from_millis(1_700_000_000_000);

    fn collection(config: &str) -> Fallible<(TempDir, Collection)> {
        let dir = tempdir()?;
        write(dir.path().join(CONFIG_FILE_NAME), config)?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        Ok((dir, coll))
    }

    #[tokio::test]
    async fn test_sync_appends_new_cards() -> Fallible<()> {
        let (dir, coll) = collection("feed = \"cards.json\"\n")?;
        let mine = add_card(&coll, "Mine", "a", None, T0)?;
        pin_card(&coll, &mine, T0)?;
        write(
            dir.path().join("cards.json"),
            r#"{ "cards": [
                { "id": "l1", "title": "One", "question": "Hello", "answer": "你好", "audioFile": "l1.mp3" },
                { "id": "l2", "question": "Thanks", "answer": "謝謝" }
            ] }"#,
        )?;
        assert_eq!(sync_feed(&coll, None, T0).await?, 2);
        let cards = coll.load_cards(T0)?;
        let ids: Vec<&str> = cards.iter().map(|card| card.id.as_str()).collect();
        assert_eq!(ids, vec![mine.as_str(), "l1", "l2"]);
        assert_eq!(cards[1].audio_file.as_deref(), Some("l1.mp3"));

        // A second sync changes nothing but content.
        write(
            dir.path().join("cards.json"),
            r#"{ "cards": [ { "id": "l1", "title": "Uno", "question": "Hello", "answer": "你好" } ] }"#,
        )?;
        assert_eq!(sync_feed(&coll, None, T0).await?, 0);
        let cards = coll.load_cards(T0)?;
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[1].display_title(), "Uno");
        assert!(cards[0].pinned);
        Ok(())
    }

    #[tokio::test]
    async fn test_sync_without_feed() -> Fallible<()> {
        let (_dir, coll) = collection("")?;
        let err = sync_feed(&coll, None, T0).await.err().unwrap();
        assert!(err.to_string().contains("no feed given"));
        Ok(())
    }

    #[tokio::test]
    async fn test_orphans() -> Fallible<()> {
        let (dir, coll) = collection("feed = \"cards.json\"\n")?;
        write(
            dir.path().join("cards.json"),
            r#"{ "cards": [ { "id": "l1", "question": "Hello" } ] }"#,
        )?;
        sync_feed(&coll, None, T0).await?;
        let mine = add_card(&coll, "Mine", "a", None, T0)?;
        assert_eq!(find_orphans(&coll).await?, vec![mine]);
        Ok(())
    }

    #[test]
    fn test_write_generated_feed() -> Fallible<()> {
        let dir = tempdir()?;
        let lessons = dir.path().join("lessons");
        create_dir(&lessons)?;
        write(lessons.join("Lesson 1.txt"), "Hello\n你好")?;
        write(lessons.join("Lesson 1.mp3"), b"ID3 audio")?;
        write(lessons.join("extra.mp3"), b"")?;
        let content = dir.path().join("content");
        create_dir(&content)?;
        let output = content.join("cards.json");
        let generated = write_generated_feed(&lessons, &output)?;
        assert_eq!(generated.feed.cards.len(), 1);
        let feed = Feed::parse(&std::fs::read_to_string(&output)?)?;
        assert_eq!(feed.cards[0].id, "lesson-1");
        assert_eq!(feed.cards[0].audio_file.as_deref(), Some("Lesson 1.mp3"));
        // Only audio that belongs to a card is copied.
        let copied = std::fs::read(content.join("audio").join("Lesson 1.mp3"))?;
        assert_eq!(copied, b"ID3 audio");
        assert!(!content.join("audio").join("extra.mp3").exists());
        Ok(())
    }
}
