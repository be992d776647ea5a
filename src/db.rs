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
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card::MAX_EASE_FACTOR;
use crate::types::card::MIN_EASE_FACTOR;
use crate::types::card_id::CardId;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    /// Progress rows are keyed by card and user.
    user: String,
}

impl Database {
    pub fn new(database_path: &str, user: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            user: user.to_string(),
        })
    }

    /// Return the set of all card ids in the database.
    pub fn card_ids(&self) -> Fallible<HashSet<CardId>> {
        let mut ids = HashSet::new();
        let conn = self.acquire()?;
        let mut stmt = conn.prepare("select card_id from cards;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: CardId = row.get(0)?;
            ids.insert(id);
        }
        Ok(ids)
    }

    pub fn card_count(&self) -> Fallible<usize> {
        let conn = self.acquire()?;
        let count: i64 = conn.query_row("select count(*) from cards;", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Add a card, or overwrite it if the id is taken.
    pub fn add_card(&self, card: &Card) -> Fallible<()> {
        log::debug!("Adding card: {}", card.id);
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        upsert_card(&tx, card)?;
        write_progress(&tx, &self.user, card)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete the `removed` cards with their progress, and write `cards` in
    /// full, as a single transaction.
    pub fn replace_all(&self, removed: &[CardId], cards: &[Card]) -> Fallible<()> {
        log::debug!("Deleting {} cards, saving {}", removed.len(), cards.len());
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        for id in removed {
            tx.execute("delete from cards where card_id = ?;", [id])?;
        }
        write_cards(&tx, &self.user, cards)?;
        tx.commit()?;
        Ok(())
    }

    /// Bring card content in line with a content feed. Existing cards keep
    /// their pin and position; new cards are appended with the position
    /// they were given. Returns the number of new cards.
    pub fn sync_content(&self, cards: &[Card]) -> Fallible<usize> {
        let existing = self.card_ids()?;
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let mut added = 0;
        for card in cards {
            if existing.contains(&card.id) {
                update_content(&tx, card)?;
            } else {
                upsert_card(&tx, card)?;
                added += 1;
            }
        }
        tx.commit()?;
        Ok(added)
    }

    /// Append a rating to the review log.
    pub fn record_review(
        &self,
        card: &Card,
        rating: Rating,
        reviewed_at: Timestamp,
    ) -> Fallible<()> {
        let conn = self.acquire()?;
        let sql = "insert into reviews (card_id, user_id, reviewed_at, rating, interval_days, ease_factor, next_review) values (?, ?, ?, ?, ?, ?, ?);";
        conn.execute(
            sql,
            (
                &card.id,
                &self.user,
                reviewed_at,
                rating,
                card.interval,
                card.ease_factor,
                card.next_review,
            ),
        )?;
        Ok(())
    }

    /// The ratings recorded at or after `since`, oldest first.
    pub fn ratings_since(&self, since: Timestamp) -> Fallible<Vec<Rating>> {
        let conn = self.acquire()?;
        let sql = "select rating from reviews where user_id = ? and reviewed_at >= ? order by reviewed_at, review_id;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query((&self.user, since))?;
        let mut ratings = Vec::new();
        while let Some(row) = rows.next()? {
            ratings.push(row.get(0)?);
        }
        Ok(ratings)
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ErrorReport::new("database lock poisoned"))
    }
}

impl CardStore for Database {
    fn load(&self, now: Timestamp) -> Fallible<Vec<Card>> {
        let conn = self.acquire()?;
        let sql = "select c.card_id, c.title, c.question, c.answer, c.audio_file, c.pinned, c.position, p.interval_days, p.repetitions, p.ease_factor, p.next_review, p.starred, p.starred_at, p.last_reviewed from cards c left outer join progress p on p.card_id = c.card_id and p.user_id = ? order by c.position, c.card_id;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([&self.user])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(card_from_row(row, now)?);
        }
        Ok(cards)
    }

    fn save_progress(&self, card: &Card) -> Fallible<()> {
        let conn = self.acquire()?;
        write_progress(&conn, &self.user, card)
    }

    fn save_all(&self, cards: &[Card]) -> Fallible<()> {
        log::debug!("Saving {} cards", cards.len());
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        write_cards(&tx, &self.user, cards)?;
        tx.commit()?;
        Ok(())
    }
}

fn write_cards(tx: &Transaction, user: &str, cards: &[Card]) -> Fallible<()> {
    for card in cards {
        upsert_card(tx, card)?;
        write_progress(tx, user, card)?;
    }
    Ok(())
}

/// Read a card, filling in missing progress with new-card defaults.
fn card_from_row(row: &Row, now: Timestamp) -> Fallible<Card> {
    let id: CardId = row.get(0)?;
    let title: Option<String> = row.get(1)?;
    let question: String = row.get(2)?;
    let answer: String = row.get(3)?;
    let audio_file: Option<String> = row.get(4)?;
    let pinned: bool = row.get(5)?;
    let order: i64 = row.get(6)?;
    let interval: Option<i64> = row.get(7)?;
    let repetitions: Option<i64> = row.get(8)?;
    let ease_factor: Option<f64> = row.get(9)?;
    let next_review: Option<Timestamp> = row.get(10)?;
    let starred: Option<bool> = row.get(11)?;
    let starred_at: Option<Timestamp> = row.get(12)?;
    let last_reviewed: Option<Timestamp> = row.get(13)?;

    let mut card = Card::new(id, question, answer, now).with_audio_file(audio_file);
    if let Some(title) = title {
        card = card.with_title(title);
    }
    card.pinned = pinned;
    card.order = order;
    card.interval = interval.and_then(|v| u32::try_from(v).ok()).unwrap_or(0);
    card.repetitions = repetitions.and_then(|v| u32::try_from(v).ok()).unwrap_or(0);
    card.ease_factor = ease_factor
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR))
        .unwrap_or(MAX_EASE_FACTOR);
    card.next_review = next_review.unwrap_or(now);
    card.starred = starred.unwrap_or(false);
    card.starred_at = if card.starred { starred_at } else { None };
    card.last_reviewed = last_reviewed;
    Ok(card)
}

fn upsert_card(tx: &Transaction, card: &Card) -> Fallible<()> {
    let sql = "insert into cards (card_id, title, question, answer, audio_file, pinned, position) values (?, ?, ?, ?, ?, ?, ?) on conflict (card_id) do update set title = excluded.title, question = excluded.question, answer = excluded.answer, audio_file = excluded.audio_file, pinned = excluded.pinned, position = excluded.position;";
    tx.execute(
        sql,
        (
            &card.id,
            &card.title,
            &card.question,
            &card.answer,
            &card.audio_file,
            card.pinned,
            card.order,
        ),
    )?;
    Ok(())
}

fn update_content(tx: &Transaction, card: &Card) -> Fallible<()> {
    let sql = "update cards set title = ?, question = ?, answer = ?, audio_file = ? where card_id = ?;";
    tx.execute(
        sql,
        (
            &card.title,
            &card.question,
            &card.answer,
            &card.audio_file,
            &card.id,
        ),
    )?;
    Ok(())
}

fn write_progress(conn: &Connection, user: &str, card: &Card) -> Fallible<()> {
    let sql = "insert into progress (card_id, user_id, interval_days, repetitions, ease_factor, next_review, starred, starred_at, last_reviewed) values (?, ?, ?, ?, ?, ?, ?, ?, ?) on conflict (card_id, user_id) do update set interval_days = excluded.interval_days, repetitions = excluded.repetitions, ease_factor = excluded.ease_factor, next_review = excluded.next_review, starred = excluded.starred, starred_at = excluded.starred_at, last_reviewed = excluded.last_reviewed;";
    conn.execute(
        sql,
        (
            &card.id,
            user,
            card.interval,
            card.repetitions,
            card.ease_factor,
            card.next_review,
            card.starred,
            card.starred_at,
            card.last_reviewed,
        ),
    )?;
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::scheduler::rate;
    use crate::types::timestamp::MILLIS_PER_DAY;

    const T0: Timestamp = Timestamp::from_millis(1_700_000_000_000);

    fn memory_db(user: &str) -> Fallible<Database> {
        Database::new(":memory:", user)
    }

    fn card(id: &str) -> Card {
        Card::new(CardId::new(id).unwrap(), format!("q-{id}"), format!("a-{id}"), T0)
    }

    #[test]
    fn test_add_and_load() -> Fallible<()> {
        let db = memory_db("me")?;
        let mut a = card("a").with_title("Alpha");
        a.order = 1;
        let b = card("b");
        db.add_card(&a)?;
        db.add_card(&b)?;
        let cards = db.load(T0)?;
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0], b);
        assert_eq!(cards[1], a);
        assert_eq!(db.card_count()?, 2);
        Ok(())
    }

    #[test]
    fn test_save_progress_round_trip() -> Fallible<()> {
        let db = memory_db("me")?;
        let mut a = card("a");
        db.add_card(&a)?;
        rate(&mut a, Rating::Easy, T0);
        a.last_reviewed = Some(T0);
        a.toggle_star(T0);
        db.save_progress(&a)?;
        // Saving twice is the same as saving once.
        db.save_progress(&a)?;
        let cards = db.load(T0)?;
        assert_eq!(cards, vec![a]);
        Ok(())
    }

    #[test]
    fn test_missing_progress_defaults() -> Fallible<()> {
        let db = memory_db("me")?;
        let mut a = card("a");
        rate(&mut a, Rating::Easy, T0);
        db.add_card(&a)?;
        // Another user sees the card as new, due at their load time.
        let other = Database {
            conn: db.conn.clone(),
            user: "you".to_string(),
        };
        let later = T0.plus_millis(5 * MILLIS_PER_DAY);
        let cards = other.load(later)?;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].interval, 0);
        assert_eq!(cards[0].repetitions, 0);
        assert_eq!(cards[0].ease_factor, 2.5);
        assert_eq!(cards[0].next_review, later);
        Ok(())
    }

    #[test]
    fn test_out_of_range_ease_is_clamped() -> Fallible<()> {
        let db = memory_db("me")?;
        let mut a = card("a");
        a.ease_factor = 0.2;
        db.add_card(&a)?;
        let cards = db.load(T0)?;
        assert_eq!(cards[0].ease_factor, MIN_EASE_FACTOR);
        Ok(())
    }

    #[test]
    fn test_replace_all() -> Fallible<()> {
        let db = memory_db("me")?;
        let mut a = card("a");
        let mut b = card("b");
        b.order = 1;
        let mut c = card("c");
        c.order = 2;
        db.save_all(&[a.clone(), b.clone(), c.clone()])?;
        rate(&mut c, Rating::Easy, T0);
        db.record_review(&b, Rating::Hard, T0)?;

        a.order = 0;
        c.order = 1;
        db.replace_all(&[b.id.clone()], &[a.clone(), c.clone()])?;
        let cards = db.load(T0)?;
        assert_eq!(cards, vec![a, c]);
        assert_eq!(db.card_count()?, 2);
        // Removing a card that is not stored is not an error.
        db.replace_all(&[b.id.clone()], &[])?;
        assert_eq!(db.card_count()?, 2);
        Ok(())
    }

    #[test]
    fn test_save_all() -> Fallible<()> {
        let db = memory_db("me")?;
        let mut cards = vec![card("a"), card("b")];
        cards[1].pinned = true;
        cards[1].order = 0;
        cards[0].order = 1;
        db.save_all(&cards)?;
        let loaded = db.load(T0)?;
        assert_eq!(loaded[0].id.as_str(), "b");
        assert!(loaded[0].pinned);
        assert_eq!(loaded[1].id.as_str(), "a");
        Ok(())
    }

    #[test]
    fn test_sync_content_keeps_position() -> Fallible<()> {
        let db = memory_db("me")?;
        let mut a = card("a");
        a.pinned = true;
        a.order = 3;
        db.add_card(&a)?;
        let mut feed_a = card("a").with_title("New title");
        feed_a.order = 0;
        let mut feed_b = card("b");
        feed_b.order = 1;
        let added = db.sync_content(&[feed_a, feed_b])?;
        assert_eq!(added, 1);
        let cards = db.load(T0)?;
        let a = cards.iter().find(|c| c.id.as_str() == "a").unwrap();
        assert_eq!(a.title.as_deref(), Some("New title"));
        assert!(a.pinned);
        assert_eq!(a.order, 3);
        Ok(())
    }

    #[test]
    fn test_review_log() -> Fallible<()> {
        let db = memory_db("me")?;
        let mut a = card("a");
        db.add_card(&a)?;
        rate(&mut a, Rating::Hard, T0);
        db.record_review(&a, Rating::Hard, T0)?;
        rate(&mut a, Rating::Easy, T0.plus_millis(1));
        db.record_review(&a, Rating::Easy, T0.plus_millis(1))?;
        assert_eq!(db.ratings_since(T0)?, vec![Rating::Hard, Rating::Easy]);
        assert_eq!(db.ratings_since(T0.plus_millis(1))?, vec![Rating::Easy]);
        assert!(db.ratings_since(T0.plus_millis(2))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_reopen_existing_database() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cards.db");
        let path = path.to_str().unwrap();
        {
            let db = Database::new(path, "me")?;
            db.add_card(&card("a"))?;
        }
        let db = Database::new(path, "me")?;
        let ids = db.card_ids()?;
        assert!(ids.contains(&CardId::new("a")?));
        Ok(())
    }
}
