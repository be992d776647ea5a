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

use std::env::current_dir;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::Config;
use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

pub const DATABASE_FILE_NAME: &str = "listencards.db";

/// A collection directory: its configuration and its database.
pub struct Collection {
    pub directory: PathBuf,
    pub config: Config,
    pub db: Database,
}

impl Collection {
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let config = Config::load(&directory)?;

        let db_path: PathBuf = directory.join(DATABASE_FILE_NAME);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let db: Database = Database::new(db_path, &config.user)?;

        Ok(Self {
            directory,
            config,
            db,
        })
    }

    /// Load every card from the database.
    pub fn load_cards(&self, now: Timestamp) -> Fallible<Vec<Card>> {
        log::debug!("Loading cards...");
        let start = Instant::now();
        let cards = self.db.load(now)?;
        let duration = start.elapsed().as_millis();
        log::debug!("Loaded {} cards in {duration}ms.", cards.len());
        Ok(cards)
    }
}

/// The position of the card with the given id.
pub fn find_card(cards: &[Card], id: &CardId) -> Fallible<usize> {
    cards
        .iter()
        .position(|card| &card.id == id)
        .ok_or_else(|| ErrorReport::new(format!("no card with id {id}.")))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_non_existent_directory() {
        let result = Collection::new(Some("./derpherp".to_string()));
        assert!(result.is_err());
        let err = result.err().unwrap();
        assert_eq!(err.to_string(), "error: directory does not exist.");
    }

    #[test]
    fn test_new_collection_is_empty() -> Fallible<()> {
        let dir = tempdir()?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        assert_eq!(coll.config, Config::default());
        assert!(coll.load_cards(Timestamp::from_millis(0))?.is_empty());
        assert!(coll.directory.join(DATABASE_FILE_NAME).exists());
        Ok(())
    }

    #[test]
    fn test_find_card() -> Fallible<()> {
        let now = Timestamp::from_millis(0);
        let cards = vec![
            Card::new(CardId::new("a")?, "q", "a", now),
            Card::new(CardId::new("b")?, "q", "a", now),
        ];
        assert_eq!(find_card(&cards, &CardId::new("b")?)?, 1);
        let err = find_card(&cards, &CardId::new("c")?).err().unwrap();
        assert_eq!(err.to_string(), "error: no card with id c.");
        Ok(())
    }
}
