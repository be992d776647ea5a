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

use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

/// Length of generated identifiers, in hex characters.
const GENERATED_ID_LEN: usize = 16;

/// An opaque card identifier, stable for the card's lifetime.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardId(String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Fallible<Self> {
        let id: String = id.into();
        let id = id.trim();
        if id.is_empty() {
            return Err(ErrorReport::new("card id is empty"));
        }
        Ok(Self(id.to_string()))
    }

    /// Derive a fresh identifier for a card created by hand.
    pub fn generate(question: &str, answer: &str, created_at: Timestamp) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(question.as_bytes());
        hasher.update(b"\0");
        hasher.update(answer.as_bytes());
        hasher.update(&created_at.into_millis().to_le_bytes());
        let hex = hasher.finalize().to_hex();
        Self(hex[..GENERATED_ID_LEN].to_string())
    }

    /// Turn a file stem into a URL-safe identifier: lowercase ASCII
    /// alphanumerics, with every other run of characters collapsed into a
    /// single `-`, and no leading or trailing dashes. A stem with no ASCII
    /// alphanumerics, such as `問候`, gets a hash of the stem instead.
    pub fn from_stem(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        let mut pending_dash = false;
        for c in name.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
            } else {
                pending_dash = true;
            }
        }
        if slug.is_empty() {
            let hex = blake3::hash(name.as_bytes()).to_hex();
            return Self(hex[..GENERATED_ID_LEN].to_string());
        }
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CardId {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CardId::new(value)
    }
}

impl From<CardId> for String {
    fn from(value: CardId) -> Self {
        value.0
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for CardId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for CardId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        CardId::new(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_id_rejected() {
        assert!(CardId::new("").is_err());
        assert!(CardId::new("   ").is_err());
    }

    #[test]
    fn test_from_stem() {
        assert_eq!(CardId::from_stem("Lesson 001").as_str(), "lesson-001");
        assert_eq!(CardId::from_stem("--Hello,  World!--").as_str(), "hello-world");
        assert_eq!(CardId::from_stem("a_b.c").as_str(), "a-b-c");
        assert_eq!(CardId::from_stem("第3課").as_str(), "3");
    }

    #[test]
    fn test_from_stem_without_ascii() {
        let a = CardId::from_stem("問候");
        assert_eq!(a.as_str().len(), GENERATED_ID_LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, CardId::from_stem("問候"));
        assert_ne!(a, CardId::from_stem("謝謝"));
        assert_ne!(a, CardId::from_stem("!!!"));
    }

    #[test]
    fn test_generate() {
        let t = Timestamp::from_millis(42);
        let a = CardId::generate("q", "a", t);
        let b = CardId::generate("q", "a", t);
        let c = CardId::generate("q", "a", t.plus_millis(1));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), GENERATED_ID_LEN);
    }

    #[test]
    fn test_serde() -> Fallible<()> {
        let id: CardId = serde_json::from_str("\"lesson-1\"")?;
        assert_eq!(id.as_str(), "lesson-1");
        assert_eq!(serde_json::to_string(&id)?, "\"lesson-1\"");
        assert!(serde_json::from_str::<CardId>("\"\"").is_err());
        Ok(())
    }
}
