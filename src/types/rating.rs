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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;

use crate::error::ErrorReport;
use crate::error::fail;

/// How well a card was recalled.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rating {
    Easy,
    Hard,
}

impl Rating {
    pub fn from_is_easy(is_easy: bool) -> Self {
        if is_easy { Rating::Easy } else { Rating::Hard }
    }

    pub fn is_easy(self) -> bool {
        self == Rating::Easy
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Easy => "easy",
            Rating::Hard => "hard",
        }
    }
}

impl TryFrom<String> for Rating {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "easy" => Ok(Rating::Easy),
            "hard" => Ok(Rating::Hard),
            _ => fail(format!("Invalid rating: {}", value)),
        }
    }
}

impl ToSql for Rating {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Rating {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Rating::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_is_easy() {
        assert_eq!(Rating::from_is_easy(true), Rating::Easy);
        assert_eq!(Rating::from_is_easy(false), Rating::Hard);
        assert!(Rating::Easy.is_easy());
        assert!(!Rating::Hard.is_easy());
    }

    #[test]
    fn test_parse() {
        assert_eq!(Rating::try_from("easy".to_string()).ok(), Some(Rating::Easy));
        assert_eq!(Rating::try_from("hard".to_string()).ok(), Some(Rating::Hard));
        assert!(Rating::try_from("good".to_string()).is_err());
    }
}
