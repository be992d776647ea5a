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

//! Commands that change the collection.

use crate::collection::Collection;
use crate::collection::find_card;
use crate::error::Fallible;
use crate::error::fail;
use crate::order::append_card;
use crate::order::remove_card;
use crate::order::toggle_pin;
use crate::select::skip_one_day;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

pub fn add_card(
    coll: &Collection,
    question: &str,
    answer: &str,
    title: Option<String>,
    now: Timestamp,
) -> Fallible<CardId> {
    if question.trim().is_empty() || answer.trim().is_empty() {
        return fail("question and answer must not be empty.");
    }
    let mut cards = coll.load_cards(now)?;
    let id = CardId::generate(question, answer, now);
    if cards.iter().any(|card| card.id == id) {
        return fail(format!("a card with id {id} already exists."));
    }
    let mut card = Card::new(id.clone(), question, answer, now);
    if let Some(title) = title {
        card = card.with_title(title);
    }
    append_card(&mut cards, card);
    coll.db.save_all(&cards)?;
    Ok(id)
}

/// Change a card's text. The id, progress, pin and position are kept.
pub fn edit_card(
    coll: &Collection,
    id: &CardId,
    question: Option<String>,
    answer: Option<String>,
    title: Option<String>,
    now: Timestamp,
) -> Fallible<()> {
    if question.is_none() && answer.is_none() && title.is_none() {
        return fail("nothing to change: pass --question, --answer, or --title.");
    }
    let cards = coll.load_cards(now)?;
    let idx = find_card(&cards, id)?;
    let old = &cards[idx];
    let question = question.unwrap_or_else(|| old.question.clone());
    let answer = answer.unwrap_or_else(|| old.answer.clone());
    if question.trim().is_empty() || answer.trim().is_empty() {
        return fail("question and answer must not be empty.");
    }
    let mut card = Card {
        question: question.trim().to_string(),
        answer: answer.trim().to_string(),
        ..old.clone()
    };
    if let Some(title) = title {
        card = card.with_title(title);
    }
    coll.db.add_card(&card)?;
    Ok(())
}

pub fn delete_card(coll: &Collection, id: &CardId, now: Timestamp) -> Fallible<()> {
    let mut cards = coll.load_cards(now)?;
    let idx = find_card(&cards, id)?;
    let removed = remove_card(&mut cards, idx);
    coll.db.replace_all(&[removed.id], &cards)?;
    Ok(())
}

/// Returns whether the card is now pinned.
pub fn pin_card(coll: &Collection, id: &CardId, now: Timestamp) -> Fallible<bool> {
    let mut cards = coll.load_cards(now)?;
    let idx = find_card(&cards, id)?;
    toggle_pin(&mut cards, idx);
    coll.db.save_all(&cards)?;
    let idx = find_card(&cards, id)?;
    Ok(cards[idx].pinned)
}

/// Returns whether the card is now starred.
pub fn star_card(coll: &Collection, id: &CardId, now: Timestamp) -> Fallible<bool> {
    let mut cards = coll.load_cards(now)?;
    let idx = find_card(&cards, id)?;
    let card = &mut cards[idx];
    card.toggle_star(now);
    coll.db.save_progress(card)?;
    Ok(card.starred)
}

/// Returns the number of cards that are due after skipping.
pub fn skip_day(coll: &Collection, now: Timestamp) -> Fallible<usize> {
    let mut cards = coll.load_cards(now)?;
    skip_one_day(&mut cards);
    coll.db.save_all(&cards)?;
    Ok(crate::select::due_count(&cards, now))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use tempfile::tempdir;

    use super::*;
    use crate::scheduler::rate;
    use crate::types::rating::Rating;
    use crate::types::timestamp::MILLIS_PER_DAY;

    const T0: Timestamp = Timestamp::from_millis(1_700_000_000_000);

    fn collection() -> Fallible<(TempDir, Collection)> {
        let dir = tempdir()?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        Ok((dir, coll))
    }

    #[test]
    fn test_add_card() -> Fallible<()> {
        let (_dir, coll) = collection()?;
        let a = add_card(&coll, "Hello", "你好", Some("Greeting".to_string()), T0)?;
        let b = add_card(&coll, "Thanks", "謝謝", None, T0)?;
        let cards = coll.load_cards(T0)?;
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].id, a);
        assert_eq!(cards[0].order, 0);
        assert_eq!(cards[0].display_title(), "Greeting");
        assert_eq!(cards[1].id, b);
        assert_eq!(cards[1].order, 1);
        assert!(cards.iter().all(|card| card.is_due(T0)));
        Ok(())
    }

    #[test]
    fn test_add_empty_card_rejected() -> Fallible<()> {
        let (_dir, coll) = collection()?;
        assert!(add_card(&coll, " ", "x", None, T0).is_err());
        Ok(())
    }

    #[test]
    fn test_delete_card_closes_gap() -> Fallible<()> {
        let (_dir, coll) = collection()?;
        let a = add_card(&coll, "a", "a", None, T0)?;
        let b = add_card(&coll, "b", "b", None, T0)?;
        let c = add_card(&coll, "c", "c", None, T0)?;
        delete_card(&coll, &b, T0)?;
        let cards = coll.load_cards(T0)?;
        let ids: Vec<&CardId> = cards.iter().map(|card| &card.id).collect();
        assert_eq!(ids, vec![&a, &c]);
        assert_eq!(cards[1].order, 1);
        assert!(delete_card(&coll, &b, T0).is_err());
        Ok(())
    }

    #[test]
    fn test_edit_keeps_progress() -> Fallible<()> {
        let (_dir, coll) = collection()?;
        let a = add_card(&coll, "Hello", "你好", None, T0)?;
        let b = add_card(&coll, "Thanks", "謝謝", None, T0)?;
        pin_card(&coll, &b, T0)?;
        star_card(&coll, &b, T0)?;
        let mut cards = coll.load_cards(T0)?;
        rate(&mut cards[0], Rating::Easy, T0);
        cards[0].last_reviewed = Some(T0);
        coll.db.save_progress(&cards[0])?;
        let before = coll.load_cards(T0)?;

        edit_card(
            &coll,
            &b,
            None,
            Some(" 多謝 ".to_string()),
            Some("Gratitude".to_string()),
            T0,
        )?;
        let after = coll.load_cards(T0)?;
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].id, b);
        assert_eq!(after[0].question, "Thanks");
        assert_eq!(after[0].answer, "多謝");
        assert_eq!(after[0].display_title(), "Gratitude");
        assert_eq!(
            Card {
                answer: before[0].answer.clone(),
                title: before[0].title.clone(),
                ..after[0].clone()
            },
            before[0]
        );
        assert_eq!(after[1], before[1]);
        assert_eq!(after[1].id, a);
        Ok(())
    }

    #[test]
    fn test_edit_rejects_bad_input() -> Fallible<()> {
        let (_dir, coll) = collection()?;
        let a = add_card(&coll, "Hello", "你好", None, T0)?;
        assert!(edit_card(&coll, &a, None, None, None, T0).is_err());
        assert!(edit_card(&coll, &a, Some("  ".to_string()), None, None, T0).is_err());
        let missing = CardId::new("missing")?;
        assert!(edit_card(&coll, &missing, Some("x".to_string()), None, None, T0).is_err());
        assert_eq!(coll.load_cards(T0)?[0].question, "Hello");
        Ok(())
    }

    #[test]
    fn test_pin_and_unpin() -> Fallible<()> {
        let (_dir, coll) = collection()?;
        let a = add_card(&coll, "a", "a", None, T0)?;
        let b = add_card(&coll, "b", "b", None, T0)?;
        assert!(pin_card(&coll, &b, T0)?);
        let cards = coll.load_cards(T0)?;
        assert_eq!(cards[0].id, b);
        assert!(cards[0].pinned);
        assert!(!pin_card(&coll, &b, T0)?);
        let cards = coll.load_cards(T0)?;
        assert_eq!(cards[0].id, a);
        assert_eq!(cards[1].id, b);
        Ok(())
    }

    #[test]
    fn test_star() -> Fallible<()> {
        let (_dir, coll) = collection()?;
        let a = add_card(&coll, "a", "a", None, T0)?;
        assert!(star_card(&coll, &a, T0)?);
        let cards = coll.load_cards(T0)?;
        assert_eq!(cards[0].starred_at, Some(T0));
        assert!(!star_card(&coll, &a, T0)?);
        Ok(())
    }

    #[test]
    fn test_skip_day() -> Fallible<()> {
        let (_dir, coll) = collection()?;
        add_card(&coll, "a", "a", None, T0.plus_millis(MILLIS_PER_DAY))?;
        assert_eq!(skip_day(&coll, T0)?, 1);
        let cards = coll.load_cards(T0)?;
        assert_eq!(cards[0].next_review, T0);
        Ok(())
    }
}
