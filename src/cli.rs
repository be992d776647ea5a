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

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use clap::Parser;

use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::cmd::cards::add_card;
use crate::cmd::cards::delete_card;
use crate::cmd::cards::edit_card;
use crate::cmd::cards::pin_card;
use crate::cmd::cards::skip_day;
use crate::cmd::cards::star_card;
use crate::cmd::drill::server::ServerConfig;
use crate::cmd::drill::server::start_server;
use crate::cmd::export::export_collection;
use crate::cmd::export::import_cards;
use crate::cmd::feed::find_orphans;
use crate::cmd::feed::sync_feed;
use crate::cmd::feed::write_generated_feed;
use crate::cmd::list::render_due;
use crate::cmd::list::render_list;
use crate::cmd::list::render_recent;
use crate::cmd::list::render_schedule;
use crate::cmd::list::render_starred;
use crate::cmd::stats::collection_stats;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::types::card_id::CardId;

const DEFAULT_RECENT_LIMIT: usize = 20;

#[derive(Args)]
struct CollectionArgs {
    /// Path to the collection directory. By default, the current working directory is used.
    #[arg(long, short = 'd')]
    directory: Option<String>,
}

impl CollectionArgs {
    fn open(self) -> Fallible<Collection> {
        Collection::new(self.directory)
    }
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Study due cards in the browser.
    Drill {
        #[command(flatten)]
        coll: CollectionArgs,
        /// Port to listen on. Overrides the configuration file.
        #[arg(long)]
        port: Option<u16>,
        /// Don't open the browser automatically.
        #[arg(long, default_value_t = false)]
        no_open: bool,
    },
    /// Create a card.
    Add {
        question: String,
        answer: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// Change a card's question, answer, or title. Its progress is kept.
    Edit {
        id: String,
        #[arg(long)]
        question: Option<String>,
        #[arg(long)]
        answer: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// Delete a card and its progress.
    Delete {
        id: String,
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// Pin or unpin a card.
    Pin {
        id: String,
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// Star or unstar a card.
    Star {
        id: String,
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// List the cards that are due now.
    Due {
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// List every card in browsing order.
    List {
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// List every card by when it is next due.
    Schedule {
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// List recently rated cards.
    Recent {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// List starred cards.
    Starred {
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// Bring every card one day closer to being due.
    SkipDay {
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// Import cards from a JSON file.
    Import {
        file: PathBuf,
        /// Delete stored cards that are not in the file.
        #[arg(long, default_value_t = false)]
        replace: bool,
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// Print the collection as JSON.
    Export {
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// Merge a content feed into the collection.
    Sync {
        /// Path or http(s) URL of a `cards.json` feed. Defaults to the configured feed.
        feed: Option<String>,
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// Build a content feed from a folder of lessons.
    Generate {
        /// Folder with `<name>.txt` and `<name>.<audio>` pairs.
        source: PathBuf,
        /// Where to write the feed. Audio files are copied to `audio/` next to it.
        #[arg(long, default_value = "cards.json")]
        output: PathBuf,
    },
    /// List stored cards that the configured feed no longer has.
    Orphans {
        #[command(flatten)]
        coll: CollectionArgs,
    },
    /// Print collection statistics as JSON.
    Stats {
        #[command(flatten)]
        coll: CollectionArgs,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    let clock = SystemClock;
    match cli {
        Command::Drill {
            coll,
            port,
            no_open,
        } => {
            let coll = coll.open()?;
            let config = ServerConfig {
                port: port.unwrap_or(coll.config.port),
                open_browser: !no_open,
            };
            start_server(coll, Arc::new(clock), config).await
        }
        Command::Add {
            question,
            answer,
            title,
            coll,
        } => {
            let coll = coll.open()?;
            let id = add_card(&coll, &question, &answer, title, clock.now())?;
            println!("{id}");
            Ok(())
        }
        Command::Edit {
            id,
            question,
            answer,
            title,
            coll,
        } => {
            let coll = coll.open()?;
            edit_card(&coll, &CardId::new(id)?, question, answer, title, clock.now())
        }
        Command::Delete { id, coll } => {
            let coll = coll.open()?;
            delete_card(&coll, &CardId::new(id)?, clock.now())
        }
        Command::Pin { id, coll } => {
            let coll = coll.open()?;
            let pinned = pin_card(&coll, &CardId::new(id)?, clock.now())?;
            println!("{}", if pinned { "pinned" } else { "unpinned" });
            Ok(())
        }
        Command::Star { id, coll } => {
            let coll = coll.open()?;
            let starred = star_card(&coll, &CardId::new(id)?, clock.now())?;
            println!("{}", if starred { "starred" } else { "unstarred" });
            Ok(())
        }
        Command::Due { coll } => {
            let coll = coll.open()?;
            let now = clock.now();
            print!("{}", render_due(&coll.load_cards(now)?, now));
            Ok(())
        }
        Command::List { coll } => {
            let coll = coll.open()?;
            let cards = coll.load_cards(clock.now())?;
            print!("{}", render_list(&cards, coll.config.review_mode));
            Ok(())
        }
        Command::Schedule { coll } => {
            let coll = coll.open()?;
            let now = clock.now();
            print!("{}", render_schedule(&coll.load_cards(now)?, now));
            Ok(())
        }
        Command::Recent { limit, coll } => {
            let coll = coll.open()?;
            print!("{}", render_recent(&coll.load_cards(clock.now())?, limit));
            Ok(())
        }
        Command::Starred { coll } => {
            let coll = coll.open()?;
            print!("{}", render_starred(&coll.load_cards(clock.now())?));
            Ok(())
        }
        Command::SkipDay { coll } => {
            let coll = coll.open()?;
            let due = skip_day(&coll, clock.now())?;
            println!("{due} cards due.");
            Ok(())
        }
        Command::Import {
            file,
            replace,
            coll,
        } => {
            let coll = coll.open()?;
            let report = import_cards(&coll, &file, replace, clock.now())?;
            println!(
                "{} added, {} updated, {} removed.",
                report.added, report.updated, report.removed
            );
            Ok(())
        }
        Command::Export { coll } => {
            let coll = coll.open()?;
            println!("{}", export_collection(&coll, clock.now())?);
            Ok(())
        }
        Command::Sync { feed, coll } => {
            let coll = coll.open()?;
            let added = sync_feed(&coll, feed, clock.now()).await?;
            println!("{added} new cards.");
            Ok(())
        }
        Command::Generate { source, output } => {
            let generated = write_generated_feed(&source, &output)?;
            for stem in &generated.incomplete {
                eprintln!("skipped {stem}: needs both a .txt and an audio file.");
            }
            for stem in &generated.empty {
                eprintln!("skipped {stem}: text file is empty.");
            }
            for (stem, id) in &generated.renamed {
                eprintln!("{stem}: id taken, using {id}.");
            }
            println!(
                "Wrote {} cards to {}.",
                generated.feed.cards.len(),
                output.display()
            );
            Ok(())
        }
        Command::Orphans { coll } => {
            let coll = coll.open()?;
            for id in find_orphans(&coll).await? {
                println!("{id}");
            }
            Ok(())
        }
        Command::Stats { coll } => {
            let coll = coll.open()?;
            let stats = collection_stats(&coll, clock.now())?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}
