use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use shared::domain::{Arcana, CardDefinition, CardId, Suit};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

mod seed;

pub use seed::{import_cards, load_deck_file, parse_deck, seed_if_empty, standard_deck};

/// Card repository as the drawing core sees it. `insert` only stages a card;
/// nothing is visible to `all_cards` until `persist` succeeds.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Every persisted card, sorted by name.
    async fn all_cards(&self) -> Result<Vec<CardDefinition>>;
    async fn is_empty(&self) -> Result<bool>;
    async fn insert(&self, card: CardDefinition) -> Result<()>;
    /// Writes staged cards in one transaction and returns how many were written.
    async fn persist(&self) -> Result<usize>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
    staged: Arc<Mutex<Vec<CardDefinition>>>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open card store at '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!(%database_url, "card store ready");
        Ok(Self {
            pool,
            staged: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn card_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cards")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn staged_count(&self) -> usize {
        self.staged.lock().await.len()
    }
}

#[async_trait]
impl CardStore for Storage {
    async fn all_cards(&self) -> Result<Vec<CardDefinition>> {
        let rows = sqlx::query(
            "SELECT id, name, suit, number, upright_meaning, reversed_meaning, keywords, image_name, arcana
             FROM cards
             ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(card_from_row).collect()
    }

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.card_count().await? == 0)
    }

    async fn insert(&self, card: CardDefinition) -> Result<()> {
        card.validate()?;
        self.staged.lock().await.push(card);
        Ok(())
    }

    async fn persist(&self) -> Result<usize> {
        let mut staged = self.staged.lock().await;
        if staged.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for card in staged.iter() {
            let keywords = serde_json::to_string(&card.keywords)?;
            sqlx::query(
                "INSERT INTO cards
                    (id, name, suit, number, upright_meaning, reversed_meaning, keywords, image_name, arcana)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(card.id.0.to_string())
            .bind(&card.name)
            .bind(card.suit.map(|suit| suit.as_str()))
            .bind(card.number)
            .bind(&card.upright_meaning)
            .bind(&card.reversed_meaning)
            .bind(keywords)
            .bind(card.image_name.as_deref())
            .bind(card.arcana.map(|arcana| arcana.as_str()))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to persist card '{}' ({})", card.name, card.id))?;
        }
        tx.commit().await.context("failed to commit staged cards")?;

        let written = staged.len();
        staged.clear();
        info!(card_count = written, "persisted staged cards");
        Ok(written)
    }
}

fn card_from_row(row: &SqliteRow) -> Result<CardDefinition> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id).with_context(|| format!("card id '{id}' is not a uuid"))?;
    let keywords: String = row.try_get("keywords")?;
    let suit: Option<String> = row.try_get("suit")?;
    let arcana: Option<String> = row.try_get("arcana")?;

    Ok(CardDefinition {
        id: CardId(id),
        name: row.try_get("name")?,
        suit: suit.as_deref().map(Suit::from_str).transpose()?,
        number: row.try_get("number")?,
        upright_meaning: row.try_get("upright_meaning")?,
        reversed_meaning: row.try_get("reversed_meaning")?,
        keywords: serde_json::from_str(&keywords)
            .map_err(|err| anyhow!("card {id} has malformed keywords: {err}"))?,
        image_name: row.try_get("image_name")?,
        arcana: arcana.as_deref().map(Arcana::from_str).transpose()?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
