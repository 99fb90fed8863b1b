//! Data access layer: the JSON persistence store and the game repository.

pub mod models;
pub mod store;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    dao::{
        models::GameRecord,
        store::{JsonStore, StorageError},
    },
    state::game::Game,
};

/// Result alias for repository operations.
pub type DaoResult<T> = Result<T, DaoError>;

/// Error raised by game lookup and creation.
#[derive(Debug, Error)]
pub enum DaoError {
    /// No stored game matches the requested identifier.
    #[error("no game matches that thread, chat, or name")]
    NoGame,
    /// A game with the requested topic id or name already exists.
    #[error("a game already exists with that topic id or name")]
    GameExists,
    /// The backing store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Repository over the persisted game document. Cheap to clone; every clone
/// shares the same store behind one async mutex, which is what makes
/// load→mutate→save sequences safe on a multi-threaded runtime.
#[derive(Clone, Debug)]
pub struct MafiaDao {
    store: Arc<Mutex<JsonStore>>,
}

impl MafiaDao {
    /// Build a repository over `connection` (a path, or
    /// [`store::MEMORY_CONNECTION`]). Game handles keep a clone as their
    /// back-reference for persistence.
    pub fn new(connection: impl Into<String>) -> Self {
        Self {
            store: Arc::new(Mutex::new(JsonStore::new(connection))),
        }
    }

    /// Create a new game in signups. Rejects with [`DaoError::GameExists`] when
    /// any stored record already uses `topic_id` or `name`.
    pub async fn create_game(&self, topic_id: u64, name: &str) -> DaoResult<Game> {
        let mut store = self.store.lock().await;
        let records = store.load().await?;

        if records
            .iter()
            .any(|record| record.topic_id == topic_id || record.name == name)
        {
            return Err(DaoError::GameExists);
        }

        records.push(GameRecord::new(topic_id, name));
        store.save().await?;
        info!(topic_id, name = %name, "created game");

        Ok(Game::bind(self.clone(), topic_id))
    }

    /// Look up the game running in thread `topic_id`.
    pub async fn game_by_topic_id(&self, topic_id: u64) -> DaoResult<Game> {
        self.find_game(|record| record.topic_id == topic_id).await
    }

    /// Look up a game by its unique name.
    pub async fn game_by_name(&self, name: &str) -> DaoResult<Game> {
        self.find_game(|record| record.name == name).await
    }

    /// Look up the game a sanctioned chat belongs to.
    pub async fn game_by_chat_id(&self, chat_id: u64) -> DaoResult<Game> {
        self.find_game(|record| record.chats.contains(&chat_id))
            .await
    }

    /// First-match scan over the document. Earliest-inserted wins when
    /// duplicates exist, so lookups stay deterministic even on a corrupted
    /// document.
    async fn find_game(&self, matches: impl Fn(&GameRecord) -> bool) -> DaoResult<Game> {
        let mut store = self.store.lock().await;
        let records = store.load().await?;

        let record = records.iter().find(|&record| matches(record));
        match record {
            Some(record) => Ok(Game::bind(self.clone(), record.topic_id)),
            None => Err(DaoError::NoGame),
        }
    }

    /// Run a read-only closure against one game's record.
    pub(crate) async fn read<T>(
        &self,
        topic_id: u64,
        reader: impl FnOnce(&GameRecord) -> T,
    ) -> DaoResult<T> {
        let mut store = self.store.lock().await;
        let records = store.load().await?;
        let record = records
            .iter()
            .find(|record| record.topic_id == topic_id)
            .ok_or(DaoError::NoGame)?;
        Ok(reader(record))
    }

    /// Run a validating mutation against one game's record and persist it.
    /// The closure must validate before mutating; when it fails, nothing is
    /// saved. The whole sequence holds the store lock, so concurrent mutations
    /// against any game serialize.
    pub(crate) async fn mutate<T, E>(
        &self,
        topic_id: u64,
        mutator: impl FnOnce(&mut GameRecord) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DaoError>,
    {
        let mut store = self.store.lock().await;
        let records = store.load().await.map_err(DaoError::from)?;
        let record = records
            .iter_mut()
            .find(|record| record.topic_id == topic_id)
            .ok_or(DaoError::NoGame)?;

        let value = mutator(record)?;
        store.save().await.map_err(DaoError::from)?;
        Ok(value)
    }
}
