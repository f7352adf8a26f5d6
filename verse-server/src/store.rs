//! JSON document store
//!
//! Two flat files under the data folder:
//! - `poems.json`: array of poems
//! - `progress.json`: object keyed by user id, then poem id
//!
//! Every write rewrites the whole document. Read-modify-write cycles are
//! serialized by an async mutex, which protects against concurrent requests
//! in this process but not against other writers of the same files.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use verse_common::model::{NewPoem, Poem, PoemProgress, ProgressDocument, UserProgress};
use verse_common::text::normalize_for_comparison;
use verse_common::validation::validate_poem;
use verse_common::{time, Error, Result};

pub const POEMS_FILE: &str = "poems.json";
pub const PROGRESS_FILE: &str = "progress.json";

pub struct JsonStore {
    poems_path: PathBuf,
    progress_path: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            poems_path: data_dir.join(POEMS_FILE),
            progress_path: data_dir.join(PROGRESS_FILE),
            lock: Mutex::new(()),
        }
    }

    /// Create the data folder and open a store, writing empty documents
    /// where none exist
    pub async fn open(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let store = Self::new(data_dir);

        if !tokio::fs::try_exists(&store.poems_path).await? {
            write_document(&store.poems_path, &Vec::<Poem>::new()).await?;
            info!(path = %store.poems_path.display(), "Created empty poems document");
        }
        if !tokio::fs::try_exists(&store.progress_path).await? {
            write_document(&store.progress_path, &ProgressDocument::new()).await?;
            info!(path = %store.progress_path.display(), "Created empty progress document");
        }
        Ok(store)
    }

    // ------------------------------------------------------------------
    // Poems
    // ------------------------------------------------------------------

    pub async fn list_poems(&self) -> Result<Vec<Poem>> {
        let _guard = self.lock.lock().await;
        self.load_poems().await
    }

    /// Validate, de-duplicate and store a new poem
    pub async fn insert_poem(&self, draft: NewPoem) -> Result<Poem> {
        validate_poem(&draft)?;

        let title = draft.title.unwrap_or_default().trim().to_string();
        let author = draft.author.unwrap_or_default().trim().to_string();
        let year = draft.year.unwrap_or_default().trim().to_string();
        let stanzas = draft
            .stanzas
            .unwrap_or_default()
            .iter()
            .map(|s| s.trim().to_string())
            .collect();

        let _guard = self.lock.lock().await;
        let mut poems = self.load_poems().await?;

        let key = (normalize_for_comparison(&title), normalize_for_comparison(&author));
        let duplicate = poems.iter().any(|p| {
            normalize_for_comparison(&p.title) == key.0 && normalize_for_comparison(&p.author) == key.1
        });
        if duplicate {
            debug!(title = %title, author = %author, "Rejecting duplicate poem");
            return Err(Error::Duplicate { title, author });
        }

        let poem = Poem {
            id: uuid::Uuid::new_v4().simple().to_string(),
            title,
            author,
            year,
            stanzas,
            created_at: time::now(),
        };
        poems.push(poem.clone());
        write_document(&self.poems_path, &poems).await?;

        info!(poem_id = %poem.id, title = %poem.title, stanzas = poem.stanzas.len(), "Poem added");
        Ok(poem)
    }

    /// Remove a poem and every user's progress for it
    pub async fn delete_poem(&self, poem_id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut poems = self.load_poems().await?;
        let before = poems.len();
        poems.retain(|p| p.id != poem_id);
        if poems.len() == before {
            return Err(Error::NotFound(format!("poem {}", poem_id)));
        }
        write_document(&self.poems_path, &poems).await?;

        let mut progress = self.load_progress().await?;
        let mut cascaded = 0;
        for entries in progress.values_mut() {
            if entries.remove(poem_id).is_some() {
                cascaded += 1;
            }
        }
        write_document(&self.progress_path, &progress).await?;

        info!(poem_id = %poem_id, cascaded, "Poem deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Progress
    // ------------------------------------------------------------------

    pub async fn get_progress(&self, user_id: &str, poem_id: &str) -> Result<Option<PoemProgress>> {
        let _guard = self.lock.lock().await;
        let mut progress = self.load_progress().await?;
        Ok(progress
            .get_mut(user_id)
            .and_then(|entries| entries.remove(poem_id)))
    }

    pub async fn get_user_progress(&self, user_id: &str) -> Result<UserProgress> {
        let _guard = self.lock.lock().await;
        let mut progress = self.load_progress().await?;
        Ok(progress.remove(user_id).unwrap_or_default())
    }

    /// Overwrite one progress entry, stamping `lastUpdated`
    pub async fn put_progress(
        &self,
        user_id: &str,
        poem_id: &str,
        mut entry: PoemProgress,
    ) -> Result<PoemProgress> {
        entry.last_updated = Some(time::now());

        let _guard = self.lock.lock().await;
        let mut progress = self.load_progress().await?;
        progress
            .entry(user_id.to_string())
            .or_default()
            .insert(poem_id.to_string(), entry.clone());
        write_document(&self.progress_path, &progress).await?;

        debug!(user_id = %user_id, poem_id = %poem_id, "Progress saved");
        Ok(entry)
    }

    pub async fn delete_progress(&self, user_id: &str, poem_id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut progress = self.load_progress().await?;
        let removed = progress
            .get_mut(user_id)
            .and_then(|entries| entries.remove(poem_id));
        if removed.is_none() {
            return Err(Error::NotFound(format!("progress for poem {}", poem_id)));
        }
        write_document(&self.progress_path, &progress).await?;

        debug!(user_id = %user_id, poem_id = %poem_id, "Progress deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    async fn load_poems(&self) -> Result<Vec<Poem>> {
        read_document(&self.poems_path).await
    }

    async fn load_progress(&self) -> Result<ProgressDocument> {
        read_document(&self.progress_path).await
    }
}

/// Read a whole document; a missing file reads as the empty document
async fn read_document<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Document is not valid JSON");
            Error::Json(e)
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

async fn write_document<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use verse_common::model::{LearningProgress, Round};

    fn draft(title: &str, author: &str) -> NewPoem {
        NewPoem::new(title, author, Some(" 1848 ".into()), vec!["  first stanza ".into()])
    }

    fn learning() -> PoemProgress {
        PoemProgress {
            learning: Some(LearningProgress {
                current_round: Round::First,
                current_stanza_index: 0,
                repeat_count: 1,
                attempts: Vec::new(),
                problem_words: Default::default(),
                word_hint_tries: Default::default(),
                last_updated: None,
            }),
            ..PoemProgress::default()
        }
    }

    #[tokio::test]
    async fn test_open_creates_empty_documents() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested");
        let store = JsonStore::open(&data_dir).await.unwrap();

        assert!(data_dir.join(POEMS_FILE).exists());
        assert!(data_dir.join(PROGRESS_FILE).exists());
        assert!(store.list_poems().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_trims_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();

        let poem = store.insert_poem(draft("  Title ", " Author ")).await.unwrap();
        assert_eq!(poem.title, "Title");
        assert_eq!(poem.author, "Author");
        assert_eq!(poem.year, "1848");
        assert_eq!(poem.stanzas, vec!["first stanza".to_string()]);
        assert!(!poem.id.is_empty());

        assert_eq!(store.list_poems().await.unwrap(), vec![poem]);
    }

    #[tokio::test]
    async fn test_duplicate_ignores_case_accents_and_punctuation() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();

        store.insert_poem(draft("Szeptember végén", "Petőfi Sándor")).await.unwrap();
        let err = store
            .insert_poem(draft("SZEPTEMBER VEGEN!", "petofi, sandor"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Duplicate { .. }));

        // Same title, different author is fine
        store.insert_poem(draft("Szeptember végén", "Someone Else")).await.unwrap();
        assert_eq!(store.list_poems().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_poem_cascades_progress() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        let kept = store.insert_poem(draft("Kept", "A")).await.unwrap();
        let gone = store.insert_poem(draft("Gone", "A")).await.unwrap();

        for user in ["user_1_a", "user_2_b"] {
            store.put_progress(user, &gone.id, learning()).await.unwrap();
            store.put_progress(user, &kept.id, learning()).await.unwrap();
        }

        store.delete_poem(&gone.id).await.unwrap();

        for user in ["user_1_a", "user_2_b"] {
            let entries = store.get_user_progress(user).await.unwrap();
            assert!(!entries.contains_key(&gone.id));
            assert!(entries.contains_key(&kept.id));
        }
        assert!(matches!(store.delete_poem(&gone.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_put_progress_overwrites_and_stamps() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();

        let stored = store.put_progress("user_1_a", "p1", learning()).await.unwrap();
        assert!(stored.last_updated.is_some());

        let replacement = PoemProgress::default();
        store.put_progress("user_1_a", "p1", replacement).await.unwrap();
        let fetched = store.get_progress("user_1_a", "p1").await.unwrap().unwrap();
        assert!(fetched.learning.is_none());
        assert!(store.get_progress("user_1_a", "p2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_progress_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        assert!(matches!(
            store.delete_progress("user_1_a", "p1").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join(POEMS_FILE), "{ not json").unwrap();

        assert!(matches!(store.list_poems().await, Err(Error::Json(_))));
        assert!(store.insert_poem(draft("T", "A")).await.is_err());
        let raw = std::fs::read_to_string(dir.path().join(POEMS_FILE)).unwrap();
        assert_eq!(raw, "{ not json");
    }
}
