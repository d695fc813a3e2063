use super::documents::DocumentDir;
use super::error::StoreResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

const SERVER_FIELDS: &[&str] = &["id", "created", "updated"];

/// Blog article: server-managed identity and timestamps around free-form content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Article {
    fn apply(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if !SERVER_FIELDS.contains(&key.as_str()) {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }
}

#[derive(Debug)]
pub struct ArticleStore {
    docs: DocumentDir,
}

impl ArticleStore {
    pub async fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        Ok(Self {
            docs: DocumentDir::open(dir).await?,
        })
    }

    pub async fn create(&self, fields: &Map<String, Value>) -> StoreResult<Article> {
        let now = Utc::now();
        let mut article = Article {
            id: Uuid::new_v4().to_string(),
            created: now,
            updated: now,
            fields: Map::new(),
        };
        article.apply(fields);

        self.docs.write(&article.id, &article).await?;
        info!("Created article {}", article.id);
        Ok(article)
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Article>> {
        self.docs.read(id).await
    }

    /// Newest first
    pub async fn list(&self) -> StoreResult<Vec<Article>> {
        let mut articles = Vec::new();
        for key in self.docs.keys().await? {
            match self.docs.read::<Article>(&key).await {
                Ok(Some(article)) => articles.push(article),
                Ok(None) => {}
                Err(e) => warn!("Skipping article {}: {}", key, e),
            }
        }
        articles.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));
        Ok(articles)
    }

    /// Shallow merge; `Ok(None)` if the article does not exist
    pub async fn update(&self, id: &str, patch: &Map<String, Value>) -> StoreResult<Option<Article>> {
        DocumentDir::validate_key(id)?;
        let _guard = self.docs.lock(id).await;

        let Some(mut article) = self.docs.read::<Article>(id).await? else {
            return Ok(None);
        };
        article.apply(patch);
        article.updated = Utc::now();

        self.docs.write(id, &article).await?;
        Ok(Some(article))
    }

    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        DocumentDir::validate_key(id)?;
        let _guard = self.docs.lock(id).await;
        let removed = self.docs.remove(id).await?;
        if removed {
            info!("Deleted article {}", id);
        }
        Ok(removed)
    }
}
