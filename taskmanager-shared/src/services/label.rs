/// Label CRUD with a cached listing
///
/// `get_all` is served from a [`TtlCache`] under [`LABELS_CACHE_KEY`]; every
/// mutation drops that key.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::cache::{TtlCache, DEFAULT_TTL};
use crate::models::label::{Label, TaskLabel};

pub const LABELS_CACHE_KEY: &str = "labels:all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDto {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

impl From<Label> for LabelDto {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            name: label.name,
            color: label.color,
        }
    }
}

impl From<TaskLabel> for LabelDto {
    fn from(label: TaskLabel) -> Self {
        Self {
            id: label.id,
            name: label.name,
            color: label.color,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LabelInput {
    pub name: String,
    pub color: Option<String>,
}

pub type LabelCache = TtlCache<Vec<LabelDto>>;

#[derive(Clone)]
pub struct LabelService {
    pool: PgPool,
    cache: LabelCache,
}

impl LabelService {
    pub fn new(pool: PgPool, cache: LabelCache) -> Self {
        Self { pool, cache }
    }

    pub async fn get_all(&self) -> ServiceResult<Vec<LabelDto>> {
        let pool = self.pool.clone();
        self.cache
            .get_or_try_insert_with(LABELS_CACHE_KEY, DEFAULT_TTL, || async move {
                let labels = Label::list(&pool).await?;
                Ok::<_, ServiceError>(labels.into_iter().map(LabelDto::from).collect())
            })
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<Option<LabelDto>> {
        Ok(Label::find_by_id(&self.pool, id).await?.map(Into::into))
    }

    pub async fn create(&self, input: LabelInput) -> ServiceResult<LabelDto> {
        let label = Label::create(&self.pool, &input.name, input.color.as_deref()).await?;
        self.cache.remove(LABELS_CACHE_KEY).await;
        Ok(label.into())
    }

    pub async fn update(&self, id: Uuid, input: LabelInput) -> ServiceResult<LabelDto> {
        let label = Label::update(&self.pool, id, &input.name, input.color.as_deref())
            .await?
            .ok_or_else(|| label_not_found(id))?;
        self.cache.remove(LABELS_CACHE_KEY).await;
        Ok(label.into())
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        if !Label::soft_delete(&self.pool, id).await? {
            return Err(label_not_found(id));
        }
        self.cache.remove(LABELS_CACHE_KEY).await;
        Ok(())
    }
}

fn label_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Label {} not found", id))
}
