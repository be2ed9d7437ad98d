use crate::ObjectId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use typesafe_repository::async_ops::{Get, Save, Select};
use typesafe_repository::macros::Id;
use typesafe_repository::prelude::*;
use typesafe_repository::{SelectBy, Selector};

#[derive(Id, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[Id(ref_id, get_id)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    #[id]
    #[serde(rename = "_id", default = "ObjectId::generate")]
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub updated_at: OffsetDateTime,
}

pub(crate) fn default_active() -> bool {
    true
}

/// Active subcategories ordered by name.
pub struct Active;
pub struct ByIds(pub Vec<IdentityOf<Subcategory>>);

impl Selector for Active {}
impl SelectBy<Active> for Subcategory {}

impl Selector for ByIds {}
impl SelectBy<ByIds> for Subcategory {}

#[async_trait]
pub trait SubcategoryRepository:
    Repository<Subcategory, Error = anyhow::Error>
    + Get<Subcategory>
    + Save<Subcategory>
    + Select<Subcategory, Active>
    + Select<Subcategory, ByIds>
    + Send
    + Sync
{
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Subcategory>, Self::Error>;
}
