use crate::subcategory::{default_active, Subcategory};
use crate::ObjectId;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use typesafe_repository::async_ops::{Get, Save, Select};
use typesafe_repository::macros::Id;
use typesafe_repository::prelude::*;
use typesafe_repository::{SelectBy, Selector};

/// Reference from a product to its subcategory.
///
/// Stored documents always hold [`SubcategoryRef::Id`]; populating a product
/// swaps it for the referenced document.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SubcategoryRef {
    Id(ObjectId),
    Populated(Subcategory),
}

impl SubcategoryRef {
    pub fn id(&self) -> &ObjectId {
        match self {
            Self::Id(id) => id,
            Self::Populated(s) => &s.id,
        }
    }
}

#[derive(Id, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[Id(ref_id, get_id)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[id]
    #[serde(rename = "_id", default = "ObjectId::generate")]
    pub id: ObjectId,
    pub article_number: String,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<SubcategoryRef>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub updated_at: OffsetDateTime,
}

impl Product {
    pub fn subcategory_id(&self) -> Option<&ObjectId> {
        self.subcategory.as_ref().map(SubcategoryRef::id)
    }

    /// Replaces the subcategory reference with the referenced document.
    /// A dangling reference (no document found) becomes `None`.
    pub fn populate(mut self, subcategory: Option<Subcategory>) -> Self {
        self.subcategory = subcategory.map(SubcategoryRef::Populated);
        self
    }
}

/// Resolved filter for a product listing. Absent fields do not constrain
/// the result; `is_active: Some(false)` filters to inactive products.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub subcategory: Option<ObjectId>,
    pub is_active: Option<bool>,
}

impl ProductQuery {
    pub fn active_in(subcategory: ObjectId) -> Self {
        Self {
            category: None,
            subcategory: Some(subcategory),
            is_active: Some(true),
        }
    }
}

/// Same filter, newest products first instead of article-number order.
pub struct Newest<T>(pub T);

impl Selector for ProductQuery {}
impl SelectBy<ProductQuery> for Product {}

impl Selector for Newest<ProductQuery> {}
impl SelectBy<Newest<ProductQuery>> for Product {}

#[async_trait]
pub trait ProductRepository:
    Repository<Product, Error = anyhow::Error>
    + Get<Product>
    + Save<Product>
    + Select<Product, ProductQuery>
    + Select<Product, Newest<ProductQuery>>
    + Send
    + Sync
{
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, Self::Error>;
    async fn find_by_article(&self, article_number: &str) -> Result<Option<Product>, Self::Error>;
}
