//! Catalog queries behind the `/api` routes.
//!
//! A category token coming from the storefront is ambiguous: it may be the
//! slug of a subcategory document or a legacy free-text category label.
//! [`Catalog::resolve_query`] settles that before any product is fetched.

use derive_more::{Display, Error};
use itertools::Itertools;
use kalium_types::product::{Newest, Product, ProductQuery, ProductRepository};
use kalium_types::subcategory::{Active, ByIds, Subcategory, SubcategoryRepository};
use kalium_types::ObjectId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use typesafe_repository::async_ops::{Get, Select};

pub const PRODUCT_NOT_FOUND: &str = "Product not found";
pub const SUBCATEGORY_NOT_FOUND: &str = "Subcategory not found";

#[derive(Debug, Display, Error)]
pub enum CatalogError {
    #[error(ignore)]
    #[display("{_0}")]
    NotFound(&'static str),
    #[error(ignore)]
    #[display("{_0}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Store(err)
    }
}

#[derive(Serialize, Debug)]
pub struct SubcategoryWithProducts {
    pub subcategory: Subcategory,
    pub products: Vec<Product>,
}

#[derive(Clone)]
pub struct Catalog {
    products: Arc<dyn ProductRepository>,
    subcategories: Arc<dyn SubcategoryRepository>,
}

impl Catalog {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        subcategories: Arc<dyn SubcategoryRepository>,
    ) -> Self {
        Self {
            products,
            subcategories,
        }
    }

    /// Builds the product filter from raw query parameters.
    ///
    /// `category` matching a subcategory slug filters by that subcategory,
    /// anything else is compared verbatim with the legacy category label.
    /// An explicit `subcategory` (id or slug) is applied afterwards and wins
    /// when it resolves. `is_active` is `true` only for the literal `"true"`.
    pub async fn resolve_query(
        &self,
        category: Option<&str>,
        subcategory: Option<&str>,
        is_active: Option<&str>,
    ) -> Result<ProductQuery, CatalogError> {
        let mut query = ProductQuery::default();

        if let Some(category) = category {
            match self.subcategories.find_by_slug(category).await? {
                Some(sub) => query.subcategory = Some(sub.id),
                None => query.category = Some(category.to_string()),
            }
        }

        if let Some(subcategory) = subcategory {
            if let Ok(id) = subcategory.parse::<ObjectId>() {
                query.subcategory = Some(id);
            } else if let Some(sub) = self.subcategories.find_by_slug(subcategory).await? {
                query.subcategory = Some(sub.id);
            }
        }

        if let Some(is_active) = is_active {
            query.is_active = Some(is_active == "true");
        }

        Ok(query)
    }

    pub async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, CatalogError> {
        let products = self.products.select(query).await?;
        log::debug!("Query {query:?} matched {} products", products.len());
        self.populate(products).await
    }

    pub async fn list_by_subcategory_slug(&self, slug: &str) -> Result<Vec<Product>, CatalogError> {
        let sub = self.subcategory_by_slug(slug).await?;
        let products = self
            .products
            .select(&ProductQuery::active_in(sub.id.clone()))
            .await?;
        Ok(products
            .into_iter()
            .map(|p| p.populate(Some(sub.clone())))
            .collect())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Product, CatalogError> {
        let p = self
            .products
            .find_by_slug(slug)
            .await?
            .ok_or(CatalogError::NotFound(PRODUCT_NOT_FOUND))?;
        self.populate_one(p).await
    }

    pub async fn get_by_article(&self, article_number: &str) -> Result<Product, CatalogError> {
        let p = self
            .products
            .find_by_article(article_number)
            .await?
            .ok_or(CatalogError::NotFound(PRODUCT_NOT_FOUND))?;
        self.populate_one(p).await
    }

    /// Malformed ids never reach the store; they are reported as missing.
    pub async fn get_by_id(&self, id: &str) -> Result<Product, CatalogError> {
        let id = id
            .parse::<ObjectId>()
            .map_err(|_| CatalogError::NotFound(PRODUCT_NOT_FOUND))?;
        let p = self
            .products
            .get_one(&id)
            .await?
            .ok_or(CatalogError::NotFound(PRODUCT_NOT_FOUND))?;
        self.populate_one(p).await
    }

    pub async fn list_subcategories(&self) -> Result<Vec<Subcategory>, CatalogError> {
        Ok(self.subcategories.select(&Active).await?)
    }

    /// Products here are left unpopulated and ordered newest first.
    pub async fn subcategory_with_products(
        &self,
        slug: &str,
    ) -> Result<SubcategoryWithProducts, CatalogError> {
        let subcategory = self.subcategory_by_slug(slug).await?;
        let products = self
            .products
            .select(&Newest(ProductQuery::active_in(subcategory.id.clone())))
            .await?;
        Ok(SubcategoryWithProducts {
            subcategory,
            products,
        })
    }

    async fn subcategory_by_slug(&self, slug: &str) -> Result<Subcategory, CatalogError> {
        self.subcategories
            .find_by_slug(slug)
            .await?
            .ok_or(CatalogError::NotFound(SUBCATEGORY_NOT_FOUND))
    }

    async fn populate_one(&self, p: Product) -> Result<Product, CatalogError> {
        let mut populated = self.populate(vec![p]).await?;
        populated
            .pop()
            .ok_or(CatalogError::NotFound(PRODUCT_NOT_FOUND))
    }

    async fn populate(&self, products: Vec<Product>) -> Result<Vec<Product>, CatalogError> {
        let ids = products
            .iter()
            .filter_map(Product::subcategory_id)
            .cloned()
            .unique()
            .collect::<Vec<_>>();
        let subcategories = self
            .subcategories
            .select(&ByIds(ids))
            .await?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect::<HashMap<_, _>>();
        Ok(products
            .into_iter()
            .map(|p| {
                let sub = p
                    .subcategory_id()
                    .and_then(|id| subcategories.get(id))
                    .cloned();
                p.populate(sub)
            })
            .collect())
    }
}
