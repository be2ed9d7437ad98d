#![deny(clippy::unwrap_used)]

use kalium_types::product::ProductRepository;
use kalium_types::subcategory::{Subcategory, SubcategoryRepository};
use kalium_types::{product::Product, ObjectId};
use serde::de::IntoDeserializer;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use typesafe_repository::async_ops::Save;

pub mod catalog;
pub mod config;
pub mod control;
pub mod page;
pub mod product;
pub mod rewrite;
pub mod subcategory;

pub(crate) fn read_object_id(row: &rusqlite::Row, idx: usize) -> Result<ObjectId, rusqlite::Error> {
    use rusqlite::types::Type;
    let raw: String = row.get(idx)?;
    ObjectId::from_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

pub(crate) fn sql_placeholders(n: usize) -> String {
    itertools::intersperse((1..=n).map(|i| format!("?{i}")), ", ".to_string()).collect()
}

pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => T::deserialize(s.into_deserializer()).map(Some),
    }
}

#[derive(Deserialize, Default)]
pub struct CatalogSeed {
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Upserts the documents of a JSON export into the catalog store.
pub async fn import_catalog(
    path: &std::path::Path,
    subcategories: Arc<dyn SubcategoryRepository>,
    products: Arc<dyn ProductRepository>,
) -> Result<(usize, usize), anyhow::Error> {
    let data = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_json::from_str(&data)?;
    let counts = (seed.subcategories.len(), seed.products.len());
    for s in seed.subcategories {
        subcategories.save(s).await?;
    }
    for p in seed.products {
        products.save(p).await?;
    }
    Ok(counts)
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::product::SqliteProductRepository;
    use crate::subcategory::SqliteSubcategoryRepository;
    use kalium_types::product::ProductQuery;
    use std::io::Write;
    use tokio_rusqlite::Connection;
    use typesafe_repository::async_ops::Select;

    #[test]
    fn builds_numbered_placeholders() {
        assert_eq!(sql_placeholders(1), "?1");
        assert_eq!(sql_placeholders(3), "?1, ?2, ?3");
    }

    #[actix_web::test]
    async fn imports_seed_file() {
        let conn = Connection::open_in_memory().await.unwrap();
        let subcategories = Arc::new(SqliteSubcategoryRepository::init(conn.clone()).await.unwrap());
        let products = Arc::new(SqliteProductRepository::init(conn).await.unwrap());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "subcategories": [
                    {{"_id": "65a1f0c2b4e8d9a7c3f21b04", "name": "Mirrors", "slug": "mirrors"}}
                ],
                "products": [
                    {{"articleNumber": "KF-1", "slug": "tact-mirror", "category": "decor",
                      "subcategory": "65a1f0c2b4e8d9a7c3f21b04"}},
                    {{"articleNumber": "KF-2", "slug": "oslo-rug", "isActive": false}}
                ]
            }}"#
        )
        .unwrap();

        let counts = import_catalog(file.path(), subcategories.clone(), products.clone())
            .await
            .unwrap();
        assert_eq!(counts, (1, 2));
        assert!(subcategories.find_by_slug("mirrors").await.unwrap().is_some());
        assert_eq!(products.select(&ProductQuery::default()).await.unwrap().len(), 2);
    }
}
