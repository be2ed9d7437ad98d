use crate::{read_object_id, sql_placeholders};
use async_trait::async_trait;
use kalium_types::product::{Newest, Product, ProductQuery, ProductRepository, SubcategoryRef};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter};
use rust_decimal::Decimal;
use std::str::FromStr;
use time::UtcOffset;
use tokio_rusqlite::Connection;
use typesafe_repository::async_ops::{Get, Save, Select};
use typesafe_repository::prelude::*;

const COLUMNS: &str = "id, article_number, slug, name, description, price, images, category, subcategory, is_active, created_at, updated_at";

pub struct SqliteProductRepository {
    conn: Connection,
}

impl SqliteProductRepository {
    pub async fn init(conn: Connection) -> Result<Self, tokio_rusqlite::Error> {
        conn.call(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS product (
                    id TEXT PRIMARY KEY,
                    article_number TEXT NOT NULL UNIQUE,
                    slug TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL DEFAULT '',
                    description TEXT,
                    price TEXT,
                    images TEXT,
                    category TEXT,
                    subcategory TEXT,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS product_subcategory_idx ON product(subcategory)",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS product_category_idx ON product(category)",
                [],
            )?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    async fn select_where(
        &self,
        query: &ProductQuery,
        order: &'static str,
    ) -> Result<Vec<Product>, anyhow::Error> {
        let (clause, values) = where_clause(query);
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM product{clause} ORDER BY {order}"
                ))?;
                let p = stmt
                    .query_map(params_from_iter(values), row_to_product)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(p)
            })
            .await?)
    }

    async fn find_one(&self, column: &'static str, value: String) -> Result<Option<Product>, anyhow::Error> {
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM product WHERE {column} = ?1"
                ))?;
                let mut p = stmt
                    .query_map([value], row_to_product)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(p.pop())
            })
            .await?)
    }
}

fn where_clause(query: &ProductQuery) -> (String, Vec<Value>) {
    let mut conditions = vec![];
    let mut values = vec![];
    if let Some(category) = &query.category {
        values.push(Value::Text(category.clone()));
        conditions.push(format!("category = ?{}", values.len()));
    }
    if let Some(subcategory) = &query.subcategory {
        values.push(Value::Text(subcategory.to_string()));
        conditions.push(format!("subcategory = ?{}", values.len()));
    }
    if let Some(is_active) = query.is_active {
        values.push(Value::Integer(is_active.into()));
        conditions.push(format!("is_active = ?{}", values.len()));
    }
    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

fn images_to_db(list: &[String]) -> Option<String> {
    if list.is_empty() {
        None
    } else {
        serde_json::to_string(list).ok()
    }
}

fn images_from_db(data: Option<String>) -> Vec<String> {
    data.and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
        .unwrap_or_default()
}

fn row_to_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    let price = row
        .get::<_, Option<String>>(5)?
        .as_deref()
        .map(Decimal::from_str)
        .transpose()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, err.into()))?;
    let subcategory = match row.get_ref(8)? {
        rusqlite::types::ValueRef::Null => None,
        _ => Some(SubcategoryRef::Id(read_object_id(row, 8)?)),
    };
    Ok(Product {
        id: read_object_id(row, 0)?,
        article_number: row.get(1)?,
        slug: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        price,
        images: images_from_db(row.get(6)?),
        category: row.get(7)?,
        subcategory,
        is_active: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

impl Repository<Product> for SqliteProductRepository {
    type Error = anyhow::Error;
}

#[async_trait]
impl Get<Product> for SqliteProductRepository {
    async fn get_one(&self, id: &IdentityOf<Product>) -> Result<Option<Product>, Self::Error> {
        self.find_one("id", id.to_string()).await
    }
}

#[async_trait]
impl Save<Product> for SqliteProductRepository {
    async fn save(&self, p: Product) -> Result<(), Self::Error> {
        Ok(self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO product (id, article_number, slug, name, description, price, images, category, subcategory, is_active, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT(id) DO UPDATE SET article_number=?2, slug=?3, name=?4, description=?5, price=?6, images=?7, category=?8, subcategory=?9, is_active=?10, created_at=?11, updated_at=?12",
                    params![
                        p.id.as_str(),
                        p.article_number,
                        p.slug,
                        p.name,
                        p.description,
                        p.price.map(|d| d.to_string()),
                        images_to_db(&p.images),
                        p.category,
                        p.subcategory_id().map(ToString::to_string),
                        p.is_active,
                        p.created_at.to_offset(UtcOffset::UTC),
                        p.updated_at.to_offset(UtcOffset::UTC),
                    ],
                )?;
                Ok(())
            })
            .await?)
    }
}

#[async_trait]
impl Select<Product, ProductQuery> for SqliteProductRepository {
    async fn select(&self, query: &ProductQuery) -> Result<Vec<Product>, Self::Error> {
        self.select_where(query, "article_number ASC").await
    }
}

#[async_trait]
impl Select<Product, Newest<ProductQuery>> for SqliteProductRepository {
    async fn select(&self, Newest(query): &Newest<ProductQuery>) -> Result<Vec<Product>, Self::Error> {
        self.select_where(query, "created_at DESC").await
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, Self::Error> {
        self.find_one("slug", slug.to_string()).await
    }

    async fn find_by_article(&self, article_number: &str) -> Result<Option<Product>, Self::Error> {
        self.find_one("article_number", article_number.to_string())
            .await
    }
}
