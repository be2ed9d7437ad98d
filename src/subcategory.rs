use crate::{read_object_id, sql_placeholders};
use async_trait::async_trait;
use kalium_types::subcategory::{Active, ByIds, Subcategory, SubcategoryRepository};
use rusqlite::{params, params_from_iter};
use time::UtcOffset;
use tokio_rusqlite::Connection;
use typesafe_repository::async_ops::{Get, Save, Select};
use typesafe_repository::prelude::*;

const COLUMNS: &str = "id, name, slug, description, is_active, created_at, updated_at";

pub struct SqliteSubcategoryRepository {
    conn: Connection,
}

impl SqliteSubcategoryRepository {
    pub async fn init(conn: Connection) -> Result<Self, tokio_rusqlite::Error> {
        conn.call(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS subcategory (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    slug TEXT NOT NULL UNIQUE,
                    description TEXT,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
                [],
            )?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }
}

fn row_to_subcategory(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subcategory> {
    Ok(Subcategory {
        id: read_object_id(row, 0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Repository<Subcategory> for SqliteSubcategoryRepository {
    type Error = anyhow::Error;
}

#[async_trait]
impl Get<Subcategory> for SqliteSubcategoryRepository {
    async fn get_one(&self, id: &IdentityOf<Subcategory>) -> Result<Option<Subcategory>, Self::Error> {
        let id = id.to_string();
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {COLUMNS} FROM subcategory WHERE id = ?1"))?;
                let mut s = stmt
                    .query_map([id], row_to_subcategory)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(s.pop())
            })
            .await?)
    }
}

#[async_trait]
impl Save<Subcategory> for SqliteSubcategoryRepository {
    async fn save(&self, s: Subcategory) -> Result<(), Self::Error> {
        Ok(self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO subcategory (id, name, slug, description, is_active, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(id) DO UPDATE SET name=?2, slug=?3, description=?4, is_active=?5, created_at=?6, updated_at=?7",
                    params![
                        s.id.as_str(),
                        s.name,
                        s.slug,
                        s.description,
                        s.is_active,
                        s.created_at.to_offset(UtcOffset::UTC),
                        s.updated_at.to_offset(UtcOffset::UTC),
                    ],
                )?;
                Ok(())
            })
            .await?)
    }
}

#[async_trait]
impl Select<Subcategory, Active> for SqliteSubcategoryRepository {
    async fn select(&self, _: &Active) -> Result<Vec<Subcategory>, Self::Error> {
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM subcategory WHERE is_active = 1 ORDER BY name"
                ))?;
                let s = stmt
                    .query_map([], row_to_subcategory)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(s)
            })
            .await?)
    }
}

#[async_trait]
impl Select<Subcategory, ByIds> for SqliteSubcategoryRepository {
    async fn select(&self, ByIds(ids): &ByIds) -> Result<Vec<Subcategory>, Self::Error> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let ids = ids.iter().map(ToString::to_string).collect::<Vec<_>>();
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM subcategory WHERE id IN ({})",
                    sql_placeholders(ids.len())
                ))?;
                let s = stmt
                    .query_map(params_from_iter(ids.iter()), row_to_subcategory)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(s)
            })
            .await?)
    }
}

#[async_trait]
impl SubcategoryRepository for SqliteSubcategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Subcategory>, Self::Error> {
        let slug = slug.to_string();
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {COLUMNS} FROM subcategory WHERE slug = ?1"))?;
                let mut s = stmt
                    .query_map([slug], row_to_subcategory)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(s.pop())
            })
            .await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use kalium_types::ObjectId;
    use time::OffsetDateTime;

    pub(crate) fn subcategory(slug: &str, name: &str, is_active: bool) -> Subcategory {
        Subcategory {
            id: ObjectId::generate(),
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            is_active,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    async fn repo() -> SqliteSubcategoryRepository {
        let conn = Connection::open_in_memory().await.unwrap();
        SqliteSubcategoryRepository::init(conn).await.unwrap()
    }

    #[actix_web::test]
    async fn finds_by_slug_and_id() {
        let repo = repo().await;
        let mirrors = subcategory("mirrors", "Mirrors", true);
        repo.save(mirrors.clone()).await.unwrap();

        let found = repo.find_by_slug("mirrors").await.unwrap().unwrap();
        assert_eq!(found.id, mirrors.id);
        assert_eq!(found.name, "Mirrors");
        assert!(repo.find_by_slug("Mirrors").await.unwrap().is_none());
        assert!(repo.get_one(&mirrors.id).await.unwrap().is_some());
        assert!(repo.get_one(&ObjectId::generate()).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn active_selection_is_sorted_by_name() {
        let repo = repo().await;
        repo.save(subcategory("rugs", "Rugs", true)).await.unwrap();
        repo.save(subcategory("lamps", "Lamps", false)).await.unwrap();
        repo.save(subcategory("mirrors", "Mirrors", true)).await.unwrap();

        let names = repo
            .select(&Active)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Mirrors", "Rugs"]);
    }

    #[actix_web::test]
    async fn save_upserts_and_selects_by_ids() {
        let repo = repo().await;
        let mut rugs = subcategory("rugs", "Rugs", true);
        let mirrors = subcategory("mirrors", "Mirrors", true);
        repo.save(rugs.clone()).await.unwrap();
        repo.save(mirrors.clone()).await.unwrap();
        rugs.name = "Area Rugs".to_string();
        repo.save(rugs.clone()).await.unwrap();

        let found = repo.select(&ByIds(vec![rugs.id.clone()])).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Area Rugs");
        assert!(repo.select(&ByIds(vec![])).await.unwrap().is_empty());
    }
}
