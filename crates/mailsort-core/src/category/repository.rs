//! Category repository for persistent storage of categories and assignments.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use super::model::Assignment;
use crate::classify::{Category, CategorySet};
use crate::error::HostError;
use crate::host::CategoryStore;
use crate::{Error, Result};

/// Repository for category definitions and the categories applied to messages.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS category_keywords (
                category_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                keyword TEXT NOT NULL,
                PRIMARY KEY (category_id, position)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS message_categories (
                message_id TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                score REAL NOT NULL,
                assigned_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Index for listing messages by category
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_message_categories_category
            ON message_categories(category)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a category or replace the keywords of an existing one.
    ///
    /// A replaced category keeps its position in definition order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCategory`] if the name is blank, or an error if
    /// the database operation fails.
    pub async fn save(&self, category: &Category) -> Result<()> {
        if category.name().is_empty() {
            return Err(Error::InvalidCategory("name must not be empty".into()));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO categories (name) VALUES (?)
            ON CONFLICT(name) DO UPDATE SET updated_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(category.name())
        .execute(&mut *tx)
        .await?;

        let id: i64 = sqlx::query("SELECT id FROM categories WHERE name = ?")
            .bind(category.name())
            .fetch_one(&mut *tx)
            .await?
            .get("id");

        sqlx::query("DELETE FROM category_keywords WHERE category_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (position, keyword) in (0_i64..).zip(category.keywords()) {
            sqlx::query(
                r"
                INSERT INTO category_keywords (category_id, position, keyword)
                VALUES (?, ?, ?)
                ",
            )
            .bind(id)
            .bind(position)
            .bind(keyword)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete a category and its keywords.
    ///
    /// Returns `false` if no category had that name. Assignments already
    /// recorded against messages are left in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            DELETE FROM category_keywords
            WHERE category_id IN (SELECT id FROM categories WHERE name = ?)
            ",
        )
        .bind(name)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM categories WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted.rows_affected() > 0)
    }

    /// Get every category, in definition order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn categories(&self) -> Result<CategorySet> {
        let rows = sqlx::query(
            r"
            SELECT c.name, k.keyword
            FROM categories c
            LEFT JOIN category_keywords k ON k.category_id = c.id
            ORDER BY c.id, k.position
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for row in &rows {
            let name: String = row.get("name");
            let keyword: Option<String> = row.get("keyword");

            match grouped.last_mut() {
                Some((last, keywords)) if *last == name => keywords.extend(keyword),
                _ => grouped.push((name, keyword.into_iter().collect())),
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(name, keywords)| Category::new(name, keywords))
            .collect())
    }

    /// Record `category` as the category of a message, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn assign(&self, message_id: &str, category: &str, score: f64) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO message_categories (message_id, category, score, assigned_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(message_id) DO UPDATE SET
                category = excluded.category,
                score = excluded.score,
                assigned_at = excluded.assigned_at
            ",
        )
        .bind(message_id)
        .bind(category)
        .bind(score)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the category recorded for a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_assignment(&self, message_id: &str) -> Result<Option<Assignment>> {
        let row = sqlx::query(
            r"
            SELECT message_id, category, score, assigned_at
            FROM message_categories
            WHERE message_id = ?
            ",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| row_to_assignment(&r)))
    }

    /// Get every assignment to one category, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn assignments_for(&self, category: &str) -> Result<Vec<Assignment>> {
        let rows = sqlx::query(
            r"
            SELECT message_id, category, score, assigned_at
            FROM message_categories
            WHERE category = ?
            ORDER BY assigned_at DESC, message_id
            ",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_assignment).collect())
    }
}

impl CategoryStore for CategoryRepository {
    async fn get_all(&self) -> std::result::Result<CategorySet, HostError> {
        Ok(self.categories().await?)
    }
}

fn row_to_assignment(row: &sqlx::sqlite::SqliteRow) -> Assignment {
    Assignment {
        message_id: row.get("message_id"),
        category: row.get("category"),
        score: row.get("score"),
        assigned_at: row.get("assigned_at"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_list_in_definition_order() {
        let repo = CategoryRepository::in_memory().await.unwrap();

        repo.save(&Category::new("Work", ["standup", "retro"]))
            .await
            .unwrap();
        repo.save(&Category::new("Finance", ["invoice"]))
            .await
            .unwrap();
        repo.save(&Category::new("Empty", Vec::<String>::new()))
            .await
            .unwrap();

        let set = repo.categories().await.unwrap();
        let names: Vec<&str> = set.iter().map(Category::name).collect();
        assert_eq!(names, ["Work", "Finance", "Empty"]);
        assert_eq!(set.get("Work").unwrap().keywords(), ["standup", "retro"]);
        assert!(set.get("Empty").unwrap().keywords().is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_keywords_in_place() {
        let repo = CategoryRepository::in_memory().await.unwrap();

        repo.save(&Category::new("Work", ["standup"])).await.unwrap();
        repo.save(&Category::new("Finance", ["invoice"]))
            .await
            .unwrap();
        repo.save(&Category::new("Work", ["sprint", "retro"]))
            .await
            .unwrap();

        let set = repo.categories().await.unwrap();
        assert_eq!(set.len(), 2);
        let first = set.iter().next().unwrap();
        assert_eq!(first.name(), "Work");
        assert_eq!(first.keywords(), ["sprint", "retro"]);
    }

    #[tokio::test]
    async fn test_save_rejects_blank_name() {
        let repo = CategoryRepository::in_memory().await.unwrap();

        let result = repo.save(&Category::new("   ", ["x"])).await;
        assert!(matches!(result, Err(Error::InvalidCategory(_))));
    }

    #[tokio::test]
    async fn test_delete_category() {
        let repo = CategoryRepository::in_memory().await.unwrap();
        repo.save(&Category::new("Work", ["standup"])).await.unwrap();

        assert!(repo.delete("Work").await.unwrap());
        assert!(!repo.delete("Work").await.unwrap());
        assert!(repo.categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assign_replaces_previous_assignment() {
        let repo = CategoryRepository::in_memory().await.unwrap();

        repo.assign("msg-1", "Work", 12.5).await.unwrap();
        repo.assign("msg-1", "Finance", 20.0).await.unwrap();

        let assignment = repo.get_assignment("msg-1").await.unwrap().unwrap();
        assert_eq!(assignment.category, "Finance");
        assert_eq!(assignment.score, 20.0);
        assert!(repo.get_assignment("msg-2").await.unwrap().is_none());

        assert!(repo.assignments_for("Work").await.unwrap().is_empty());
        assert_eq!(repo.assignments_for("Finance").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_category_store_snapshot() {
        let repo = CategoryRepository::in_memory().await.unwrap();
        repo.save(&Category::new("Finance", ["invoice"]))
            .await
            .unwrap();

        let snapshot = CategoryStore::get_all(&repo).await.unwrap();
        assert_eq!(snapshot.len(), 1);
    }
}
