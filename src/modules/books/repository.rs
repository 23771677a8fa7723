//! Persistence for the `books` table.
//!
//! Every operation takes a connection checked out by the caller. Write paths
//! validate their input before any statement runs.

use sqlx::{Connection, FromRow, SqliteConnection};

use super::error::{BookError, BookResult};
use super::models::{Book, CreateBook, UpdateBook};

const SELECT_BOOK: &str = "SELECT id, title, author, status, genre, notes FROM books";

/// Column mapping for one `books` row; `status` is kept as stored text.
#[derive(Debug, FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
    status: String,
    genre: Option<String>,
    notes: Option<String>,
}

impl TryFrom<BookRow> for Book {
    type Error = BookError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|source| BookError::InvalidData {
            id: row.id,
            source,
        })?;

        Ok(Book {
            id: row.id,
            title: row.title,
            author: row.author,
            status,
            genre: row.genre,
            notes: row.notes,
        })
    }
}

/// Insert a new book and return it with its generated id.
pub async fn create(conn: &mut SqliteConnection, input: CreateBook) -> BookResult<Book> {
    input.validate()?;

    let row: BookRow = sqlx::query_as(
        "INSERT INTO books (title, author, status, genre, notes)
         VALUES (?, ?, ?, ?, ?)
         RETURNING id, title, author, status, genre, notes",
    )
    .bind(&input.title)
    .bind(&input.author)
    .bind(input.status.as_str())
    .bind(&input.genre)
    .bind(&input.notes)
    .fetch_one(conn)
    .await?;

    tracing::info!(book_id = row.id, "book created");
    row.try_into()
}

/// Books in insertion order, skipping `skip` and returning at most `limit`.
pub async fn list(conn: &mut SqliteConnection, skip: u32, limit: u32) -> BookResult<Vec<Book>> {
    let sql = format!("{SELECT_BOOK} ORDER BY id LIMIT ? OFFSET ?");
    let rows: Vec<BookRow> = sqlx::query_as(&sql)
        .bind(i64::from(limit))
        .bind(i64::from(skip))
        .fetch_all(conn)
        .await?;

    rows.into_iter().map(Book::try_from).collect()
}

/// Fetch one book; `None` when no row has this id.
pub async fn get(conn: &mut SqliteConnection, id: i64) -> BookResult<Option<Book>> {
    let sql = format!("{SELECT_BOOK} WHERE id = ?");
    let row: Option<BookRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    row.map(Book::try_from).transpose()
}

/// Apply the set fields of `input` to book `id` in one transaction.
///
/// Returns `None` without writing when the book does not exist.
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    input: UpdateBook,
) -> BookResult<Option<Book>> {
    input.validate()?;

    let mut tx = conn.begin().await?;

    let Some(mut book) = get(&mut tx, id).await? else {
        return Ok(None);
    };

    if input.is_empty() {
        return Ok(Some(book));
    }

    input.apply_to(&mut book);

    sqlx::query(
        "UPDATE books
         SET title = ?, author = ?, status = ?, genre = ?, notes = ?
         WHERE id = ?",
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(book.status.as_str())
    .bind(&book.genre)
    .bind(&book.notes)
    .bind(book.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(book_id = book.id, "book updated");
    Ok(Some(book))
}

/// Remove book `id`; `false` when it did not exist.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> BookResult<bool> {
    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::info!(book_id = id, "book deleted");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::{Patch, ReadingStatus};
    use crate::modules::books::BooksModule;
    use shelf_db::{Database, DbConfig};
    use shelf_kernel::Module;

    async fn test_db() -> Database {
        let db = Database::connect(&DbConfig::new("sqlite::memory:"))
            .await
            .unwrap();
        let migrations: Vec<_> = BooksModule::new()
            .migrations()
            .into_iter()
            .map(|m| ("books".to_string(), m))
            .collect();
        db.run_migrations(&migrations).await.unwrap();
        db
    }

    async fn count(conn: &mut SqliteConnection) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(conn)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_returns_input_with_fresh_ids() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();

        let mut input = CreateBook::new("Dune", "Herbert");
        input.genre = Some("sci-fi".to_string());
        input.status = ReadingStatus::Reading;

        let first = create(&mut conn, input.clone()).await.unwrap();
        let second = create(&mut conn, CreateBook::new("Emma", "Austen"))
            .await
            .unwrap();

        assert_eq!(first.title, input.title);
        assert_eq!(first.author, input.author);
        assert_eq!(first.status, ReadingStatus::Reading);
        assert_eq!(first.genre, input.genre);
        assert_eq!(first.notes, None);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn get_after_create_matches() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();

        let created = create(&mut conn, CreateBook::new("Dune", "Herbert"))
            .await
            .unwrap();
        let fetched = get(&mut conn, created.id).await.unwrap();

        assert_eq!(fetched, Some(created));
        assert_eq!(get(&mut conn, 999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_create_inserts_nothing() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();

        let err = create(&mut conn, CreateBook::new("", "Herbert"))
            .await
            .unwrap_err();

        assert!(matches!(err, BookError::Validation(_)));
        assert_eq!(count(&mut conn).await, 0);
    }

    #[tokio::test]
    async fn list_on_empty_table_is_empty() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();

        assert!(list(&mut conn, 0, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_applies_skip_and_limit_in_insertion_order() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();

        for title in ["A", "B", "C", "D"] {
            create(&mut conn, CreateBook::new(title, "Anon"))
                .await
                .unwrap();
        }

        let titles: Vec<String> = list(&mut conn, 1, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["B", "C"]);

        assert!(list(&mut conn, 10, 100).await.unwrap().is_empty());
        assert!(list(&mut conn, 0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_update_leaves_other_fields() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();

        let mut input = CreateBook::new("Dune", "Herbert");
        input.genre = Some("sci-fi".to_string());
        input.notes = Some("gift".to_string());
        let created = create(&mut conn, input).await.unwrap();

        let update = UpdateBook {
            status: Patch::Value(ReadingStatus::Reading),
            ..UpdateBook::default()
        };
        let updated = update_existing(&mut conn, created.id, update).await.unwrap();

        assert_eq!(
            updated,
            Book {
                status: ReadingStatus::Reading,
                ..created.clone()
            }
        );
        assert_eq!(get(&mut conn, created.id).await.unwrap(), Some(updated));
    }

    async fn update_existing(
        conn: &mut SqliteConnection,
        id: i64,
        input: UpdateBook,
    ) -> BookResult<Book> {
        Ok(update(conn, id, input).await?.expect("book exists"))
    }

    #[tokio::test]
    async fn update_missing_book_is_none() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();

        let update_input = UpdateBook {
            title: Patch::Value("Ghost".to_string()),
            ..UpdateBook::default()
        };
        assert_eq!(update(&mut conn, 42, update_input).await.unwrap(), None);
        assert_eq!(count(&mut conn).await, 0);
    }

    #[tokio::test]
    async fn invalid_update_writes_nothing() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();
        let created = create(&mut conn, CreateBook::new("Dune", "Herbert"))
            .await
            .unwrap();

        let update_input = UpdateBook {
            title: Patch::Value(String::new()),
            status: Patch::Value(ReadingStatus::Completed),
            ..UpdateBook::default()
        };
        let err = update(&mut conn, created.id, update_input)
            .await
            .unwrap_err();

        assert!(matches!(err, BookError::Validation(_)));
        assert_eq!(get(&mut conn, created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn null_clears_genre() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();
        let mut input = CreateBook::new("Dune", "Herbert");
        input.genre = Some("sci-fi".to_string());
        let created = create(&mut conn, input).await.unwrap();

        let update_input = UpdateBook {
            genre: Patch::Null,
            ..UpdateBook::default()
        };
        let updated = update_existing(&mut conn, created.id, update_input)
            .await
            .unwrap();

        assert_eq!(updated.genre, None);
        assert_eq!(updated.title, "Dune");
    }

    #[tokio::test]
    async fn delete_then_get_is_absent() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();
        let created = create(&mut conn, CreateBook::new("Dune", "Herbert"))
            .await
            .unwrap();

        assert!(delete(&mut conn, created.id).await.unwrap());
        assert_eq!(get(&mut conn, created.id).await.unwrap(), None);
        assert!(!delete(&mut conn, created.id).await.unwrap());
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();

        let first = create(&mut conn, CreateBook::new("Dune", "Herbert"))
            .await
            .unwrap();
        delete(&mut conn, first.id).await.unwrap();
        let second = create(&mut conn, CreateBook::new("Emma", "Austen"))
            .await
            .unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn nul_characters_count_toward_bounds_only_once() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();

        let created = create(&mut conn, CreateBook::new("\0", "Herbert"))
            .await
            .unwrap();
        assert_eq!(created.title, "\0");
        assert_eq!(get(&mut conn, created.id).await.unwrap(), Some(created));

        let err = create(&mut conn, CreateBook::new("\0".repeat(201), "Herbert"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_stored_status_is_rejected() {
        let db = test_db().await;
        let mut conn = db.acquire().await.unwrap();
        let created = create(&mut conn, CreateBook::new("Dune", "Herbert"))
            .await
            .unwrap();

        // Bypass the CHECK constraint to simulate a row written by another tool.
        sqlx::query("PRAGMA ignore_check_constraints = ON")
            .execute(&mut *conn)
            .await
            .unwrap();
        sqlx::query("UPDATE books SET status = 'shelved' WHERE id = ?")
            .bind(created.id)
            .execute(&mut *conn)
            .await
            .unwrap();

        let err = get(&mut conn, created.id).await.unwrap_err();
        assert!(matches!(err, BookError::InvalidData { .. }));
    }
}
