//! SQLite storage backend for extracted facts

use super::traits::{
    BlockSentiment, DocumentRow, FactStore, OccurrenceRow, OpenStore, StorageError, StorageResult,
    StoreStats,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// SQLite-backed fact store
///
/// One connection serves a whole corpus. The mutex serializes writers; it
/// does not make interleaved documents safe, callers still process one
/// document at a time per store.
pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guid TEXT NOT NULL,
                title TEXT NOT NULL,
                date TEXT NOT NULL,
                pub_date TEXT NOT NULL,
                time_get TEXT NOT NULL,
                response_url TEXT NOT NULL,
                url_key TEXT NOT NULL,
                domain_name TEXT NOT NULL,
                is_financial INTEGER NOT NULL,
                pump_dump_index REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_guid ON documents(guid);

            CREATE TABLE IF NOT EXISTS occurrences (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                start_index INTEGER NOT NULL,
                end_index INTEGER NOT NULL,
                sentence_num INTEGER NOT NULL,
                block_num INTEGER NOT NULL,
                document_id INTEGER NOT NULL,
                instance_uri TEXT NOT NULL,
                FOREIGN KEY (document_id) REFERENCES documents(id)
            );

            CREATE INDEX IF NOT EXISTS idx_occurrences_document ON occurrences(document_id);

            CREATE TABLE IF NOT EXISTS terms (
                occurrence_id INTEGER NOT NULL,
                term TEXT NOT NULL,
                FOREIGN KEY (occurrence_id) REFERENCES occurrences(id)
            );

            CREATE TABLE IF NOT EXISTS sentiment_word_occurrences (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                start_index INTEGER NOT NULL,
                end_index INTEGER NOT NULL,
                sentence_num INTEGER NOT NULL,
                block_num INTEGER NOT NULL,
                document_id INTEGER NOT NULL,
                instance_uri TEXT NOT NULL,
                FOREIGN KEY (document_id) REFERENCES documents(id)
            );

            CREATE INDEX IF NOT EXISTS idx_sentiment_words_document
                ON sentiment_word_occurrences(document_id);

            CREATE TABLE IF NOT EXISTS block_sentiments (
                document_id INTEGER NOT NULL,
                block_num INTEGER NOT NULL,
                positive INTEGER NOT NULL,
                negative INTEGER NOT NULL,
                tokens INTEGER NOT NULL,
                FOREIGN KEY (document_id) REFERENCES documents(id)
            );

            PRAGMA foreign_keys = ON;
            "#,
        )?;
        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StorageResult<T>) -> StorageResult<T> {
        let guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(StorageError::Closed),
        }
    }

    fn insert_occurrence(conn: &Connection, table: &str, row: &OccurrenceRow) -> StorageResult<i64> {
        conn.execute(
            &format!(
                "INSERT INTO {table}
                    (date, start_index, end_index, sentence_num, block_num, document_id, instance_uri)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                row.date,
                row.start as i64,
                row.end as i64,
                row.sentence_num,
                row.block_num,
                row.document_id,
                row.instance_uri,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn select_occurrences(conn: &Connection, table: &str, document_id: i64) -> StorageResult<Vec<OccurrenceRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT date, start_index, end_index, sentence_num, block_num, document_id, instance_uri
             FROM {table} WHERE document_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![document_id], |row| {
                Ok(OccurrenceRow {
                    date: row.get(0)?,
                    start: row.get::<_, i64>(1)? as usize,
                    end: row.get::<_, i64>(2)? as usize,
                    sentence_num: row.get(3)?,
                    block_num: row.get(4)?,
                    document_id: row.get(5)?,
                    instance_uri: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Row counts per table
    pub fn stats(&self) -> StorageResult<StoreStats> {
        self.with_conn(|conn| {
            let count = |table: &str| -> StorageResult<u64> {
                let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
                Ok(n as u64)
            };
            Ok(StoreStats {
                documents: count("documents")?,
                occurrences: count("occurrences")?,
                terms: count("terms")?,
                sentiment_word_occurrences: count("sentiment_word_occurrences")?,
                block_sentiments: count("block_sentiments")?,
            })
        })
    }

    /// Surrogate keys of all rows written for a derived document identity, oldest first
    pub fn document_ids_by_guid(&self, guid: &Uuid) -> StorageResult<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM documents WHERE guid = ?1 ORDER BY id")?;
            let ids = stmt
                .query_map(params![guid.to_string()], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
    }

    /// Load a document row by surrogate key
    pub fn load_document(&self, id: i64) -> StorageResult<Option<DocumentRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT title, date, pub_date, time_get, response_url, url_key, domain_name,
                            is_financial, pump_dump_index, guid
                     FROM documents WHERE id = ?1",
                    params![id],
                    |row| {
                        let guid: String = row.get(9)?;
                        let guid = Uuid::parse_str(&guid).map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
                        })?;
                        Ok(DocumentRow {
                            title: row.get(0)?,
                            date: row.get(1)?,
                            pub_date: row.get(2)?,
                            time_get: row.get(3)?,
                            response_url: row.get(4)?,
                            url_key: row.get(5)?,
                            domain_name: row.get(6)?,
                            is_financial: row.get(7)?,
                            pump_dump_index: row.get(8)?,
                            guid,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Sentiment-object occurrences of a document, in write order
    pub fn occurrences(&self, document_id: i64) -> StorageResult<Vec<OccurrenceRow>> {
        self.with_conn(|conn| Self::select_occurrences(conn, "occurrences", document_id))
    }

    /// Sentiment-word occurrences of a document, in write order
    pub fn sentiment_word_occurrences(&self, document_id: i64) -> StorageResult<Vec<OccurrenceRow>> {
        self.with_conn(|conn| Self::select_occurrences(conn, "sentiment_word_occurrences", document_id))
    }

    /// Terms attached to the sentiment-object occurrences of a document, in write order
    pub fn terms(&self, document_id: i64) -> StorageResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.term FROM terms t
                 JOIN occurrences o ON o.id = t.occurrence_id
                 WHERE o.document_id = ?1 ORDER BY o.id",
            )?;
            let terms = stmt
                .query_map(params![document_id], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(terms)
        })
    }

    /// Block aggregates of a document, ordered by block number
    pub fn block_sentiments(&self, document_id: i64) -> StorageResult<Vec<BlockSentiment>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT document_id, block_num, positive, negative, tokens
                 FROM block_sentiments WHERE document_id = ?1 ORDER BY block_num",
            )?;
            let rows = stmt
                .query_map(params![document_id], |row| {
                    Ok(BlockSentiment {
                        document_id: row.get(0)?,
                        block_num: row.get(1)?,
                        positive: row.get(2)?,
                        negative: row.get(3)?,
                        tokens: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

impl FactStore for SqliteStore {
    fn write_document(&self, row: &DocumentRow) -> StorageResult<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents
                    (guid, title, date, pub_date, time_get, response_url, url_key, domain_name,
                     is_financial, pump_dump_index)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    row.guid.to_string(),
                    row.title,
                    row.date,
                    row.pub_date,
                    row.time_get,
                    row.response_url,
                    row.url_key,
                    row.domain_name,
                    row.is_financial,
                    row.pump_dump_index,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn write_occurrence(&self, row: &OccurrenceRow) -> StorageResult<i64> {
        self.with_conn(|conn| Self::insert_occurrence(conn, "occurrences", row))
    }

    fn write_term(&self, occurrence_id: i64, term: &str) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO terms (occurrence_id, term) VALUES (?1, ?2)",
                params![occurrence_id, term],
            )?;
            Ok(())
        })
    }

    fn write_sentiment_word_occurrence(&self, row: &OccurrenceRow) -> StorageResult<()> {
        self.with_conn(|conn| Self::insert_occurrence(conn, "sentiment_word_occurrences", row).map(|_| ()))
    }

    fn write_block_sentiment(&self, row: &BlockSentiment) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO block_sentiments (document_id, block_num, positive, negative, tokens)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.document_id, row.block_num, row.positive, row.negative, row.tokens],
            )?;
            Ok(())
        })
    }

    fn close(&self) {
        let mut guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(conn) = guard.take() {
            if let Err((_, e)) = conn.close() {
                tracing::debug!(error = %e, "ignoring error while closing store");
            }
        }
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}
