pub mod error;

pub use error::RefDataError;

use flate2::{Decompress, FlushDecompress, Status};
use log::info;
use rusqlite::{Connection, OptionalExtension};

/// Zlib-compressed SQL dump of the reference catalog, baked in at
/// compile time.
const EMBEDDED_CATALOG: &[u8] = include_bytes!("../data/catalog.sql.z");

/// Declared upper bound on the decompressed catalog size. A stream that
/// inflates past this is treated as corrupt.
const EMBEDDED_CATALOG_BOUND: usize = 256 * 1024;

/// One row of the ingredient registry joined against the item catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIngredient {
    /// Identifier used as the save document's section key.
    pub ingredient_id: i64,
    /// The owning item's identifier.
    pub parent_id: i64,
    /// Declared maximum stack capacity.
    pub max_count: i64,
}

/// Read-only relational store over the reference catalog.
///
/// Loaded exactly once per process, before any document operations, and
/// never mutated afterwards. All queries are point lookups or a single
/// join; there are no transactions.
pub struct RefDataset {
    conn: Connection,
}

impl RefDataset {
    /// Decompress the embedded catalog and bulk-load it into an
    /// in-memory store. Failure here is a fatal initialization error for
    /// reconciliation features; currency editing does not depend on it.
    pub fn load_embedded() -> Result<Self, RefDataError> {
        let sql = decompress_catalog(EMBEDDED_CATALOG, EMBEDDED_CATALOG_BOUND)?;
        info!("reference catalog decompressed: {} bytes of SQL", sql.len());
        Self::from_sql(&sql)
    }

    /// Bulk-load dataset-definition statements into a fresh in-memory
    /// store. Used by [`load_embedded`](Self::load_embedded) and by
    /// tests that need a custom catalog.
    pub fn from_sql(sql: &str) -> Result<Self, RefDataError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(sql)?;
        info!("reference catalog loaded");
        Ok(Self { conn })
    }

    /// Declared capacity for an ingredient, looked up by the identifier
    /// stored in save-file ingredient entries.
    pub fn ingredient_capacity(&self, ingredient_id: i64) -> Result<Option<i64>, RefDataError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT MaxCount FROM Items WHERE ItemDataID = ?1")?;
        Ok(stmt
            .query_row([ingredient_id], |row| row.get(0))
            .optional()?)
    }

    /// Declared capacity for a material/inventory item, looked up by its
    /// item identifier.
    pub fn item_capacity(&self, item_id: i64) -> Result<Option<i64>, RefDataError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT MaxCount FROM Items WHERE TID = ?1")?;
        Ok(stmt.query_row([item_id], |row| row.get(0)).optional()?)
    }

    /// Every ingredient the registry knows about, joined against the
    /// item catalog for its parent identifier and capacity.
    pub fn all_ingredients(&self) -> Result<Vec<CatalogIngredient>, RefDataError> {
        let mut stmt = self.conn.prepare(
            "SELECT I.TID, T.TID, T.MaxCount
             FROM Ingredients AS I
             JOIN Items AS T ON I.TID = T.ItemDataID
             ORDER BY I.TID",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CatalogIngredient {
                ingredient_id: row.get(0)?,
                parent_id: row.get(1)?,
                max_count: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Inflate a zlib stream, refusing to grow past `bound` bytes. The
/// stream must run through to its end marker; an input that stops short
/// of it is an error, not a partial result.
fn decompress_catalog(compressed: &[u8], bound: usize) -> Result<String, RefDataError> {
    const CHUNK: usize = 16 * 1024;
    let mut inflater = Decompress::new(true);
    // Capacity stays one byte past the bound so an oversized stream is
    // distinguishable from one that exactly fills it.
    let mut buf: Vec<u8> = Vec::with_capacity(CHUNK.min(bound + 1));
    loop {
        let consumed = inflater.total_in() as usize;
        let status = inflater
            .decompress_vec(&compressed[consumed..], &mut buf, FlushDecompress::Finish)
            .map_err(|e| RefDataError::Decompress(e.to_string()))?;
        if buf.len() > bound {
            return Err(RefDataError::BoundExceeded { bound });
        }
        match status {
            Status::StreamEnd => break,
            // Output space is full: grow and go around again.
            Status::Ok | Status::BufError if buf.len() == buf.capacity() => {
                buf.reserve(CHUNK);
            }
            // Output space remains, so the input ran out before the
            // stream-end marker.
            Status::Ok | Status::BufError => {
                return Err(RefDataError::Decompress(
                    "stream ended before the zlib end marker".to_string(),
                ));
            }
        }
    }
    Ok(String::from_utf8(buf)?)
}
