//! Store methods for per-entity memory records.

use super::SimStore;
use crate::{error::SimResult, types::Tick};
use rusqlite::params;

impl SimStore {
    /// All memory rows of a run as (namespace, name, JSON document).
    pub fn memory_rows(&self, run_id: &str) -> SimResult<Vec<(String, String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT namespace, name, doc FROM memory
             WHERE run_id = ?1
             ORDER BY namespace ASC, name ASC",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Replace every memory row of a run in one transaction.
    pub fn replace_memory(
        &self,
        run_id: &str,
        tick:   Tick,
        rows:   &[(&str, &str, String)],
    ) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM memory WHERE run_id = ?1", params![run_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO memory (run_id, namespace, name, doc, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (namespace, name, doc) in rows {
                stmt.execute(params![run_id, namespace, name, doc, tick as i64])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ── Test / summary helpers ────────────────────────────────────────

    pub fn memory_record_count(&self, run_id: &str, namespace: &str) -> SimResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM memory WHERE run_id = ?1 AND namespace = ?2",
            params![run_id, namespace],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
