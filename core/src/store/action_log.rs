//! Store methods for the resolved-action log.

use super::SimStore;
use crate::{error::SimResult, queue::ResultMap, types::Tick};
use rusqlite::params;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogRow {
    pub tick:      Tick,
    pub seq:       u64,
    pub entity_id: String,
    pub verb:      String,
    pub slot:      String,
    pub code:      i32,
}

impl SimStore {
    /// Persist every resolved action of one tick.
    pub fn insert_results(&self, run_id: &str, results: &ResultMap) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO action_log (run_id, tick, seq, entity_id, verb, slot, code)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for r in &results.resolved {
                let slot = match r.slot {
                    crate::action::ActionSlot::Primary   => "primary",
                    crate::action::ActionSlot::Secondary => "secondary",
                };
                stmt.execute(params![
                    run_id,
                    results.tick as i64,
                    r.seq as i64,
                    r.entity_id,
                    r.verb.name(),
                    slot,
                    r.code.code(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn actions_for_entity(&self, run_id: &str, entity_id: &str) -> SimResult<Vec<ActionLogRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT tick, seq, entity_id, verb, slot, code FROM action_log
             WHERE run_id = ?1 AND entity_id = ?2
             ORDER BY tick ASC, seq ASC",
        )?;
        let rows = stmt.query_map(params![run_id, entity_id], |row| {
            Ok(ActionLogRow {
                tick:      row.get::<_, i64>(0)? as u64,
                seq:       row.get::<_, i64>(1)? as u64,
                entity_id: row.get(2)?,
                verb:      row.get(3)?,
                slot:      row.get(4)?,
                code:      row.get(5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count of resolved actions with the given code (for summaries and tests).
    pub fn action_count_with_code(&self, run_id: &str, code: i32) -> SimResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE run_id = ?1 AND code = ?2",
            params![run_id, code],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
