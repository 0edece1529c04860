use rusqlite::params;

use super::*;
use crate::types::{AccountSnapshotRow, SnapshotKind, TicketId};

const SNAPSHOT_COLUMNS: &str = "ticket_id, enterprise_id, account_name, record_type_id,
                                ultimate_parent_name, ultimate_parent_enterprise_id,
                                billing_street, duns_number, gu_duns, gu_name,
                                company_profile, previous_gu_duns, new_gu_duns,
                                previous_gu_name, new_gu_name";

impl ReviewDb {
    // =========================================================================
    // Account snapshots (current / future)
    // =========================================================================

    /// Append a snapshot row. The table is chosen by `kind`.
    pub fn insert_snapshot_row(
        &self,
        kind: SnapshotKind,
        row: &AccountSnapshotRow,
    ) -> Result<(), DbError> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} ({SNAPSHOT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                kind.table()
            ),
            params![
                row.ticket_id.map(|id| id.0),
                row.enterprise_id,
                row.account_name,
                row.record_type_id,
                row.ultimate_parent_name,
                row.ultimate_parent_enterprise_id,
                row.billing_street,
                row.duns_number,
                row.gu_duns,
                row.gu_name,
                row.company_profile,
                row.previous_gu_duns,
                row.new_gu_duns,
                row.previous_gu_name,
                row.new_gu_name,
            ],
        )?;
        Ok(())
    }

    /// Read a whole snapshot in insertion order.
    pub fn get_snapshot(&self, kind: SnapshotKind) -> Result<Vec<AccountSnapshotRow>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM {} ORDER BY rowid",
            kind.table()
        ))?;
        let rows = stmt.query_map([], Self::map_snapshot_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn map_snapshot_row(row: &rusqlite::Row) -> rusqlite::Result<AccountSnapshotRow> {
        Ok(AccountSnapshotRow {
            ticket_id: row.get::<_, Option<i64>>(0)?.map(TicketId),
            enterprise_id: row.get(1)?,
            account_name: row.get(2)?,
            record_type_id: row.get(3)?,
            ultimate_parent_name: row.get(4)?,
            ultimate_parent_enterprise_id: row.get(5)?,
            billing_street: row.get(6)?,
            duns_number: row.get(7)?,
            gu_duns: row.get(8)?,
            gu_name: row.get(9)?,
            company_profile: row.get(10)?,
            previous_gu_duns: row.get(11)?,
            new_gu_duns: row.get(12)?,
            previous_gu_name: row.get(13)?,
            new_gu_name: row.get(14)?,
        })
    }
}
