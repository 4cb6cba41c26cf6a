//! Read-only client for the activity log written by the trading engine.

use crate::error::FloorError;
use crate::types::{LogCategory, LogEntry};
use rusqlite::{params, Connection, OpenFlags};

#[derive(Debug, Clone)]
pub struct LogReader {
    db_path: String,
}

impl LogReader {
    pub fn new(db_path: &str) -> Self {
        Self {
            db_path: db_path.to_string(),
        }
    }

    fn open(&self) -> Result<Connection, FloorError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// The `n` most recent entries for one agent, oldest first.
    pub fn read_tail(&self, name: &str, n: usize) -> Result<Vec<LogEntry>, FloorError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT datetime, type, message FROM logs \
             WHERE name = ?1 ORDER BY datetime DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![name, n as i64], |row| {
            Ok(LogEntry {
                timestamp: row.get(0)?,
                category: LogCategory::parse(&row.get::<_, String>(1)?),
                message: row.get(2)?,
            })
        })?;
        let mut entries: Vec<LogEntry> = rows.flatten().collect();
        entries.reverse();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogCategory;

    fn seeded_db(tag: &str) -> String {
        let path = std::env::temp_dir().join(format!(
            "trading-floor-logs-{tag}-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                datetime DATETIME,
                type TEXT,
                message TEXT
            );",
        )
        .unwrap();
        for (i, (cat, msg)) in [
            ("trace", "round started"),
            ("agent", "considering AAPL"),
            ("function", "get_share_price(AAPL)"),
            ("account", "bought 10 AAPL"),
        ]
        .iter()
        .enumerate()
        {
            conn.execute(
                "INSERT INTO logs (name, datetime, type, message) VALUES (?1, ?2, ?3, ?4)",
                params!["Warren", format!("2025-06-02T10:00:0{i}"), cat, msg],
            )
            .unwrap();
        }
        conn.execute(
            "INSERT INTO logs (name, datetime, type, message) VALUES (?1, ?2, ?3, ?4)",
            params!["Ray", "2025-06-02T10:00:09", "trace", "other trader"],
        )
        .unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn tail_is_chronological_and_scoped_to_one_agent() {
        let path = seeded_db("tail");
        let reader = LogReader::new(&path);
        let entries = reader.read_tail("Warren", 3).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "considering AAPL");
        assert_eq!(entries[2].message, "bought 10 AAPL");
        assert_eq!(entries[2].category, LogCategory::Account);
        assert!(entries.iter().all(|e| e.message != "other trader"));
    }

    #[test]
    fn tail_larger_than_history_returns_everything() {
        let path = seeded_db("short");
        let reader = LogReader::new(&path);
        let entries = reader.read_tail("Warren", 50).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].message, "round started");
    }

    #[test]
    fn missing_database_is_a_collaborator_error() {
        let reader = LogReader::new("/nonexistent/floor.db");
        assert!(reader.read_tail("Warren", 5).is_err());
    }
}
