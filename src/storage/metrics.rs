//! SQLite-backed metrics storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::database::Database;
use crate::domain::Polarity;
use crate::services::{MetricsError, MetricsResult, MetricsStorage, PolarityCounts};

/// Metrics store over the shared [`Database`] handle.
///
/// Cheap to clone; each call takes the connection lock only for the
/// duration of one statement, so concurrent pipeline tasks never corrupt
/// state even though they share the handle.
#[derive(Debug, Clone)]
pub struct SqliteMetricsStorage {
    db: Database,
}

impl SqliteMetricsStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetricsStorage for SqliteMetricsStorage {
    async fn append(&self, recorded_at: DateTime<Utc>, polarity: Polarity) -> MetricsResult<()> {
        let timestamp = recorded_at.to_rfc3339();
        self.db
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO polarities (recorded_at, polarity) VALUES (?, ?)",
                    [timestamp.as_str(), polarity.as_str()],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| MetricsError::Storage(e.to_string()))
    }

    async fn counts(&self) -> MetricsResult<PolarityCounts> {
        self.db
            .with_conn(|conn| {
                let total: i64 =
                    conn.query_row("SELECT COUNT(*) FROM polarities", [], |row| row.get(0))?;

                let mut counts = PolarityCounts {
                    total: total as u64,
                    ..Default::default()
                };

                let mut stmt = conn
                    .prepare("SELECT polarity, COUNT(polarity) FROM polarities GROUP BY polarity")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;

                for row in rows {
                    let (polarity, count) = row?;
                    match polarity.parse() {
                        Ok(Polarity::Positive) => counts.positive = count as u64,
                        Ok(Polarity::Neutral) => counts.neutral = count as u64,
                        Ok(Polarity::Negative) => counts.negative = count as u64,
                        // Unknown rows still count toward the total.
                        Err(_) => {}
                    }
                }

                Ok(counts)
            })
            .await
            .map_err(|e| MetricsError::Storage(e.to_string()))
    }
}
