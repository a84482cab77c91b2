//! SQL schema definitions as const strings.

/// SQL to create the polarities table. Append-only: rows are inserted by
/// the metrics store and aggregated by count, never updated or deleted.
pub const CREATE_POLARITIES: &str = r#"
CREATE TABLE IF NOT EXISTS polarities (
    recorded_at TEXT NOT NULL,
    polarity TEXT NOT NULL
)
"#;

/// SQL to create polarity indexes.
pub const CREATE_POLARITY_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_polarities_polarity ON polarities(polarity)
"#;

/// Returns all migrations in order.
pub fn all_migrations() -> Vec<&'static str> {
    vec![CREATE_POLARITIES, CREATE_POLARITY_INDEXES]
}
