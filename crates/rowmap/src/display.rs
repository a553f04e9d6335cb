//! Plain-text rendering of mapped records for debugging.

use std::fmt;

/// Width of every column except the last.
pub const COLUMN_WIDTH: usize = 25;

/// Records that can list their fields as ordered `(name, text)` pairs.
pub trait Tabulate {
    fn fields(&self) -> Vec<(String, String)>;
}

impl<T: Tabulate + ?Sized> Tabulate for &T {
    fn fields(&self) -> Vec<(String, String)> {
        (**self).fields()
    }
}

/// Render records as a block of fixed-width lines.
///
/// The field count comes from the first record. Output starts with a rule of
/// underscores, then one `|-> (...)` line per record. Every field but the
/// last is padded or cut to [`COLUMN_WIDTH`] characters.
pub fn render_records<T: Tabulate>(records: &[T]) -> String {
    RecordTable::new(records).to_string()
}

/// [`fmt::Display`] adapter producing the same output as [`render_records`].
pub struct RecordTable<'a, T> {
    records: &'a [T],
}

impl<'a, T: Tabulate> RecordTable<'a, T> {
    pub fn new(records: &'a [T]) -> Self {
        Self { records }
    }
}

impl<T: Tabulate> fmt::Display for RecordTable<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.records.first() else {
            return Ok(());
        };
        let width = first.fields().len();
        writeln!(f, "{}", "_".repeat(20 * width + 10))?;

        for (index, record) in self.records.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            f.write_str("|-> (")?;
            let fields = record.fields();
            let shown = fields.len().min(width);
            for (position, (_, text)) in fields.iter().take(shown).enumerate() {
                if position + 1 < width {
                    write!(f, "{}", fixed_width(text))?;
                } else {
                    f.write_str(text)?;
                }
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

fn fixed_width(text: &str) -> String {
    let cut: String = text.chars().take(COLUMN_WIDTH).collect();
    format!("{cut:<width$}", width = COLUMN_WIDTH)
}
