use std::fmt;

use stk_model::{BackoffAlgorithm, BackoffOptions};

use super::upper_bound_delay;

/// Render milliseconds as `HH:MM:SS.mm`.
///
/// Hours are not wrapped, and every field is zero-padded to at least two digits,
/// so sub-100ms values keep two digits (`50` ms renders as `.50`).
///
/// ```rust
/// use stk_core::backoff::ms_to_time;
///
/// assert_eq!(ms_to_time(50), "00:00:00.50");
/// assert_eq!(ms_to_time(12_600_000), "03:30:00.00");
/// ```
pub fn ms_to_time(ms: u64) -> String {
    let millis = ms % 1_000;
    let seconds = (ms / 1_000) % 60;
    let minutes = (ms / 60_000) % 60;
    let hours = ms / 3_600_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:02}")
}

/// Per-attempt upper-bound delays of every algorithm for one set of options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelayTable {
    rows: Vec<[u64; 4]>,
}

impl DelayTable {
    /// Worst-case delays: the deterministic upper bound for each algorithm and attempt.
    pub fn worst_case(opts: &BackoffOptions) -> Self {
        let rows = (1..=opts.max_attempts)
            .map(|attempt| {
                BackoffAlgorithm::ALL.map(|algo| {
                    upper_bound_delay(algo, opts.base_delay_ms, attempt, opts.max_delay_ms)
                })
            })
            .collect();
        Self { rows }
    }

    /// Delay of `algorithm` before 1-based `attempt`.
    pub fn delay(&self, algorithm: BackoffAlgorithm, attempt: u32) -> Option<u64> {
        let column = BackoffAlgorithm::ALL.iter().position(|a| *a == algorithm)?;
        let row = self.rows.get(attempt.checked_sub(1)? as usize)?;
        Some(row[column])
    }

    /// Sum of all delays of `algorithm`.
    pub fn total(&self, algorithm: BackoffAlgorithm) -> u64 {
        let Some(column) = BackoffAlgorithm::ALL.iter().position(|a| *a == algorithm) else {
            return 0;
        };
        self.rows
            .iter()
            .fold(0u64, |acc, row| acc.saturating_add(row[column]))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for DelayTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 4]> = self
            .rows
            .iter()
            .map(|row| row.map(ms_to_time))
            .collect();

        let mut widths = BackoffAlgorithm::ALL.map(|a| a.as_str().len());
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }

        write!(f, "{:>7}", "attempt")?;
        for (algo, w) in BackoffAlgorithm::ALL.iter().zip(widths) {
            write!(f, " | {:>w$}", algo.as_str())?;
        }
        writeln!(f)?;

        for (i, row) in cells.iter().enumerate() {
            write!(f, "{:>7}", i + 1)?;
            for (cell, w) in row.iter().zip(widths) {
                write!(f, " | {cell:>w$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
