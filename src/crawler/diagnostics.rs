use crate::extract::ExtractedRecord;
use std::fmt;

/// Notes accumulated during one adapter run
///
/// Nothing here fails a job by itself; diagnostics explain partial results and
/// are carried next to the records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Item links that could not be extracted
    pub item_failures: Vec<ItemFailure>,

    /// Engines that were tried and produced nothing
    pub engine_failures: Vec<EngineFailure>,

    /// Listing pages whose challenge never cleared
    pub challenge_notes: Vec<String>,

    /// Declared item total that did not match the discovered link count
    pub count_mismatch: Option<CountMismatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFailure {
    pub engine: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountMismatch {
    pub declared: usize,
    pub discovered: usize,
}

impl Diagnostics {
    pub fn record_item_failure(&mut self, url: impl Into<String>, reason: impl Into<String>) {
        self.item_failures.push(ItemFailure {
            url: url.into(),
            reason: reason.into(),
        });
    }

    pub fn record_engine_failure(&mut self, engine: impl Into<String>, reason: impl Into<String>) {
        self.engine_failures.push(EngineFailure {
            engine: engine.into(),
            reason: reason.into(),
        });
    }

    pub fn record_challenge(&mut self, note: impl Into<String>) {
        self.challenge_notes.push(note.into());
    }

    /// Folds the notes of another run into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.item_failures.extend(other.item_failures);
        self.engine_failures.extend(other.engine_failures);
        self.challenge_notes.extend(other.challenge_notes);
        if other.count_mismatch.is_some() {
            self.count_mismatch = other.count_mismatch;
        }
    }

    /// Up to `limit` item failures rendered as `url: reason`, joined with `; `
    pub fn sample_item_failures(&self, limit: usize) -> String {
        self.item_failures
            .iter()
            .take(limit)
            .map(|f| format!("{}: {}", f.url, f.reason))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn is_empty(&self) -> bool {
        self.item_failures.is_empty()
            && self.engine_failures.is_empty()
            && self.challenge_notes.is_empty()
            && self.count_mismatch.is_none()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} item failures, {} engine failures, {} challenge notes",
            self.item_failures.len(),
            self.engine_failures.len(),
            self.challenge_notes.len()
        )?;
        if let Some(mismatch) = self.count_mismatch {
            write!(
                f,
                ", declared {} items but found {}",
                mismatch.declared, mismatch.discovered
            )?;
        }
        Ok(())
    }
}

/// Records produced by an adapter run, with the notes explaining what was skipped
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<ExtractedRecord>,
    pub diagnostics: Diagnostics,
}
