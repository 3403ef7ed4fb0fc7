//! Sort-merge differ.
//!
//! Neither listing arrives sorted — the encryption wrapper maps the inner
//! store's key order into arbitrary plaintext order — so both sides are
//! materialized, sorted by path, and walked with two cursors. The sort uses
//! plain byte-wise `str` ordering: the merge only needs one total,
//! deterministic order shared by both sides, and byte order is both.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::vec::IntoIter;

use permafrost_store::Entry;

/// One unit of work for the driver. `Add`/`Update` carry the source entry,
/// `Delete` the target entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Add(Entry),
    Update(Entry),
    Delete(Entry),
}

impl Action {
    pub fn path(&self) -> &str {
        match self {
            Action::Add(e) | Action::Update(e) | Action::Delete(e) => &e.path,
        }
    }
}

/// Reconciles two listings into an ordered action stream.
pub fn diff(mut source: Vec<Entry>, mut target: Vec<Entry>) -> DiffStream {
    source.sort_by(|a, b| a.path.cmp(&b.path));
    target.sort_by(|a, b| a.path.cmp(&b.path));
    DiffStream {
        source: source.into_iter().peekable(),
        target: target.into_iter().peekable(),
    }
}

/// Lazy merge of two sorted listings.
pub struct DiffStream {
    source: Peekable<IntoIter<Entry>>,
    target: Peekable<IntoIter<Entry>>,
}

impl Iterator for DiffStream {
    type Item = Action;

    fn next(&mut self) -> Option<Action> {
        loop {
            let ord = match (self.source.peek(), self.target.peek()) {
                (None, None) => return None,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(s), Some(t)) => s.path.cmp(&t.path),
            };
            match ord {
                Ordering::Less => return self.source.next().map(Action::Add),
                Ordering::Greater => return self.target.next().map(Action::Delete),
                Ordering::Equal => {
                    let src = self.source.next()?;
                    let tgt = self.target.next()?;
                    // Asymmetric on purpose: a target store may report
                    // slightly later mtimes than the source filesystem, and
                    // that must not trigger endless rewrites.
                    if src.size != tgt.size || src.mtime_ms - tgt.mtime_ms >= 1 {
                        return Some(Action::Update(src));
                    }
                }
            }
        }
    }
}
