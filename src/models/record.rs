//! Map records and the ledger that persists them.
//!
//! On disk a ledger is one `name<TAB>best_time<TAB>rank` line per map.

use std::collections::HashMap;

/// Placeholder best time for a map that is known to be cleared but whose
/// time has not been fetched yet.
pub const UNKNOWN_TIME: &str = "N/A";

/// A map row read off the player's profile table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRecord {
    /// Map display name, the ledger key
    pub name: String,

    /// Remote map id, only meaningful while crawling
    pub uid: String,

    /// The player's position on that map at enumeration time
    pub rank: String,
}

impl MapRecord {
    pub fn new(name: impl Into<String>, uid: impl Into<String>, rank: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: uid.into(),
            rank: rank.into(),
        }
    }
}

/// Persisted best time and rank for one map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub best_time: String,
    pub rank: String,
}

impl LedgerEntry {
    pub fn new(best_time: impl Into<String>, rank: impl Into<String>) -> Self {
        Self {
            best_time: best_time.into(),
            rank: rank.into(),
        }
    }

    /// Whether the best time is still the placeholder.
    pub fn is_unresolved(&self) -> bool {
        self.best_time == UNKNOWN_TIME
    }
}

/// Keyed-by-name record set that remembers insertion order.
///
/// Overwriting an existing name keeps its original position, so a ledger
/// rewritten after a no-op sync is byte-identical to the one read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    names: Vec<String>,
    entries: HashMap<String, LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the tab-separated ledger format.
    ///
    /// Lines without exactly three fields are skipped.
    pub fn parse(text: &str) -> Self {
        Self::parse_counting(text).0
    }

    /// Like [`parse`](Self::parse), also returning how many non-blank
    /// lines were skipped.
    pub fn parse_counting(text: &str) -> (Self, usize) {
        let mut ledger = Self::new();
        let mut skipped = 0;
        for line in text.lines() {
            let fields: Vec<&str> = line.trim().split('\t').collect();
            if let [name, best_time, rank] = fields.as_slice() {
                ledger.insert(*name, LedgerEntry::new(*best_time, *rank));
            } else if !line.trim().is_empty() {
                log::debug!("Skipping malformed ledger line: {line:?}");
                skipped += 1;
            }
        }
        (ledger, skipped)
    }

    /// Serialize to the tab-separated ledger format, one line per entry.
    ///
    /// Tabs and line breaks inside a field become spaces so every entry
    /// stays on one three-field line.
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for (name, entry) in self.iter() {
            push_field(&mut out, name);
            out.push('\t');
            push_field(&mut out, &entry.best_time);
            out.push('\t');
            push_field(&mut out, &entry.rank);
            out.push('\n');
        }
        out
    }

    /// Insert or overwrite the entry for `name`.
    pub fn insert(&mut self, name: impl Into<String>, entry: LedgerEntry) {
        let name = name.into();
        if !self.entries.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.entries.insert(name, entry);
    }

    pub fn get(&self, name: &str) -> Option<&LedgerEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of maps in the ledger, which is also the clear count.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LedgerEntry)> {
        self.names
            .iter()
            .filter_map(|name| self.entries.get(name).map(|e| (name.as_str(), e)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Whether a freshly enumerated row needs its best time fetched again.
    ///
    /// A row is current only if the map is already present with the same
    /// rank and a resolved time.
    pub fn needs_fetch(&self, record: &MapRecord) -> bool {
        match self.entries.get(&record.name) {
            None => true,
            Some(entry) => entry.rank != record.rank || entry.is_unresolved(),
        }
    }

    /// Filter enumerated rows down to merge candidates, keeping row order.
    pub fn merge_candidates(&self, incoming: Vec<MapRecord>) -> Vec<MapRecord> {
        incoming
            .into_iter()
            .filter(|record| self.needs_fetch(record))
            .collect()
    }

    /// Copy of this ledger with `updates` written over it in order.
    ///
    /// Later updates for the same name win; untouched names keep their values.
    pub fn merged<I>(&self, updates: I) -> Ledger
    where
        I: IntoIterator<Item = (String, LedgerEntry)>,
    {
        let mut merged = self.clone();
        for (name, entry) in updates {
            merged.insert(name, entry);
        }
        merged
    }
}

fn push_field(out: &mut String, field: &str) {
    out.extend(
        field
            .chars()
            .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c }),
    );
}

impl FromIterator<(String, LedgerEntry)> for Ledger {
    fn from_iter<T: IntoIterator<Item = (String, LedgerEntry)>>(iter: T) -> Self {
        Ledger::new().merged(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Ledger {
        Ledger::parse("Map A\t12.345\t3\nMap B\tN/A\t7\nMap C\t45.100\t1\n")
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let ledger = Ledger::parse("Map A\t12.345\t3\nbroken line\tonly two\nMap B\t9.000\t1\n");
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("Map A"));
        assert!(ledger.contains("Map B"));
    }

    #[test]
    fn test_parse_ignores_blank_lines_and_crlf() {
        let ledger = Ledger::parse("Map A\t12.345\t3\r\n\r\nMap B\t9.000\t1");
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get("Map A").unwrap().rank, "3");
    }

    #[test]
    fn test_duplicate_names_collapse_to_last() {
        let ledger = Ledger::parse("Map A\t12.345\t3\nMap B\t1.000\t2\nMap A\t11.000\t2\n");
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get("Map A").unwrap().best_time, "11.000");
        assert_eq!(ledger.names().collect::<Vec<_>>(), vec!["Map A", "Map B"]);
    }

    #[test]
    fn test_tsv_preserves_input_bytes() {
        let text = "Map A\t12.345\t3\nMap B\tN/A\t7\nMap C\t45.100\t1\n";
        assert_eq!(Ledger::parse(text).to_tsv(), text);
    }

    #[test]
    fn test_tsv_flattens_control_whitespace() {
        let mut ledger = Ledger::new();
        ledger.insert("Map\tA\nB", LedgerEntry::new("12.345", "3\r\n"));

        let text = ledger.to_tsv();
        assert_eq!(text, "Map A B\t12.345\t3  \n");
        assert_eq!(Ledger::parse(&text).len(), 1);
    }

    #[test]
    fn test_parse_counting_reports_two_field_lines() {
        let (ledger, skipped) = Ledger::parse_counting("Map A\t3\nMap B\t5\n\n");
        assert!(ledger.is_empty());
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_needs_fetch_rule() {
        let ledger = sample();

        // Current: same rank, resolved time
        assert!(!ledger.needs_fetch(&MapRecord::new("Map A", "u1", "3")));
        // Rank moved
        assert!(ledger.needs_fetch(&MapRecord::new("Map A", "u1", "2")));
        // Time never fetched
        assert!(ledger.needs_fetch(&MapRecord::new("Map B", "u2", "7")));
        // New map
        assert!(ledger.needs_fetch(&MapRecord::new("Map D", "u4", "9")));
    }

    #[test]
    fn test_merge_candidates_keep_row_order() {
        let ledger = sample();
        let incoming = vec![
            MapRecord::new("Map D", "u4", "9"),
            MapRecord::new("Map A", "u1", "3"),
            MapRecord::new("Map B", "u2", "7"),
        ];
        let names: Vec<String> = ledger
            .merge_candidates(incoming)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Map D", "Map B"]);
    }

    #[test]
    fn test_merged_overwrites_and_appends() {
        let ledger = sample();
        let merged = ledger.merged(vec![
            ("Map B".to_string(), LedgerEntry::new("20.500", "6")),
            ("Map D".to_string(), LedgerEntry::new("N/A", "9")),
        ]);

        assert_eq!(ledger.get("Map B").unwrap().best_time, "N/A");
        assert_eq!(merged.get("Map B").unwrap(), &LedgerEntry::new("20.500", "6"));
        assert_eq!(merged.get("Map A").unwrap().best_time, "12.345");
        assert_eq!(
            merged.names().collect::<Vec<_>>(),
            vec!["Map A", "Map B", "Map C", "Map D"]
        );
    }
}
