//! Data models for listing rows, spec tables and harvest batches.

/// Summary fields read from one listing row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSummary {
    /// Model name as shown in the listing
    pub model: Option<String>,
    /// Release date text
    pub released_date: Option<String>,
    /// Price before discount
    pub full_price: Option<String>,
    /// Price after discount
    pub discounted_price: Option<String>,
}

impl ItemSummary {
    /// Column names, in output order.
    pub const COLUMNS: [&'static str; 4] =
        ["model", "released_date", "full_price", "discounted_price"];

    /// Field values in the same order as [`Self::COLUMNS`].
    pub fn values(&self) -> [Option<&str>; 4] {
        [
            self.model.as_deref(),
            self.released_date.as_deref(),
            self.full_price.as_deref(),
            self.discounted_price.as_deref(),
        ]
    }

    /// Returns true if every field was found on the row.
    pub fn is_complete(&self) -> bool {
        self.values().iter().all(Option::is_some)
    }
}

/// A listing row as parsed from its HTML: summary plus detail link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub summary: ItemSummary,
    pub detail_url: Option<String>,
}

/// Label/value pairs from a detail page.
///
/// Labels keep the position of their first appearance; a repeated label
/// overwrites the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecTable {
    entries: Vec<(String, String)>,
}

impl SpecTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair, replacing the value of an existing label in place.
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.iter().find(|(l, _)| l == label).map(|(_, v)| v.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<L: Into<String>, V: Into<String>> FromIterator<(L, V)> for SpecTable {
    fn from_iter<I: IntoIterator<Item = (L, V)>>(iter: I) -> Self {
        let mut table = SpecTable::new();
        for (label, value) in iter {
            table.insert(label, value);
        }
        table
    }
}

/// One harvested listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub summary: ItemSummary,
    pub detail_url: Option<String>,
    /// None when every detail attempt failed
    pub specs: Option<SpecTable>,
}

impl ItemRecord {
    /// True when the summary is fully populated and the specs were scraped.
    pub fn is_complete(&self) -> bool {
        self.summary.is_complete() && self.specs.is_some()
    }
}

/// Rows that appeared during one pagination round, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub records: Vec<ItemRecord>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ItemRecord) {
        self.records.push(record);
    }

    /// Number of summary records (one per new listing row).
    pub fn summary_count(&self) -> usize {
        self.records.len()
    }

    /// Number of rows whose detail table was scraped.
    pub fn detail_count(&self) -> usize {
        self.records.iter().filter(|r| r.specs.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(model: &str) -> ItemSummary {
        ItemSummary {
            model: Some(model.to_string()),
            released_date: Some("Released 1st March 2024".to_string()),
            full_price: Some("Rs. 24,999".to_string()),
            discounted_price: Some("Rs. 21,999".to_string()),
        }
    }

    #[test]
    fn test_summary_values_order() {
        let s = summary("Galaxy A55");
        assert_eq!(s.values()[0], Some("Galaxy A55"));
        assert_eq!(s.values()[3], Some("Rs. 21,999"));
        assert_eq!(ItemSummary::COLUMNS[3], "discounted_price");
    }

    #[test]
    fn test_summary_completeness() {
        assert!(summary("Pixel 8").is_complete());

        let partial = ItemSummary { full_price: None, ..summary("Pixel 8") };
        assert!(!partial.is_complete());
        assert!(!ItemSummary::default().is_complete());
    }

    #[test]
    fn test_spec_table_overwrites_in_place() {
        let mut specs = SpecTable::new();
        specs.insert("RAM", "8GB");
        specs.insert("Battery", "5000mAh");
        specs.insert("RAM", "12GB");

        assert_eq!(specs.len(), 2);
        assert_eq!(specs.get("RAM"), Some("12GB"));
        assert_eq!(specs.labels().collect::<Vec<_>>(), vec!["RAM", "Battery"]);
    }

    #[test]
    fn test_spec_table_from_iter() {
        let specs: SpecTable = vec![("OS", "Android"), ("OS", "Android 14")].into_iter().collect();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs.get("OS"), Some("Android 14"));
        assert!(specs.get("Weight").is_none());
    }

    #[test]
    fn test_record_completeness() {
        let mut record = ItemRecord {
            summary: summary("Nord 4"),
            detail_url: Some("https://example.com/nord-4".to_string()),
            specs: None,
        };
        assert!(!record.is_complete());

        record.specs = Some(SpecTable::new());
        assert!(record.is_complete());
    }

    #[test]
    fn test_batch_counts() {
        let mut batch = Batch::new();
        assert!(batch.is_empty());

        batch.push(ItemRecord { summary: summary("a"), detail_url: None, specs: None });
        batch.push(ItemRecord {
            summary: summary("b"),
            detail_url: None,
            specs: Some(SpecTable::new()),
        });

        assert_eq!(batch.summary_count(), 2);
        assert_eq!(batch.detail_count(), 1);
    }
}
