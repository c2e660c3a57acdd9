use std::{cmp::Ordering, fmt, str::FromStr};

use serde::Deserialize;

use super::purchase_record::PurchaseRecord;

/// Strategy used to decide which purchase record in a receipt is the most
/// recent one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOrdering {
    /// Byte-wise comparison of the transaction id strings.
    ///
    /// Transaction ids are numeric strings of varying width, so this is only
    /// correct when widths are equal: `"20"` sorts above `"100"`. Kept as the
    /// default for compatibility with existing ledgers.
    #[default]
    Lexicographic,
    /// Compares transaction ids as unsigned integers. Numeric ids sort above
    /// non-numeric ones, and two non-numeric ids compare lexicographically.
    Numeric,
    /// Compares purchase timestamps, breaking ties numerically. Records
    /// without a purchase date sort lowest.
    PurchaseDate,
}

impl TransactionOrdering {
    pub fn compare(&self, a: &PurchaseRecord, b: &PurchaseRecord) -> Ordering {
        match self {
            Self::Lexicographic => a.transaction_id.cmp(&b.transaction_id),
            Self::Numeric => compare_numeric(&a.transaction_id, &b.transaction_id),
            Self::PurchaseDate => a
                .purchase_date
                .cmp(&b.purchase_date)
                .then_with(|| compare_numeric(&a.transaction_id, &b.transaction_id)),
        }
    }

    /// Returns the greatest record under this ordering. On ties the record
    /// seen first wins.
    pub fn select_latest<'a>(&self, records: &'a [PurchaseRecord]) -> Option<&'a PurchaseRecord> {
        records.iter().fold(None, |latest, record| match latest {
            Some(current) if self.compare(record, current) != Ordering::Greater => Some(current),
            _ => Some(record),
        })
    }
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    match (a.parse::<u128>(), b.parse::<u128>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl FromStr for TransactionOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexicographic" => Ok(Self::Lexicographic),
            "numeric" => Ok(Self::Numeric),
            "purchase_date" => Ok(Self::PurchaseDate),
            other => Err(format!(
                "unknown transaction ordering '{other}' (expected lexicographic, numeric or purchase_date)"
            )),
        }
    }
}

impl fmt::Display for TransactionOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lexicographic => "lexicographic",
            Self::Numeric => "numeric",
            Self::PurchaseDate => "purchase_date",
        })
    }
}
