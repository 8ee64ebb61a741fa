//! Price parsing and the sort-order check over product rows

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, FlowResult};

/// Direction a product listing is expected to be sorted in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Descending => "descending",
            SortOrder::Ascending => "ascending",
        }
    }

    fn holds(&self, previous: f64, current: f64) -> bool {
        match self {
            SortOrder::Descending => current < previous,
            SortOrder::Ascending => current > previous,
        }
    }
}

/// A product row as displayed at assertion time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductRow {
    pub display_index: usize,
    pub price_value: f64,
}

/// Parse a displayed price such as `$1,299.50`, `€ 12.00` or `-$5.00`.
///
/// Everything before the first digit is treated as currency symbol, sign and
/// whitespace; a `-` anywhere in it makes the price negative. Thousands
/// separators are ignored.
pub fn parse_price(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let start = trimmed.find(|c: char| c.is_ascii_digit() || c == '.')?;
    let (prefix, amount) = trimmed.split_at(start);
    let cleaned: String = amount.chars().filter(|c| *c != ',').collect();
    let value = cleaned.trim_end().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if prefix.contains('-') { -value } else { value })
}

/// Read product rows from their displayed price strings, in display order
pub fn rows_from_prices<S: AsRef<str>>(prices: &[S]) -> FlowResult<Vec<ProductRow>> {
    prices
        .iter()
        .enumerate()
        .map(|(display_index, text)| {
            let text = text.as_ref();
            parse_price(text)
                .map(|price_value| ProductRow {
                    display_index,
                    price_value,
                })
                .ok_or_else(|| {
                    FlowError::assertion(format!(
                        "row {}: cannot parse price {:?}",
                        display_index, text
                    ))
                })
        })
        .collect()
}

/// Check that every row is strictly ordered against the one before it.
///
/// Fails on the first offending row index.
pub fn check_sorted(rows: &[ProductRow], order: SortOrder) -> FlowResult<()> {
    for pair in rows.windows(2) {
        let (previous, current) = (pair[0], pair[1]);
        if !order.holds(previous.price_value, current.price_value) {
            return Err(FlowError::assertion(format!(
                "prices not strictly {} at index {}: {} follows {}",
                order.as_str(),
                current.display_index,
                current.price_value,
                previous.price_value
            )));
        }
    }
    Ok(())
}

/// Parse the displayed prices and check their order in one pass
pub fn check_price_order<S: AsRef<str>>(prices: &[S], order: SortOrder) -> FlowResult<()> {
    let rows = rows_from_prices(prices)?;
    check_sorted(&rows, order)
}
