use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use tabled::Tabled;

use crate::exponent;
use crate::util::format_cents;

/// One row of the storm database. Only the columns the analysis needs are
/// named; the rest of the (wide) export is ignored by the CSV reader.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "EVTYPE")]
    pub evtype: Option<String>,
    #[serde(rename = "BGN_DATE")]
    pub bgn_date: Option<String>,
    #[serde(rename = "FATALITIES")]
    pub fatalities: Option<String>,
    #[serde(rename = "INJURIES")]
    pub injuries: Option<String>,
    #[serde(rename = "PROPDMG")]
    pub propdmg: Option<String>,
    #[serde(rename = "PROPDMGEXP")]
    pub propdmgexp: Option<String>,
    #[serde(rename = "CROPDMG")]
    pub cropdmg: Option<String>,
    #[serde(rename = "CROPDMGEXP")]
    pub cropdmgexp: Option<String>,
}

/// An amount of money in whole cents.
///
/// Integer cents keep per-category sums exact, so merging partial
/// aggregates in any order gives identical totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: u64) -> Self {
        Money(cents)
    }

    pub fn from_dollars(dollars: u64) -> Self {
        Money(dollars.saturating_mul(100))
    }

    /// Magnitude (in currency units, possibly fractional) times a decoded
    /// exponent multiplier, rounded to the nearest cent only after scaling.
    /// Amounts past `u64::MAX` cents saturate.
    pub fn from_magnitude(magnitude: f64, multiplier: u64) -> Self {
        if !magnitude.is_finite() || magnitude <= 0.0 {
            return Money::ZERO;
        }
        // `as` saturates on overflow.
        Money((magnitude * multiplier as f64 * 100.0).round() as u64)
    }

    pub fn cents(self) -> u64 {
        self.0
    }

    pub fn dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_cents(self.0))
    }
}

/// A projected record: only the impact fields, damage still encoded as
/// magnitude plus exponent code.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactRecord {
    pub category: String,
    pub fatalities: u64,
    pub injuries: u64,
    pub property_magnitude: f64,
    pub property_exponent: Option<String>,
    pub crop_magnitude: f64,
    pub crop_exponent: Option<String>,
}

impl ImpactRecord {
    /// A record with nothing recorded on any axis carries no information
    /// for the impact rankings.
    pub fn has_impact(&self) -> bool {
        self.fatalities > 0
            || self.injuries > 0
            || self.property_magnitude > 0.0
            || self.crop_magnitude > 0.0
    }

    pub fn property_damage(&self) -> Money {
        Money::from_magnitude(
            self.property_magnitude,
            exponent::decode_field(self.property_exponent.as_deref()),
        )
    }

    pub fn crop_damage(&self) -> Money {
        Money::from_magnitude(
            self.crop_magnitude,
            exponent::decode_field(self.crop_exponent.as_deref()),
        )
    }
}

/// A record whose category went through the rewrite cascade and whose
/// damage columns are decoded into money.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub category: String,
    pub fatalities: u64,
    pub injuries: u64,
    pub property_damage: Money,
    pub crop_damage: Money,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankedRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "EventType")]
    #[tabled(rename = "EventType")]
    pub category: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TopContributorRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "EventType")]
    #[tabled(rename = "EventType")]
    pub category: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CategoryTotalsRow {
    #[serde(rename = "EventType")]
    #[tabled(rename = "EventType")]
    pub category: String,
    #[serde(rename = "Standard")]
    #[tabled(rename = "Standard")]
    pub standard: bool,
    #[serde(rename = "Records")]
    #[tabled(rename = "Records")]
    pub records: u64,
    #[serde(rename = "Fatalities")]
    #[tabled(rename = "Fatalities")]
    pub fatalities: u64,
    #[serde(rename = "Injuries")]
    #[tabled(rename = "Injuries")]
    pub injuries: u64,
    #[serde(rename = "PropertyDamage")]
    #[tabled(rename = "PropertyDamage")]
    pub property_damage: String,
    #[serde(rename = "CropDamage")]
    #[tabled(rename = "CropDamage")]
    pub crop_damage: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct NonStandardRow {
    #[serde(rename = "EventType")]
    #[tabled(rename = "EventType")]
    pub category: String,
    #[serde(rename = "Records")]
    #[tabled(rename = "Records")]
    pub records: u64,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub total_rows: usize,
    pub retained_rows: usize,
    pub zero_impact_rows: usize,
    pub out_of_range_rows: usize,
    pub undated_rows: usize,
    pub parse_errors: usize,
    pub distinct_raw_labels: usize,
    pub distinct_categories: usize,
    pub nonstandard_categories: usize,
    pub nonstandard_records: u64,
    pub total_fatalities: u64,
    pub total_injuries: u64,
    pub total_property_damage: f64,
    pub total_crop_damage: f64,
}
