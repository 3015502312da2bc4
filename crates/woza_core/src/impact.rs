//! Impact & Valuation Calculator.
//!
//! Every surface that shows collection value, fund allocation, points or
//! environmental savings derives them here, so the figures agree wherever
//! they are displayed.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::collection::LineItem;
use crate::rates::{MaterialRate, RateTable};

/// Share of a collection's value routed to the community fund.
pub const DEFAULT_FUND_SHARE: f64 = 0.30;

pub const DEFAULT_POINTS_PER_KG: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactParams {
    fund_share: f64,
    points_per_kg: f64,
}

impl ImpactParams {
    pub fn new(fund_share: f64, points_per_kg: f64) -> Result<Self> {
        if !fund_share.is_finite() || !(0.0..=1.0).contains(&fund_share) {
            return Err(Error::InvalidParameter(format!(
                "fund share must be between 0 and 1, got {}",
                fund_share
            )));
        }
        if !points_per_kg.is_finite() || points_per_kg < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "points per kg must be a non-negative number, got {}",
                points_per_kg
            )));
        }
        Ok(Self {
            fund_share,
            points_per_kg,
        })
    }

    pub fn fund_share(&self) -> f64 {
        self.fund_share
    }

    pub fn points_per_kg(&self) -> f64 {
        self.points_per_kg
    }
}

impl Default for ImpactParams {
    fn default() -> Self {
        Self {
            fund_share: DEFAULT_FUND_SHARE,
            points_per_kg: DEFAULT_POINTS_PER_KG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactEntry {
    pub material_id: String,
    pub weight_kg: f64,
}

impl ImpactEntry {
    pub fn new(material_id: &str, weight_kg: f64) -> Self {
        Self {
            material_id: material_id.to_string(),
            weight_kg,
        }
    }

    /// Only finite, strictly positive weights take part in any total.
    pub fn counts(&self) -> bool {
        self.weight_kg.is_finite() && self.weight_kg > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactResult {
    pub total_weight_kg: f64,
    pub total_value: f64,
    pub fund_value: f64,
    pub wallet_value: f64,
    pub points_earned: f64,
    pub co2_saved_kg: f64,
    pub water_saved_liters: f64,
    pub landfill_saved_liters: f64,
}

impl ImpactResult {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Default)]
struct Totals {
    weight: f64,
    /// Weight of recognised materials; points are earned on this alone.
    rated_weight: f64,
    value: f64,
    co2: f64,
    water: f64,
    landfill: f64,
}

impl Totals {
    fn add(&mut self, weight: f64, unit_price: f64, rate: Option<&MaterialRate>) {
        self.weight += weight;
        self.value += weight * unit_price;
        if let Some(rate) = rate {
            self.rated_weight += weight;
            self.co2 += weight * rate.co2_kg_per_kg;
            self.water += weight * rate.water_liters_per_kg;
            self.landfill += weight * rate.landfill_liters_per_kg;
        }
    }

    fn finish(self, params: &ImpactParams) -> ImpactResult {
        let value = saturate(self.value);
        let fund_value = value * params.fund_share;
        ImpactResult {
            total_weight_kg: saturate(self.weight),
            total_value: value,
            fund_value,
            wallet_value: value - fund_value,
            points_earned: saturate(saturate(self.rated_weight) * params.points_per_kg),
            co2_saved_kg: saturate(self.co2),
            water_saved_liters: saturate(self.water),
            landfill_saved_liters: saturate(self.landfill),
        }
    }
}

/// Sums only ever grow, so an overflow is `+inf`. Clamp it to the largest
/// finite value so later arithmetic cannot produce NaN.
fn saturate(total: f64) -> f64 {
    if total.is_infinite() {
        f64::MAX
    } else {
        total
    }
}

/// Pure calculator over a borrowed rate table. Holds no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct ImpactCalculator<'a> {
    rates: &'a RateTable,
    params: ImpactParams,
}

impl<'a> ImpactCalculator<'a> {
    pub fn new(rates: &'a RateTable, params: ImpactParams) -> Self {
        Self { rates, params }
    }

    pub fn params(&self) -> ImpactParams {
        self.params
    }

    /// Values raw form input at the current rates.
    ///
    /// Entries with a non-positive weight are skipped. An unknown material
    /// still adds its weight but contributes nothing to value, points or
    /// savings.
    pub fn compute_impact(&self, entries: &[ImpactEntry]) -> ImpactResult {
        let mut totals = Totals::default();
        for entry in entries.iter().filter(|e| e.counts()) {
            let rate = self.rates.get(&entry.material_id);
            let unit_price = rate.map_or(0.0, |r| r.unit_price_per_kg);
            totals.add(entry.weight_kg, unit_price, rate);
        }
        totals.finish(&self.params)
    }

    /// Re-derives figures for persisted line items. Value uses the price
    /// captured on each line; savings use the current coefficients.
    pub fn compute_line_items(&self, items: &[LineItem]) -> ImpactResult {
        let mut totals = Totals::default();
        for item in items {
            if !item.weight_kg.is_finite() || item.weight_kg <= 0.0 {
                continue;
            }
            let unit_price = if item.unit_price.is_finite() && item.unit_price > 0.0 {
                item.unit_price
            } else {
                0.0
            };
            totals.add(item.weight_kg, unit_price, self.rates.get(&item.material_id));
        }
        totals.finish(&self.params)
    }
}

/// Rounds a rand amount to cents, half away from zero. Display only.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
