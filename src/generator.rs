//! Synthetic retail sales: weekly and yearly seasonality, stock above demand, and a
//! small share of injected demand spikes and drops.

use crate::config::GeneratorConfig;
use crate::records::SalesRecord;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

pub const CATALOGUE: [(&str, [&str; 5]); 5] = [
    ("Fresh Produce", ["Apples", "Bananas", "Lettuce", "Tomatoes", "Carrots"]),
    ("Dairy", ["Milk", "Yogurt", "Cheese", "Butter", "Cream"]),
    ("Bakery", ["Bread", "Croissants", "Muffins", "Bagels", "Donuts"]),
    ("Meat", ["Chicken", "Beef", "Pork", "Fish", "Turkey"]),
    ("Frozen", ["Ice Cream", "Frozen Pizza", "Vegetables", "Fish Sticks", "Berries"]),
];

const BASE_DEMAND_MEAN: f64 = 100.0;
const BASE_DEMAND_SD: f64 = 20.0;
const WEEKEND_MULTIPLIER: f64 = 1.3;
const SEASONAL_AMPLITUDE: f64 = 0.2;
const ANOMALY_RATE: f64 = 0.05;
/// Upper bound on up-front allocation; larger runs grow the vector as they go.
const MAX_PREALLOCATED_ROWS: usize = 1 << 20;

pub struct RetailDataGenerator {
    rng: StdRng,
}

impl RetailDataGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.seed)
    }

    /// One row per store, day and product starting at `start`.
    pub fn generate(&mut self, start: NaiveDate, days: u32, stores: u32) -> Vec<SalesRecord> {
        let mut out = Vec::with_capacity(row_capacity(days, stores));
        for store_id in 1..=stores {
            let store_factor = 0.8 + store_id as f64 * 0.1;
            for day in 0..days {
                let date = start + Duration::days(day as i64);
                let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
                let weekend_factor = if weekend { WEEKEND_MULTIPLIER } else { 1.0 };
                let seasonal = 1.0 + SEASONAL_AMPLITUDE * (2.0 * PI * day as f64 / 365.0).sin();

                for (category, products) in CATALOGUE {
                    for product in products {
                        out.push(self.row(date, store_id, category, product, store_factor * weekend_factor * seasonal));
                    }
                }
            }
        }
        tracing::info!(rows = out.len(), days, stores, "generated synthetic sales");
        out
    }

    fn row(&mut self, date: NaiveDate, store_id: u32, category: &str, product: &str, factor: f64) -> SalesRecord {
        let demand = (self.normal(BASE_DEMAND_MEAN, BASE_DEMAND_SD) * factor).max(0.0);
        let stock = demand * self.rng.gen_range(1.1..1.4);
        let mut sales = demand.min(stock);

        if self.rng.gen_bool(ANOMALY_RATE) {
            sales *= if self.rng.gen_bool(0.5) {
                self.rng.gen_range(2.5..4.0)
            } else {
                self.rng.gen_range(0.1..0.3)
            };
        }

        let waste = (stock - sales).max(0.0);
        SalesRecord {
            date,
            store_id,
            product: Some(product.to_string()),
            category: Some(category.to_string()),
            quantity_sold: round2(sales),
            quantity_wasted: Some(round2(waste)),
            stock: Some(round2(stock)),
            price: Some(round2(self.rng.gen_range(2.0..15.0))),
        }
    }

    /// Box-Muller transform over two uniform draws.
    fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen();
        mean + sd * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

fn row_capacity(days: u32, stores: u32) -> usize {
    let per_day: usize = CATALOGUE.iter().map(|(_, products)| products.len()).sum();
    (days as usize)
        .saturating_mul(stores as usize)
        .saturating_mul(per_day)
        .min(MAX_PREALLOCATED_ROWS)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
