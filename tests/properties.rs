//! Property tests: length parity, causality, cyclical encoding, scorer purity.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use shelfwatch::{
    config::{DetectorConfig, FeaturesConfig, RiskConfig},
    features::{angle, cyclical, FeatureExtractor, DAYS_PER_WEEK, DAYS_PER_YEAR},
    model::AnomalyDetector,
    risk::{WasteRiskInput, WasteRiskScorer},
    SalesRecord,
};
use std::f64::consts::PI;

fn series(store: u32, quantities: &[f64]) -> Vec<SalesRecord> {
    let start = NaiveDate::from_ymd_opt(2023, 12, 20).unwrap();
    quantities
        .iter()
        .enumerate()
        .map(|(i, q)| SalesRecord::new(start + Duration::days(i as i64), store, *q))
        .collect()
}

/// Two stores' series interleaved day by day.
fn interleaved(a: &[f64], b: &[f64]) -> Vec<SalesRecord> {
    let sa = series(1, a);
    let sb = series(2, b);
    let mut out = Vec::new();
    for i in 0..sa.len().max(sb.len()) {
        out.extend(sa.get(i).cloned());
        out.extend(sb.get(i).cloned());
    }
    out
}

fn extractor(window: usize) -> FeatureExtractor {
    FeatureExtractor::new(FeaturesConfig {
        window,
        require_full_window: false,
    })
}

fn waste_input() -> impl Strategy<Value = WasteRiskInput> {
    (
        0.0..500.0f64,
        0.0..500.0f64,
        0.0..1.0f64,
        -1.0..1.0f64,
        0.0..1.0f64,
        prop::option::of(0.0..5.0f64),
        -1.0..1.0f64,
    )
        .prop_map(
            |(wasted, available, hist, trend, perish, coverage, sales_trend)| WasteRiskInput {
                current_waste_quantity: wasted,
                quantity_available: available,
                historical_waste_ratio: hist,
                historical_waste_trend: trend,
                perishability_weight: perish,
                stock_coverage: coverage,
                sales_trend,
            },
        )
}

proptest! {
    #[test]
    fn one_vector_per_record_same_order(
        a in prop::collection::vec(0.0..1000.0f64, 1..40),
        b in prop::collection::vec(0.0..1000.0f64, 0..40),
        window in 1usize..15,
    ) {
        let rows = interleaved(&a, &b);
        let out = extractor(window).extract(&rows).unwrap();
        prop_assert_eq!(out.len(), rows.len());
        for (r, v) in rows.iter().zip(&out) {
            prop_assert_eq!(&r.key(), &v.record_key);
        }
    }

    #[test]
    fn rolling_features_are_causal(
        q in prop::collection::vec(0.0..1000.0f64, 2..40),
        idx in any::<prop::sample::Index>(),
        replacement in 0.0..1000.0f64,
        window in 1usize..10,
    ) {
        let rows = series(1, &q);
        let i = idx.index(rows.len());
        let mut mutated = rows.clone();
        mutated[i].quantity_sold = replacement;

        let ex = extractor(window);
        let before = ex.extract(&rows).unwrap();
        let after = ex.extract(&mutated).unwrap();
        prop_assert_eq!(&before[..i], &after[..i]);
    }

    #[test]
    fn other_series_never_leak(
        a in prop::collection::vec(0.0..1000.0f64, 1..30),
        b in prop::collection::vec(0.0..1000.0f64, 1..30),
        window in 1usize..10,
    ) {
        let ex = extractor(window);
        let alone = ex.extract(&series(1, &a)).unwrap();
        let mixed: Vec<_> = ex
            .extract(&interleaved(&a, &b))
            .unwrap()
            .into_iter()
            .filter(|v| v.record_key.store_id == 1)
            .collect();
        prop_assert_eq!(alone, mixed);
    }

    #[test]
    fn cyclical_pair_reconstructs_angle(value in 0u32..366, offset in 0usize..50) {
        let (s, c) = cyclical(value as f64, DAYS_PER_YEAR);
        let expected = 2.0 * PI * value as f64 / DAYS_PER_YEAR;
        prop_assert!((angle(s, c) - expected).abs() < 1e-9);

        // Same weekday at any position in a series encodes identically.
        let q = vec![10.0; offset + 8];
        let rows = series(1, &q);
        let out = extractor(7).extract(&rows).unwrap();
        let weekly = &out[offset..offset + 8];
        prop_assert_eq!(&weekly[0].values[1..3], &weekly[7].values[1..3]);
        let dow = angle(weekly[0].values[1], weekly[0].values[2]) * DAYS_PER_WEEK / (2.0 * PI);
        prop_assert!((dow - dow.round()).abs() < 1e-9);
    }

    #[test]
    fn waste_scorer_is_pure(inputs in prop::collection::vec(waste_input(), 1..20)) {
        let mut config = RiskConfig::default();
        config.rules.stock_weight = 0.1;
        config.rules.sales_trend_weight = 0.1;
        let scorer = WasteRiskScorer::new(config);
        let key = series(1, &[1.0])[0].key();
        let forward: Vec<_> = inputs.iter().map(|i| scorer.score(key.clone(), i)).collect();
        let backward: Vec<_> = inputs.iter().rev().map(|i| scorer.score(key.clone(), i)).collect();
        for (f, b) in forward.iter().zip(backward.iter().rev()) {
            prop_assert_eq!(f, b);
            prop_assert!(f.risk_score <= 100);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn scoring_is_idempotent(q in prop::collection::vec(50.0..150.0f64, 12..40)) {
        let vectors = extractor(7).extract(&series(1, &q)).unwrap();
        let model = AnomalyDetector::new(DetectorConfig::default()).fit(&vectors).unwrap();
        for v in &vectors {
            prop_assert_eq!(model.score(v).unwrap(), model.score(v).unwrap());
        }
    }
}
