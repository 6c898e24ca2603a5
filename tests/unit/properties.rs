//! Property tests for aggregation, derivation, ordering and symbol cleanup

use proptest::prelude::*;

use rule40_screen::metrics::{adjusted_margin, gaap_margin, revenue_growth, rule_of_40};
use rule40_screen::models::{MarginBasis, MetricRecord, ScreenRow, TickerOutcome, UniverseEntry};
use rule40_screen::ttm::ttm_from_quarters;
use rule40_screen::universe::normalize_symbol;
use rule40_screen::ResultTable;

fn quarter_value() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None),
        1 => Just(Some(f64::NAN)),
        6 => (-1e9..1e9f64).prop_map(Some),
    ]
}

fn maybe_zero() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        Just(Some(0.0)),
        (-1e9..1e9f64).prop_map(Some),
    ]
}

fn nonzero() -> impl Strategy<Value = f64> {
    prop_oneof![-1e9..-1e-3f64, 1e-3..1e9f64]
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn ttm_is_undefined_below_four_valid_values(
        values in prop::collection::vec(quarter_value(), 0..12),
        offset in 0usize..8,
    ) {
        let valid: Vec<f64> = values
            .iter()
            .skip(offset)
            .filter_map(|v| *v)
            .filter(|v| v.is_finite())
            .collect();

        let result = ttm_from_quarters(&values, offset);
        if valid.len() < 4 {
            prop_assert_eq!(result, None);
        } else {
            let expected = valid[0] + valid[1] + valid[2] + valid[3];
            prop_assert!(close(result.unwrap(), expected));
        }
    }

    #[test]
    fn derivations_are_total(
        revenue in maybe_zero(),
        prior in maybe_zero(),
        opinc in maybe_zero(),
        sbc in maybe_zero(),
    ) {
        let growth = revenue_growth(revenue, prior);
        let adjusted = adjusted_margin(opinc, sbc, revenue);
        let gaap = gaap_margin(opinc, revenue);
        let score = rule_of_40(growth, adjusted, gaap);

        if prior.is_none() || prior == Some(0.0) || revenue.is_none() {
            prop_assert_eq!(growth, None);
        }
        if revenue.is_none() || revenue == Some(0.0) {
            prop_assert_eq!(adjusted, None);
            prop_assert_eq!(gaap, None);
        }
        if growth.is_none() {
            prop_assert_eq!(score, None);
        }
        if let Some((value, _)) = score {
            prop_assert!(value.is_finite());
        }
    }

    #[test]
    fn adjusted_margin_preferred_then_gaap(
        revenue in nonzero(),
        prior in nonzero(),
        opinc in -1e9..1e9f64,
        sbc in 0.0..1e9f64,
    ) {
        let growth = revenue_growth(Some(revenue), Some(prior));
        let growth_value = revenue / prior - 1.0;

        let adjusted = adjusted_margin(Some(opinc), Some(sbc), Some(revenue));
        let gaap = gaap_margin(Some(opinc), Some(revenue));
        let (score, basis) = rule_of_40(growth, adjusted, gaap).unwrap();
        prop_assert_eq!(basis, MarginBasis::Adjusted);
        prop_assert!(close(score, (growth_value + (opinc + sbc) / revenue) * 100.0));

        let adjusted = adjusted_margin(Some(opinc), None, Some(revenue));
        let (score, basis) = rule_of_40(growth, adjusted, gaap).unwrap();
        prop_assert_eq!(basis, MarginBasis::Gaap);
        prop_assert!(close(score, (growth_value + opinc / revenue) * 100.0));
    }

    #[test]
    fn table_is_sorted_with_undefined_last(
        scores in prop::collection::vec(prop::option::of(-500.0..500.0f64), 0..40),
    ) {
        let rows: Vec<ScreenRow> = scores
            .iter()
            .enumerate()
            .map(|(i, score)| {
                let record = MetricRecord { rule40_score: *score, ..MetricRecord::default() };
                ScreenRow::new(UniverseEntry::new(format!("T{}", i), "n"), TickerOutcome::Computed(record))
            })
            .collect();

        let table = ResultTable::new(rows);
        let sorted: Vec<Option<f64>> = table.rows().iter().map(|r| r.score()).collect();

        prop_assert_eq!(sorted.len(), scores.len());
        let defined = sorted.iter().take_while(|s| s.is_some()).count();
        prop_assert!(sorted[defined..].iter().all(|s| s.is_none()));
        for pair in sorted[..defined].windows(2) {
            prop_assert!(pair[0].unwrap() >= pair[1].unwrap());
        }

        let threshold = 40.0;
        let screened = table.screened(threshold);
        prop_assert!(screened.iter().all(|r| r.score().unwrap() >= threshold));
        prop_assert_eq!(
            screened.len(),
            scores.iter().filter(|s| s.is_some_and(|v| v >= threshold)).count()
        );
    }

    #[test]
    fn normalized_symbols_are_upper_and_dashed(raw in "[a-zA-Z]{1,5}(\\.[a-zA-Z])?") {
        let symbol = normalize_symbol(&raw);
        prop_assert!(!symbol.contains('.'));
        prop_assert!(!symbol.chars().any(|c| c.is_ascii_lowercase()));
        prop_assert_eq!(symbol.len(), raw.len());
    }
}

#[test]
fn test_symbol_examples() {
    assert_eq!(normalize_symbol("BRK.B"), "BRK-B");
    assert_eq!(normalize_symbol("aapl"), "AAPL");
}
