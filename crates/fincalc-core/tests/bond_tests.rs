use fincalc_core::fixed_income::{self, BondYieldInput};
use fincalc_core::solvers::{Bisection, SolverKind};
use fincalc_core::{FinCalcError, GuardConfig};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Yield from price
// ===========================================================================

#[test]
fn test_unbracketed_price_is_no_solution() {
    let limits = GuardConfig::default();
    // A 5% 10y bond cannot cost less than its value at a 1000% yield
    let err = fixed_income::yield_from_price(dec!(1000), dec!(0.05), dec!(10), dec!(0.01), 2, &limits)
        .unwrap_err();
    assert!(matches!(err, FinCalcError::NoSolution { .. }), "{err}");
    assert!(!err.is_caller_correctable());
}

#[test]
fn test_yield_wrapper_honours_solver_choice() {
    let input = BondYieldInput {
        face_value: dec!(1000),
        coupon_rate: dec!(0.05),
        years_to_maturity: dec!(10),
        price: dec!(1000),
        payments_per_year: 2,
        solver: SolverKind::Bisection,
    };
    let out = fixed_income::calculate_bond_yield(&input, &GuardConfig::default()).unwrap();
    assert_eq!(out.result.solver, "bisection");
    assert_eq!(out.result.yield_to_maturity, dec!(0.05));
}

#[test]
fn test_yield_input_defaults() {
    let input: BondYieldInput = serde_json::from_str(
        r#"{"face_value": "100", "coupon_rate": "0.04", "years_to_maturity": "5", "price": "95"}"#,
    )
    .unwrap();
    assert_eq!(input.payments_per_year, 2);
    assert_eq!(input.solver, SolverKind::Brent);
}

// ===========================================================================
// Properties
// ===========================================================================

fn bond_params() -> impl Strategy<Value = (Decimal, Decimal, u32)> {
    (
        0u32..=1_500,
        1u32..=30,
        prop::sample::select(vec![1u32, 2, 4, 12]),
    )
        .prop_map(|(coupon_bp, years, ppy)| (Decimal::new(coupon_bp as i64, 4), Decimal::from(years), ppy))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_price_decreases_in_yield(
        (coupon, years, ppy) in bond_params(),
        y1_bp in -5_000i64..10_000,
        gap_bp in 1i64..5_000,
    ) {
        let limits = GuardConfig::default();
        let y1 = Decimal::new(y1_bp, 4);
        let y2 = Decimal::new(y1_bp + gap_bp, 4);
        let p1 = fixed_income::price_from_yield(dec!(1000), coupon, years, y1, ppy, &limits).unwrap();
        let p2 = fixed_income::price_from_yield(dec!(1000), coupon, years, y2, ppy, &limits).unwrap();
        prop_assert!(p1 > p2, "P({}) = {} <= P({}) = {}", y1, p1, y2, p2);
    }

    #[test]
    fn prop_yield_round_trip(
        (coupon, years, ppy) in bond_params(),
        y_bp in 0i64..2_500,
    ) {
        let limits = GuardConfig::default();
        let y = Decimal::new(y_bp, 4);
        let price = fixed_income::price_from_yield(dec!(1000), coupon, years, y, ppy, &limits).unwrap();
        let solved = fixed_income::yield_from_price(dec!(1000), coupon, years, price, ppy, &limits).unwrap();
        prop_assert!((solved - y).abs() <= dec!(0.000001), "y = {}, solved = {}", y, solved);

        let bisected =
            fixed_income::yield_from_price_with(&Bisection, dec!(1000), coupon, years, price, ppy, &limits).unwrap();
        prop_assert!((bisected - y).abs() <= dec!(0.000001), "y = {}, bisected = {}", y, bisected);
    }
}
