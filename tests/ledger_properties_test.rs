use leverage_ledger::engine::{fees, health, interest, SECONDS_PER_YEAR};
use leverage_ledger::{
    Asset, Decimal, ExchangeRate, ExchangeRateModel, HealthFactor, InMemoryPositionRepository,
    LedgerError, LendingPool, ManualClock, OpenRequest, Owner, PositionLedger, SettlementResult,
    Timestamp,
};

type Ledger = PositionLedger<LendingPool, InMemoryPositionRepository, ManualClock>;

const START: i64 = 1_700_000_000;

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn new_ledger() -> (Ledger, ManualClock) {
    let clock = ManualClock::new(Timestamp::new(START));
    let ledger = PositionLedger::new(
        LendingPool::new(d("1000000"), d("10")),
        InMemoryPositionRepository::new(),
        clock.clone(),
    );
    (ledger, clock)
}

fn open_request(collateral: &str, leverage: &str) -> OpenRequest {
    OpenRequest {
        owner: Owner::new("carol"),
        base_asset: Asset::new("SOL"),
        collateral_amount: d(collateral),
        leverage_factor: d(leverage),
        current_price: d("200"),
        current_exchange_rate: ExchangeRate::ONE,
    }
}

#[test]
fn test_fees_are_deterministic() {
    for amount in ["0", "1", "99", "1234.5678", "0.000001"] {
        let first = fees::open_fee(d(amount)).unwrap();
        for _ in 0..3 {
            assert_eq!(fees::open_fee(d(amount)).unwrap(), first);
        }
        assert_eq!(first, d(amount) * d("0.01"));

        let close = fees::close_fees(d(amount), d("3")).unwrap();
        assert_eq!(close, fees::close_fees(d(amount), d("3")).unwrap());
        assert_eq!(close.yield_fee, d("0.3"));

        let split = fees::split_fee(close.total()).unwrap();
        assert_eq!(split.vault_share + split.protocol_share, close.total());
    }
}

#[test]
fn test_fee_inputs_must_be_non_negative() {
    assert!(matches!(
        fees::open_fee(d("-1")),
        Err(LedgerError::InvalidAmount { .. })
    ));
    assert!(fees::close_fees(d("1"), d("-0.5")).is_err());
}

#[test]
fn test_partial_then_remaining_equals_full_close() {
    let exit_rate = ExchangeRate::from_scaled(1_100_000);

    let (mut split, split_clock) = new_ledger();
    let p = split.open(open_request("100", "2")).unwrap();
    split_clock.advance(SECONDS_PER_YEAR / 2);
    let first = split.close(&p.id, d("200"), exit_rate, Some(d("33"))).unwrap();
    let second = split.close(&p.id, d("200"), exit_rate, None).unwrap();
    assert!(first.is_partial);
    assert!(!second.is_partial);

    let (mut whole, whole_clock) = new_ledger();
    let q = whole.open(open_request("100", "2")).unwrap();
    whole_clock.advance(SECONDS_PER_YEAR / 2);
    let full = whole.close(&q.id, d("200"), exit_rate, None).unwrap();

    let sum = |f: fn(&SettlementResult) -> Decimal| f(&first) + f(&second);
    assert_eq!(sum(|s| s.closed_collateral), full.closed_collateral);
    assert_eq!(sum(|s| s.base_returned), full.base_returned);
    assert_eq!(sum(|s| s.quote_returned), full.quote_returned);
    assert_eq!(sum(|s| s.principal_fee), full.principal_fee);
    assert_eq!(sum(|s| s.yield_fee), full.yield_fee);
    assert_eq!(sum(|s| s.yield_earned), full.yield_earned);
    assert_eq!(sum(|s| s.interest_owed), full.interest_owed);
    assert_eq!(sum(|s| s.repaid_to_facility), full.repaid_to_facility);

    assert_eq!(full.interest_owed, d("990"));
    assert_eq!(full.repaid_to_facility, d("20790"));
    assert_eq!(split.facility().total_borrowed(), Decimal::zero());
    assert_eq!(
        split.facility().interest_collected(),
        whole.facility().interest_collected()
    );
}

#[test]
fn test_partial_then_remaining_within_rounding_of_full_close() {
    // 10 of 37.125 collateral with 3% rate growth: the yield split does not
    // terminate, so each leg rounds on its own.
    let exit_rate = ExchangeRate::from_scaled(1_030_000);
    let request = || OpenRequest {
        current_price: d("137.5"),
        ..open_request("37.5", "1.5")
    };
    let tolerance = d("0.000000000001");
    let close_enough = |a: Decimal, b: Decimal| (a - b).abs() <= tolerance;

    let (mut split, split_clock) = new_ledger();
    let p = split.open(request()).unwrap();
    assert_eq!(p.collateral, d("37.125"));
    split_clock.advance(SECONDS_PER_YEAR / 3);
    let first = split.close(&p.id, d("137.5"), exit_rate, Some(d("10"))).unwrap();
    let second = split.close(&p.id, d("137.5"), exit_rate, None).unwrap();
    assert!(first.is_partial);
    assert_eq!(second.closed_collateral, d("27.125"));

    let (mut whole, whole_clock) = new_ledger();
    let q = whole.open(request()).unwrap();
    whole_clock.advance(SECONDS_PER_YEAR / 3);
    let full = whole.close(&q.id, d("137.5"), exit_rate, None).unwrap();

    assert!(close_enough(first.yield_earned + second.yield_earned, full.yield_earned));
    assert!(close_enough(first.base_returned + second.base_returned, full.base_returned));
    assert!(close_enough(first.quote_returned + second.quote_returned, full.quote_returned));
    assert!(close_enough(
        first.repaid_to_facility + second.repaid_to_facility,
        full.repaid_to_facility
    ));
    assert_eq!(split.facility().total_borrowed(), Decimal::zero());
}

#[test]
fn test_partial_close_scales_remaining_magnitudes() {
    let (mut ledger, _) = new_ledger();
    let p = ledger.open(open_request("100", "1.5")).unwrap();

    ledger
        .close(&p.id, d("200"), ExchangeRate::ONE, Some(d("33")))
        .unwrap();
    let left = ledger.position(&p.id).unwrap();

    assert!(left.is_open);
    assert_eq!(left.collateral, d("66"));
    assert_eq!(left.borrowed_principal, d("3300"));
    assert_eq!(left.deposited_quote, d("3300"));
    assert_eq!(left.entry_exchange_rate, p.entry_exchange_rate);
    assert_eq!(left.opened_at, p.opened_at);
}

#[test]
fn test_health_factor_sentinel_and_monotonicity() {
    let hf = HealthFactor::default();
    assert_eq!(hf.compute(d("500"), Decimal::zero()).unwrap(), d("999"));
    assert!(matches!(
        hf.compute(d("500"), d("-1")),
        Err(LedgerError::InvalidAmount { .. })
    ));

    let (mut ledger, _) = new_ledger();
    let p = ledger.open(open_request("100", "2")).unwrap();
    let mut previous = ledger.health(&p.id, d("1")).unwrap();
    for price in ["10", "50", "100", "200", "400"] {
        let next = ledger.health(&p.id, d(price)).unwrap();
        assert!(next.factor > previous.factor);
        assert!(next.ltv_bps <= previous.ltv_bps);
        previous = next;
    }
}

#[test]
fn test_penalty_multiplier_lowers_health() {
    let (ledger, _) = new_ledger();
    let mut ledger = ledger.with_health_factor(HealthFactor::new(d("1.1")).unwrap());
    let p = ledger.open(open_request("100", "2")).unwrap();

    let report = ledger.health(&p.id, d("200")).unwrap();
    assert!(report.factor < d("2"));
    assert_eq!(
        report.factor,
        health::compute_with_penalty(d("39600"), d("19800"), d("1.1")).unwrap()
    );
}

#[test]
fn test_negative_amounts_rejected_without_side_effects() {
    let (mut ledger, _) = new_ledger();
    let err = ledger.open(open_request("-5", "2")).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount { .. }));
    assert!(err.is_validation());
    assert!(ledger.repository().is_empty());
    assert_eq!(ledger.facility().total_borrowed(), Decimal::zero());

    let p = ledger.open(open_request("100", "2")).unwrap();
    for amount in ["-1", "0"] {
        let err = ledger
            .close(&p.id, d("200"), ExchangeRate::ONE, Some(d(amount)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
    }
    let err = ledger
        .close(&p.id, d("-200"), ExchangeRate::ONE, None)
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount { .. }));

    assert_eq!(ledger.position(&p.id).unwrap(), p);
    assert_eq!(ledger.facility().total_borrowed(), d("19800"));
}

#[test]
fn test_interest_validation() {
    assert!(matches!(
        interest::simple_interest(d("-1"), d("10"), 100),
        Err(LedgerError::InvalidAmount { .. })
    ));
    assert!(matches!(
        interest::simple_interest(d("100"), d("-10"), 100),
        Err(LedgerError::InvalidRate(_))
    ));
    assert_eq!(
        interest::simple_interest(d("19800"), d("10"), SECONDS_PER_YEAR).unwrap(),
        d("1980")
    );
}

#[test]
fn test_clock_moving_backwards_accrues_nothing() {
    let (mut ledger, clock) = new_ledger();
    let p = ledger.open(open_request("100", "2")).unwrap();
    clock.set(Timestamp::new(START - 3_600));

    assert_eq!(
        interest::elapsed_seconds(p.opened_at, Timestamp::new(START - 3_600)),
        0
    );
    let settlement = ledger
        .close(&p.id, d("200"), ExchangeRate::ONE, None)
        .unwrap();
    assert_eq!(settlement.interest_owed, Decimal::zero());
    assert_eq!(settlement.repaid_to_facility, d("19800"));
}

#[test]
fn test_apy_window_policy() {
    let model = ExchangeRateModel::default();
    let up_one_percent = ExchangeRate::from_scaled(1_010_000);
    let up_five_percent = ExchangeRate::from_scaled(1_050_000);

    // Below one day the raw period return is reported.
    assert_eq!(model.apy_from_rates(ExchangeRate::ONE, up_one_percent, 3_600), d("1"));
    assert_eq!(
        model.apy_from_rates(ExchangeRate::ONE, up_five_percent, SECONDS_PER_YEAR),
        d("5")
    );
    assert_eq!(
        model.apy_from_rates(ExchangeRate::ONE, up_five_percent, SECONDS_PER_YEAR / 2),
        d("10")
    );

    assert_eq!(model.apy_from_rates(ExchangeRate::ONE, up_five_percent, 0), Decimal::zero());
    assert_eq!(
        model.apy_from_rates(ExchangeRate::from_scaled(0), up_five_percent, 3_600),
        Decimal::zero()
    );
    assert_eq!(
        model.apy_from_rates(up_five_percent, ExchangeRate::ONE, SECONDS_PER_YEAR),
        Decimal::zero()
    );

    let annualize_everything = ExchangeRateModel::new(0);
    assert_eq!(
        annualize_everything.apy_from_rates(ExchangeRate::ONE, up_one_percent, SECONDS_PER_YEAR / 365),
        d("365")
    );
}
