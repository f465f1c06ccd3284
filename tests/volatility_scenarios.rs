use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use vol_oracle::application::VolOracle;
use vol_oracle::domain::errors::OracleError;
use vol_oracle::domain::observation::SourceObservation;
use vol_oracle::domain::oracle::config::SECONDS_PER_HOUR;
use vol_oracle::domain::oracle::{IndexRange, OracleConfig};
use vol_oracle::domain::ports::ObservationSource;
use vol_oracle::infrastructure::{InMemoryObservationSource, ManualClock};

const POOL: &str = "ETH/USDC";

/// Two days of hourly samples, tick alternating between 100 and 300.
fn alternating_pool(clock: Arc<ManualClock>) -> (VolOracle, InMemoryObservationSource, i64) {
    let start = 1_666_000_000;
    let source = InMemoryObservationSource::new(POOL, 64);
    let oracle = VolOracle::with_clock(OracleConfig::new(128, 64, 100).unwrap(), clock);

    source.record(start, 0);
    assert_ok!(oracle.init_pool(&source));
    for hour in 1..=48 {
        let tick = if hour % 2 == 1 { 100 } else { 300 };
        source.record(start + hour * SECONDS_PER_HOUR, tick);
    }
    assert_ok!(oracle.fill_in_observations(&source));
    (oracle, source, start)
}

#[test]
fn test_alternating_ticks_over_windows() {
    let clock = Arc::new(ManualClock::new(0));
    let (oracle, _source, start) = alternating_pool(clock.clone());
    clock.set(start + 48 * SECONDS_PER_HOUR);

    // mean 200, mean square 50_000
    assert_eq!(assert_ok!(oracle.calculate_vol_by_days(POOL, 1)), 10_000);
    assert_eq!(assert_ok!(oracle.calculate_vol_by_days(POOL, 2)), 10_000);
    assert_eq!(assert_ok!(oracle.calculate_vol_by_hours(POOL, 2)), 10_000);
    // a single held tick has no spread
    assert_eq!(assert_ok!(oracle.calculate_vol_by_hours(POOL, 1)), 0);

    let err = assert_err!(oracle.calculate_vol_by_days(POOL, 3));
    assert!(matches!(err, OracleError::TargetTooOld { .. }));
}

#[test]
fn test_window_between_samples_anchors_on_earlier_entry() {
    let clock = Arc::new(ManualClock::new(0));
    let (oracle, _source, start) = alternating_pool(clock.clone());

    // three hours back from the half hour lands inside hour 45
    clock.set(start + 48 * SECONDS_PER_HOUR + SECONDS_PER_HOUR / 2);
    let anchor = assert_ok!(oracle.index_before_or_at(POOL, start + 45 * SECONDS_PER_HOUR + 1_800));
    assert_eq!(anchor, 45);

    // intervals 46..=48 hold 300, 100, 300: mean 233, mean square 63_333
    let vol = assert_ok!(oracle.calculate_vol_by_hours(POOL, 3));
    assert_eq!(vol, 63_333 - 233 * 233);
}

#[test]
fn test_newest_entry_as_target() {
    let clock = Arc::new(ManualClock::new(0));
    let (oracle, _source, start) = alternating_pool(clock.clone());
    let newest_ts = start + 48 * SECONDS_PER_HOUR;

    let err = assert_err!(oracle.calculate_vol(POOL, newest_ts));
    assert_eq!(
        err,
        OracleError::NoNewObservations {
            target: newest_ts,
            newest: newest_ts
        }
    );
    assert!(err.is_operational());

    let err = assert_err!(oracle.calculate_vol(POOL, start - 1));
    assert!(!err.is_operational());
}

#[test]
fn test_fetch_indexes_with_unnormalized_cursor() {
    let source = InMemoryObservationSource::new(POOL, 1_005);
    let oracle = VolOracle::new(OracleConfig::new(2_048, 1_005, 100).unwrap());

    source.set_slot(10, SourceObservation::new(1_000, 0));
    source.set_current_index(10);
    assert_ok!(oracle.init_pool(&source));

    // 1_006 and 1 name the same physical slot
    source.set_current_index(1_006);
    assert_eq!(assert_ok!(oracle.fetch_intermediate_indexes(&source)), IndexRange::new(11, 1_006));
    source.set_current_index(1);
    assert_eq!(assert_ok!(oracle.fetch_intermediate_indexes(&source)), IndexRange::new(11, 1_006));

    source.set_current_index(10);
    assert!(assert_ok!(oracle.fetch_intermediate_indexes(&source)).is_empty());
}

#[test]
fn test_negative_ticks_truncate_toward_zero() {
    let source = InMemoryObservationSource::new(POOL, 16);
    let oracle = VolOracle::new(OracleConfig::new(32, 16, 10).unwrap());
    source.push(100, 0);
    assert_ok!(oracle.init_pool(&source));

    // -7 over 2 seconds averages to -3
    source.push(102, -7);
    assert_ok!(oracle.fill_in_observations(&source));

    let newest = assert_ok!(oracle.get_observation(POOL, 1));
    assert_eq!(newest.tick_cumulative, -7);
    assert_eq!(newest.tick_square_cumulative, 18);
}

#[test]
fn test_concurrent_backfill_matches_sequential() {
    let config = OracleConfig::new(512, 256, 7).unwrap();
    let shared = VolOracle::new(config);
    let sequential = VolOracle::new(config);

    let sources: Vec<InMemoryObservationSource> = ["ETH/USDC", "WBTC/ETH", "DAI/USDC"]
        .iter()
        .enumerate()
        .map(|(n, id)| {
            let source = InMemoryObservationSource::new(*id, 256);
            source.push(1_000, 0);
            shared.init_pool(&source).unwrap();
            sequential.init_pool(&source).unwrap();
            for i in 1..=200i64 {
                let tick = 200_000 + (i * (n as i64 + 3)) % 41 - 20;
                source.record(1_000 + i * 12, tick);
            }
            source
        })
        .collect();

    std::thread::scope(|scope| {
        for source in &sources {
            for _ in 0..3 {
                let oracle = &shared;
                scope.spawn(move || {
                    while !oracle.fill_in_observations(source).unwrap().is_noop() {}
                });
            }
        }
    });

    for source in &sources {
        while !sequential.fill_in_observations(source).unwrap().is_noop() {}
    }

    for source in &sources {
        let id = source.source_id();
        assert_eq!(shared.get_oracle_state(id), sequential.get_oracle_state(id));
        assert_eq!(shared.get_oracle_state(id).write_counter, 200);
        assert_eq!(shared.calculate_vol(id, 1_000), sequential.calculate_vol(id, 1_000));
    }
}
