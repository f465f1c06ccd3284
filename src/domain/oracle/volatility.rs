use crate::domain::errors::OracleError;
use crate::domain::observation::DerivedObservation;
use crate::domain::oracle::buffer::ObservationBuffer;
use crate::domain::oracle::search::index_before_or_at;

/// Variance of the per-second average tick between `anchor` and `newest`.
///
/// Both divisions truncate toward zero and no remainder is carried between
/// them. `newest` must be strictly later than `anchor`.
pub fn realized_variance(anchor: &DerivedObservation, newest: &DerivedObservation) -> i128 {
    let delta_t = (newest.timestamp - anchor.timestamp) as i128;
    let delta_tick = newest.tick_cumulative as i128 - anchor.tick_cumulative as i128;
    let delta_tick_square = newest.tick_square_cumulative - anchor.tick_square_cumulative;

    let mean_tick = delta_tick / delta_t;
    delta_tick_square / delta_t - mean_tick * mean_tick
}

/// Realized variance from the entry at-or-before `target` up to the newest entry.
pub fn calculate_vol(
    buffer: &ObservationBuffer,
    write_counter: u64,
    target: i64,
) -> Result<i128, OracleError> {
    let newest = buffer.at(write_counter);
    let oldest = buffer.at(buffer.oldest_logical(write_counter));

    if target < oldest.timestamp {
        return Err(OracleError::TargetTooOld {
            target,
            oldest: oldest.timestamp,
        });
    }
    if target >= newest.timestamp {
        return Err(OracleError::NoNewObservations {
            target,
            newest: newest.timestamp,
        });
    }

    let idx = index_before_or_at(buffer, write_counter, target)?;
    Ok(realized_variance(&buffer.at(idx), &newest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(ts: i64, tick_cumulative: i64, tick_square_cumulative: i128) -> DerivedObservation {
        DerivedObservation {
            timestamp: ts,
            tick_cumulative,
            tick_square_cumulative,
        }
    }

    #[test]
    fn test_constant_tick_has_zero_variance() {
        assert_eq!(realized_variance(&obs(0, 0, 0), &obs(10, 70, 490)), 0);
    }

    #[test]
    fn test_alternating_ticks() {
        // ticks 1 then 3: E[t^2] = 5, E[t] = 2
        assert_eq!(realized_variance(&obs(0, 1001, 0), &obs(2, 1005, 10)), 1);
    }

    #[test]
    fn test_truncation_order() {
        // ticks 1 then 4: mean 5/2 -> 2, second moment 17/2 -> 8
        assert_eq!(realized_variance(&obs(0, 1001, 0), &obs(2, 1006, 17)), 4);
    }

    #[test]
    fn test_boundary_errors() {
        let mut buffer = ObservationBuffer::new(8);
        buffer.write(0, obs(100, 0, 0));
        buffer.write(1, obs(101, 1, 1));

        assert_eq!(
            calculate_vol(&buffer, 1, 99),
            Err(OracleError::TargetTooOld {
                target: 99,
                oldest: 100
            })
        );
        assert_eq!(
            calculate_vol(&buffer, 1, 101),
            Err(OracleError::NoNewObservations {
                target: 101,
                newest: 101
            })
        );
        assert_eq!(calculate_vol(&buffer, 1, 100), Ok(0));
    }
}
