use crate::domain::errors::OracleError;
use crate::domain::oracle::buffer::ObservationBuffer;

/// Greatest retained logical position whose timestamp is `<= target`.
///
/// Targets at or past the newest entry clamp to the newest position. Equal
/// timestamps resolve to the highest matching position.
pub fn index_before_or_at(
    buffer: &ObservationBuffer,
    write_counter: u64,
    target: i64,
) -> Result<u64, OracleError> {
    let mut lo = buffer.oldest_logical(write_counter);
    let mut hi = write_counter;

    let oldest = buffer.at(lo).timestamp;
    if target < oldest {
        return Err(OracleError::TargetTooOld { target, oldest });
    }
    if target >= buffer.at(hi).timestamp {
        return Ok(hi);
    }

    // ts(lo) <= target < ts(hi)
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if buffer.at(mid).timestamp <= target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}
