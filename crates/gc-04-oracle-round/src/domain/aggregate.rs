//! # Aggregation
//!
//! Every oracle runs the same function over the same reveal set, so all
//! honest oracles sign the same hash without talking to each other.
//!
//! | Type | Rule |
//! |------|------|
//! | `int64` | arithmetic mean, rounded half away from zero |
//! | `string`, `bytes` | most frequent value, ties to the smallest |

use super::errors::{OracleError, OracleResult};
use shared_types::{sha256, Hash, Value, ValueType};
use std::collections::BTreeMap;
use tracing::debug;

/// Decode raw reveals and aggregate them. Undecodable reveals are skipped.
pub fn aggregate(value_type: ValueType, pulse_height: u64, reveals: &[Vec<u8>]) -> OracleResult<Value> {
    let values: Vec<Value> = reveals
        .iter()
        .filter_map(|raw| match Value::decode(value_type, raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("[gc-04] skipping undecodable reveal: {}", e);
                None
            }
        })
        .collect();

    if values.is_empty() {
        return Err(OracleError::NoReveals(pulse_height));
    }

    Ok(match value_type {
        ValueType::Int64 => Value::Int64(mean(&values)),
        ValueType::String | ValueType::Bytes => majority(values),
    })
}

/// Hash published for an aggregated value.
pub fn result_hash(value: &Value) -> Hash {
    sha256(&value.encode())
}

fn mean(values: &[Value]) -> i64 {
    let sum: i128 = values
        .iter()
        .map(|v| match v {
            Value::Int64(n) => i128::from(*n),
            _ => 0,
        })
        .sum();
    let n = values.len() as i128;
    let (quotient, remainder) = (sum / n, sum % n);
    let rounded = if 2 * remainder.abs() >= n {
        quotient + sum.signum()
    } else {
        quotient
    };
    // The mean of i64 values always fits in i64.
    rounded as i64
}

fn majority(values: Vec<Value>) -> Value {
    let mut counts: BTreeMap<Value, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut best: Option<(Value, usize)> = None;
    for (value, count) in counts {
        if best.as_ref().map_or(true, |(_, c)| count > *c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value).unwrap_or(Value::Bytes(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Vec<u8>> {
        values.iter().map(|v| Value::Int64(*v).encode()).collect()
    }

    #[test]
    fn test_mean_of_five_reveals() {
        let value = aggregate(ValueType::Int64, 1, &ints(&[10, 12, 11, 9, 13])).unwrap();
        assert_eq!(value, Value::Int64(11));
    }

    #[test]
    fn test_reveal_order_does_not_change_hash() {
        let a = aggregate(ValueType::Int64, 1, &ints(&[10, 12, 11, 9, 13])).unwrap();
        let b = aggregate(ValueType::Int64, 1, &ints(&[13, 9, 11, 12, 10])).unwrap();
        assert_eq!(result_hash(&a), result_hash(&b));
    }

    #[test]
    fn test_mean_rounds_half_away_from_zero() {
        assert_eq!(
            aggregate(ValueType::Int64, 1, &ints(&[1, 2])).unwrap(),
            Value::Int64(2)
        );
        assert_eq!(
            aggregate(ValueType::Int64, 1, &ints(&[-1, -2])).unwrap(),
            Value::Int64(-2)
        );
        assert_eq!(
            aggregate(ValueType::Int64, 1, &ints(&[1, 1, 2])).unwrap(),
            Value::Int64(1)
        );
    }

    #[test]
    fn test_mean_does_not_overflow() {
        let value = aggregate(ValueType::Int64, 1, &ints(&[i64::MAX, i64::MAX])).unwrap();
        assert_eq!(value, Value::Int64(i64::MAX));
    }

    #[test]
    fn test_majority_with_tie_picks_smallest() {
        let reveals: Vec<Vec<u8>> = ["b", "a", "b", "a", "c"]
            .iter()
            .map(|s| Value::String(s.to_string()).encode())
            .collect();
        assert_eq!(
            aggregate(ValueType::String, 1, &reveals).unwrap(),
            Value::String("a".into())
        );
    }

    #[test]
    fn test_majority_of_bytes() {
        let reveals = vec![vec![2], vec![1], vec![2]];
        assert_eq!(
            aggregate(ValueType::Bytes, 1, &reveals).unwrap(),
            Value::Bytes(vec![2])
        );
    }

    #[test]
    fn test_bad_reveals_are_skipped() {
        let mut reveals = ints(&[4, 6]);
        reveals.push(vec![1, 2, 3]);
        assert_eq!(
            aggregate(ValueType::Int64, 1, &reveals).unwrap(),
            Value::Int64(5)
        );
    }

    #[test]
    fn test_no_reveals() {
        assert!(matches!(
            aggregate(ValueType::Int64, 9, &[vec![1]]),
            Err(OracleError::NoReveals(9))
        ));
    }
}
