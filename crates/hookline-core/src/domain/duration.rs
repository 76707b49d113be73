//! Duration strings: `"90s"`, `"1m"`, `"1h30m"`, `"1.5h"`, `"300ms"`.
//!
//! Grammar: optional sign, then one or more `<decimal><unit>` pairs, or the
//! bare string `"0"`. Units: `ns`, `us` (`µs`, `μs`), `ms`, `s`, `m`, `h`.

use chrono::TimeDelta;
use thiserror::Error;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

const UNITS: &[(&str, u64)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", NANOS_PER_SECOND),
    ("m", 60 * NANOS_PER_SECOND),
    ("h", 3_600 * NANOS_PER_SECOND),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid duration")]
pub struct InvalidDuration;

/// Parse a duration string into a signed `TimeDelta` (nanosecond precision).
pub fn parse_duration(input: &str) -> Result<TimeDelta, InvalidDuration> {
    let (negative, mut rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(InvalidDuration);
    }

    let mut total: u64 = 0;
    while !rest.is_empty() {
        let (whole, tail) = split_digits(rest);
        let (fraction, tail) = match tail.strip_prefix('.') {
            Some(after_dot) => split_digits(after_dot),
            None => ("", tail),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(InvalidDuration);
        }

        let unit_len = tail
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or(InvalidDuration)?;

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| InvalidDuration)?
        };
        let mut value = whole.checked_mul(scale).ok_or(InvalidDuration)?;
        value = value
            .checked_add(fraction_nanos(fraction, scale))
            .ok_or(InvalidDuration)?;

        total = total.checked_add(value).ok_or(InvalidDuration)?;
        rest = tail;
    }

    let nanos = i64::try_from(total).map_err(|_| InvalidDuration)?;
    Ok(TimeDelta::nanoseconds(if negative { -nanos } else { nanos }))
}

fn split_digits(s: &str) -> (&str, &str) {
    let n = s.bytes().take_while(u8::is_ascii_digit).count();
    s.split_at(n)
}

/// Digits past the point scaled by the unit. Digits beyond u64 precision are dropped.
fn fraction_nanos(digits: &str, scale: u64) -> u64 {
    let mut numerator: u64 = 0;
    let mut denominator: f64 = 1.0;
    for d in digits.bytes() {
        if numerator > (u64::MAX - 9) / 10 {
            break;
        }
        numerator = numerator * 10 + u64::from(d - b'0');
        denominator *= 10.0;
    }
    (numerator as f64 * (scale as f64 / denominator)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero("0", TimeDelta::zero())]
    #[case::seconds("90s", TimeDelta::seconds(90))]
    #[case::minute("1m", TimeDelta::minutes(1))]
    #[case::compound("1h30m", TimeDelta::minutes(90))]
    #[case::fraction("1.5h", TimeDelta::minutes(90))]
    #[case::leading_dot(".5s", TimeDelta::milliseconds(500))]
    #[case::trailing_dot("2.s", TimeDelta::seconds(2))]
    #[case::millis("300ms", TimeDelta::milliseconds(300))]
    #[case::micros("15µs", TimeDelta::microseconds(15))]
    #[case::nanos("7ns", TimeDelta::nanoseconds(7))]
    #[case::plus("+2m", TimeDelta::minutes(2))]
    #[case::negative("-2m", TimeDelta::minutes(-2))]
    #[case::mixed("1m0.5s", TimeDelta::milliseconds(60_500))]
    fn parses_valid_durations(#[case] input: &str, #[case] expected: TimeDelta) {
        assert_eq!(parse_duration(input), Ok(expected));
    }

    #[rstest]
    #[case::empty("")]
    #[case::sign_only("-")]
    #[case::missing_unit("90")]
    #[case::unknown_unit("3d")]
    #[case::dot_only(".s")]
    #[case::words("soon")]
    #[case::space("1 m")]
    #[case::overflow("9999999999999999999h")]
    fn rejects_invalid_durations(#[case] input: &str) {
        assert_eq!(parse_duration(input), Err(InvalidDuration));
    }
}
