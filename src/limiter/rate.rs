//! Rate strings.
//!
//! A rate is written `count/[multiplier]unit`, e.g. `5/s`, `100/m` or
//! `10/5m`. The unit is one of `s`, `m`, `h`, `d` (case-insensitive) and
//! defaults to seconds when omitted.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateSpecError {
    #[error("rate '{0}' is not of the form count/period")]
    Format(String),
    #[error("rate '{0}' allows zero requests")]
    ZeroCount(String),
    #[error("rate '{0}' has a zero-length period")]
    ZeroPeriod(String),
    #[error("rate '{0}' has unknown unit '{1}'")]
    Unit(String, char),
}

/// A parsed rate: `count` requests per `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSpec {
    pub count: u32,
    pub period: Duration,
}

impl FromStr for RateSpec {
    type Err = RateSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = || RateSpecError::Format(s.to_string());

        let (count, period) = s.trim().split_once('/').ok_or_else(format)?;
        let count: u32 = count.parse().map_err(|_| format())?;

        let digits = period.len() - period.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let (multiplier, unit) = period.split_at(digits);
        let multiplier: u64 = if multiplier.is_empty() {
            1
        } else {
            multiplier.parse().map_err(|_| format())?
        };

        let mut chars = unit.chars();
        let seconds: u64 = match (chars.next(), chars.next()) {
            (None, _) => 1,
            (Some(c), None) => match c.to_ascii_lowercase() {
                's' => 1,
                'm' => 60,
                'h' => 3_600,
                'd' => 86_400,
                other => return Err(RateSpecError::Unit(s.to_string(), other)),
            },
            _ => return Err(format()),
        };

        if count == 0 {
            return Err(RateSpecError::ZeroCount(s.to_string()));
        }
        if multiplier == 0 {
            return Err(RateSpecError::ZeroPeriod(s.to_string()));
        }

        Ok(Self {
            count,
            period: Duration::from_secs(seconds.saturating_mul(multiplier)),
        })
    }
}

impl fmt::Display for RateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}s", self.count, self.period.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let r: RateSpec = "5/s".parse().unwrap();
        assert_eq!(r.count, 5);
        assert_eq!(r.period, Duration::from_secs(1));

        let r: RateSpec = "100/10M".parse().unwrap();
        assert_eq!(r.count, 100);
        assert_eq!(r.period, Duration::from_secs(600));

        let r: RateSpec = "3/".parse().unwrap();
        assert_eq!(r.period, Duration::from_secs(1));

        let r: RateSpec = "7/2".parse().unwrap();
        assert_eq!(r.period, Duration::from_secs(2));

        let r: RateSpec = "1/d".parse().unwrap();
        assert_eq!(r.to_string(), "1/86400s");
    }

    #[test]
    fn test_unit_multiplier() {
        let r: RateSpec = "10/2h".parse().unwrap();
        assert_eq!(r.period, Duration::from_secs(7_200));

        let r: RateSpec = "1/18446744073709551615h".parse().unwrap();
        assert_eq!(r.period, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_errors() {
        assert!(matches!("fast".parse::<RateSpec>(), Err(RateSpecError::Format(_))));
        assert!(matches!("x/s".parse::<RateSpec>(), Err(RateSpecError::Format(_))));
        assert!(matches!("5/ss".parse::<RateSpec>(), Err(RateSpecError::Format(_))));
        assert!(matches!("0/s".parse::<RateSpec>(), Err(RateSpecError::ZeroCount(_))));
        assert!(matches!("5/0m".parse::<RateSpec>(), Err(RateSpecError::ZeroPeriod(_))));
        assert!(matches!("5/w".parse::<RateSpec>(), Err(RateSpecError::Unit(_, 'w'))));
    }
}
