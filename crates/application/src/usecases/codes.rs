use chrono::{DateTime, Utc};
use rand::{Rng, distributions::Alphanumeric};

const SUFFIX_LEN: usize = 6;

fn code(prefix: &str, at: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();
    format!("{prefix}-{}-{suffix}", at.format("%Y%m%d"))
}

/// Human-readable reservation code, e.g. `RES-20260310-K3Q9ZD`.
pub fn reservation_code(at: DateTime<Utc>) -> String {
    code("RES", at)
}

/// Human-readable payment code, e.g. `PAY-20260310-7TRM2A`.
pub fn payment_code(at: DateTime<Utc>) -> String {
    code("PAY", at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn codes_carry_prefix_date_and_uppercase_suffix() {
        let at = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        let code = reservation_code(at);

        assert!(code.starts_with("RES-20260310-"), "{code}");
        let suffix = code.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert!(payment_code(at).starts_with("PAY-20260310-"));
    }
}
