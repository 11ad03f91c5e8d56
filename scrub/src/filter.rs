//! The cleaning predicate: keep positive, non-prime amounts.

use crate::types::SalesRecord;

/// Returns whether `n` is prime.
///
/// Values below 2 are not prime. Trial division up to the square root is
/// plenty for the amounts this pipeline sees.
pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let mut divisor = 3;
    while divisor <= n / divisor {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }

    true
}

/// Returns whether an amount belongs in the clean table.
///
/// True iff the amount is strictly positive and not prime. 1 passes: it is
/// positive and not prime. Zero and negatives fail the positivity clause.
pub fn is_clean_amount(amount: i64) -> bool {
    amount > 0 && !is_prime(amount)
}

/// Applies the cleaning predicate to a fetched batch, keeping clean rows.
///
/// Stateless and total; preserves the relative order of the input.
pub fn clean_records(records: Vec<SalesRecord>) -> Vec<SalesRecord> {
    records
        .into_iter()
        .filter(|record| is_clean_amount(record.amount))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primality_matches_trial_division() {
        for n in -10..200i64 {
            let expected = n > 1 && (2..n).all(|d| n % d != 0);
            assert_eq!(is_prime(n), expected, "disagreement at {n}");
        }
    }

    #[test]
    fn one_is_clean() {
        assert!(is_clean_amount(1));
    }

    #[test]
    fn non_positive_amounts_are_dirty() {
        assert!(!is_clean_amount(0));
        assert!(!is_clean_amount(-4));
        assert!(!is_clean_amount(-7));
    }

    #[test]
    fn primes_are_dirty_composites_are_clean() {
        assert!(!is_clean_amount(2));
        assert!(!is_clean_amount(7));
        assert!(!is_clean_amount(97));
        assert!(is_clean_amount(4));
        assert!(is_clean_amount(9));
        assert!(is_clean_amount(100));
    }

    #[test]
    fn clean_records_keeps_order_and_filters() {
        let records = vec![
            SalesRecord::new(1, 10, "Alice", 7),
            SalesRecord::new(2, 10, "Alice", 8),
            SalesRecord::new(3, 20, "Bob", 9),
            SalesRecord::new(4, 20, "Bob", 4),
        ];

        let clean = clean_records(records);
        let row_ids: Vec<i64> = clean.iter().map(|r| r.row_id).collect();
        assert_eq!(row_ids, vec![2, 3, 4]);
    }
}
