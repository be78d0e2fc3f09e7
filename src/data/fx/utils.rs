//! FX utilities - batch conversions and multi-currency totals

use super::table::RateTable;
use crate::currency::CurrencyCode;

/// Convert several amounts into one target currency
pub fn convert_amounts(
    table: &RateTable,
    amounts: &[(f64, CurrencyCode)],
    to_currency: CurrencyCode,
) -> Vec<f64> {
    amounts
        .iter()
        .map(|(amount, from)| table.convert(*amount, *from, to_currency))
        .collect()
}

/// Sum balances held in different currencies, expressed in `to_currency`
///
/// Typical use: the dashboard total across accounts, shown in the user's
/// preferred currency.
pub fn total_in(
    table: &RateTable,
    balances: &[(f64, CurrencyCode)],
    to_currency: CurrencyCode,
) -> f64 {
    convert_amounts(table, balances, to_currency).iter().sum()
}

/// Codes in `balances` that the table has no rate for (and so convert at parity)
pub fn unpriced_codes(table: &RateTable, balances: &[(f64, CurrencyCode)]) -> Vec<CurrencyCode> {
    let mut missing: Vec<CurrencyCode> = balances
        .iter()
        .map(|(_, code)| *code)
        .filter(|code| !table.contains(*code))
        .collect();
    missing.sort();
    missing.dedup();
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> RateTable {
        RateTable::from_quotes([
            (CurrencyCode::MYR, 4.7),
            (CurrencyCode::EUR, 0.92),
            (CurrencyCode::GBP, 0.79),
        ])
        .unwrap()
    }

    #[test]
    fn test_convert_amounts() {
        let converted = convert_amounts(
            &table(),
            &[(470.0, CurrencyCode::MYR), (92.0, CurrencyCode::EUR), (5.0, CurrencyCode::USD)],
            CurrencyCode::USD,
        );

        assert_eq!(converted.len(), 3);
        assert_relative_eq!(converted[0], 100.0, epsilon = 1e-9);
        assert_relative_eq!(converted[1], 100.0, epsilon = 1e-9);
        assert_relative_eq!(converted[2], 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_total_across_accounts() {
        let balances = [
            (1000.0, CurrencyCode::MYR),
            (100.0, CurrencyCode::USD),
            (50.0, CurrencyCode::EUR),
        ];

        // 1000 + 470 + 50 / 0.92 * 4.7
        let total = total_in(&table(), &balances, CurrencyCode::MYR);
        assert_relative_eq!(total, 1725.434_782_6, epsilon = 1e-6);
    }

    #[test]
    fn test_total_of_nothing() {
        assert_eq!(total_in(&table(), &[], CurrencyCode::USD), 0.0);
    }

    #[test]
    fn test_unpriced_codes() {
        let zzz = CurrencyCode::parse("ZZZ").unwrap();
        let missing = unpriced_codes(
            &table(),
            &[(1.0, zzz), (2.0, CurrencyCode::MYR), (3.0, zzz), (4.0, CurrencyCode::JPY)],
        );
        assert_eq!(missing, vec![CurrencyCode::JPY, zzz]);
    }
}
