//! Currency codes and display formatting

use crate::error::{RateCacheError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ISO-4217-style currency code (three ASCII letters, upper case)
///
/// Any well-formed code is accepted, whether or not a rate exists for it;
/// lookups for codes missing from a rate table fall back to parity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

/// The currency every rate is quoted against
pub const BASE_CURRENCY: CurrencyCode = CurrencyCode::USD;

impl CurrencyCode {
    pub const USD: CurrencyCode = CurrencyCode(*b"USD");
    pub const MYR: CurrencyCode = CurrencyCode(*b"MYR");
    pub const EUR: CurrencyCode = CurrencyCode(*b"EUR");
    pub const GBP: CurrencyCode = CurrencyCode(*b"GBP");
    pub const SGD: CurrencyCode = CurrencyCode(*b"SGD");
    pub const JPY: CurrencyCode = CurrencyCode(*b"JPY");

    /// Parse a code, trimming whitespace and upper-casing it
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(RateCacheError::InvalidCurrencyCode(s.to_string()));
        }
        let mut code = [0u8; 3];
        for (dst, src) in code.iter_mut().zip(bytes) {
            *dst = src.to_ascii_uppercase();
        }
        Ok(CurrencyCode(code))
    }

    /// Get the code as a string slice
    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    /// Catalogue entry, if this is a currency the application knows about
    pub fn info(&self) -> Option<&'static CurrencyInfo> {
        KNOWN_CURRENCIES.iter().find(|info| info.code == self.as_str())
    }

    /// Display symbol, falling back to the code itself
    pub fn symbol(&self) -> &str {
        match self.info() {
            Some(info) => info.symbol,
            None => self.as_str(),
        }
    }

    /// Number of digits after the decimal point when displaying amounts
    pub fn minor_digits(&self) -> usize {
        self.info().map(|info| info.minor_digits).unwrap_or(2)
    }

    pub fn is_base(&self) -> bool {
        *self == BASE_CURRENCY
    }
}

impl FromStr for CurrencyCode {
    type Err = RateCacheError;

    fn from_str(s: &str) -> Result<Self> {
        CurrencyCode::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = RateCacheError;

    fn try_from(value: String) -> Result<Self> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrencyCode({})", self.as_str())
    }
}

/// Static description of a currency the application offers in its pickers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub minor_digits: usize,
}

/// Currencies offered to users, in picker order
pub const KNOWN_CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo { code: "USD", name: "US Dollar", symbol: "$", minor_digits: 2 },
    CurrencyInfo { code: "MYR", name: "Malaysian Ringgit", symbol: "RM", minor_digits: 2 },
    CurrencyInfo { code: "EUR", name: "Euro", symbol: "€", minor_digits: 2 },
    CurrencyInfo { code: "GBP", name: "British Pound", symbol: "£", minor_digits: 2 },
    CurrencyInfo { code: "SGD", name: "Singapore Dollar", symbol: "S$", minor_digits: 2 },
    CurrencyInfo { code: "JPY", name: "Japanese Yen", symbol: "¥", minor_digits: 0 },
    CurrencyInfo { code: "CNY", name: "Chinese Yuan", symbol: "CN¥", minor_digits: 2 },
    CurrencyInfo { code: "AUD", name: "Australian Dollar", symbol: "A$", minor_digits: 2 },
    CurrencyInfo { code: "CAD", name: "Canadian Dollar", symbol: "C$", minor_digits: 2 },
    CurrencyInfo { code: "CHF", name: "Swiss Franc", symbol: "CHF", minor_digits: 2 },
    CurrencyInfo { code: "HKD", name: "Hong Kong Dollar", symbol: "HK$", minor_digits: 2 },
    CurrencyInfo { code: "IDR", name: "Indonesian Rupiah", symbol: "Rp", minor_digits: 0 },
    CurrencyInfo { code: "THB", name: "Thai Baht", symbol: "฿", minor_digits: 2 },
    CurrencyInfo { code: "INR", name: "Indian Rupee", symbol: "₹", minor_digits: 2 },
    CurrencyInfo { code: "KRW", name: "South Korean Won", symbol: "₩", minor_digits: 0 },
    CurrencyInfo { code: "PHP", name: "Philippine Peso", symbol: "₱", minor_digits: 2 },
    CurrencyInfo { code: "VND", name: "Vietnamese Dong", symbol: "₫", minor_digits: 0 },
    CurrencyInfo { code: "NZD", name: "New Zealand Dollar", symbol: "NZ$", minor_digits: 2 },
];

/// Codes of every catalogue currency
pub fn known_codes() -> Vec<CurrencyCode> {
    KNOWN_CURRENCIES
        .iter()
        .filter_map(|info| CurrencyCode::parse(info.code).ok())
        .collect()
}

/// Format an amount for display, e.g. `$1,234.50`, `RM 470.00`, `¥1,200`
pub fn format_amount(amount: f64, code: CurrencyCode) -> String {
    let digits = code.minor_digits();
    let fixed = format!("{:.*}", digits, amount.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    let symbol = code.symbol();
    let separator = if symbol.chars().all(|c| c.is_ascii_alphabetic()) {
        " "
    } else {
        ""
    };
    let sign = if amount < 0.0 && grouped.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    format!("{}{}{}{}", sign, symbol, separator, grouped)
}
