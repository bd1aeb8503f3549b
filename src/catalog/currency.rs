//! Display prices in the shopper's currency.
//!
//! Catalog prices are stored in USD and converted at a fixed rate for display.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Fixed USD -> BDT rate used for storefront display.
pub const BDT_PER_USD: Decimal = Decimal::from_parts(110, 0, 0, false, 0);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Bdt,
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self { Self::Bdt => "BDT", Self::Usd => "USD" }
    }

    pub fn symbol(&self) -> &'static str {
        match self { Self::Bdt => "৳", Self::Usd => "$" }
    }

    pub fn rate(&self) -> Decimal {
        match self { Self::Bdt => BDT_PER_USD, Self::Usd => Decimal::ONE }
    }

    fn decimals(&self) -> u32 {
        match self { Self::Bdt => 0, Self::Usd => 2 }
    }

    pub fn convert(&self, usd: Decimal) -> Decimal { usd * self.rate() }

    /// Converts, rounds half away from zero and groups thousands, e.g. `৳1,100`.
    /// `None` renders as zero.
    pub fn format(&self, usd: Option<Decimal>) -> String {
        let decimals = self.decimals();
        let amount = self
            .convert(usd.unwrap_or(Decimal::ZERO))
            .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
        let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
        let abs = amount.abs();
        let whole = abs.trunc().normalize().to_string();
        let mut out = format!("{sign}{}{}", self.symbol(), group_thousands(&whole));
        if decimals > 0 {
            let frac = (abs.fract() * Decimal::from(10u64.pow(decimals))).trunc().to_u64().unwrap_or(0);
            out.push_str(&format!(".{:0width$}", frac, width = decimals as usize));
        }
        out
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.code()) }
}

impl FromStr for Currency {
    type Err = UnknownCurrency;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BDT" => Ok(Self::Bdt),
            "USD" => Ok(Self::Usd),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown currency {0}")]
pub struct UnknownCurrency(pub String);

/// Formats a USD amount in the default storefront currency.
pub fn format_price(usd: Option<Decimal>) -> String { Currency::default().format(usd) }

/// Converts a USD amount to the default storefront currency without formatting.
pub fn convert_price(usd: Option<Decimal>) -> Decimal { Currency::default().convert(usd.unwrap_or(Decimal::ZERO)) }

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 { out.push(','); }
        out.push(c);
    }
    out
}
