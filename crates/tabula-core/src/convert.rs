//! Value conversion between user-entered text, stored values and display text.
//!
//! Search direction: [`ValueConverter::to_query_value`] turns a raw search term
//! into the typed value a condition compares against. Display direction:
//! [`ValueConverter::to_display`] formats a stored value for a special column.
//! Both are pure apart from lookup conversion, which asks the store.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::ConversionError;
use crate::profile::{ConversionKind, LeaseTermTable, SpecialFormat};
use crate::store::{Combine, Condition, EntityQuery, Operator, RecordStore};
use crate::types::{FieldValue, LanguageTag, NumberFormat};

static LEASE_TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(\d{1,3})\s*(months?|mos?|m|mois|years?|yrs?|y|ans?|ann[ée]es?)?\.?\s*$",
    )
    .expect("lease term pattern compiles")
});

/// Currency codes accepted next to an amount. Upper case only.
const CURRENCY_CODES: &str = "USD|CAD|EUR|GBP|JPY|CHF|AUD|NZD|MXN|CNY|SEK|NOK|DKK";

static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    let unit = format!(r"(?:[$€£¥]|{CURRENCY_CODES})");
    Regex::new(&format!(
        r"^(\()?\s*([-+])?\s*{unit}?\s*([-+])?\s*(\d[\d.,'\s\u{{a0}}\u{{202f}}]*?)\s*{unit}?\s*(-)?\s*(\))?$"
    ))
    .expect("currency pattern compiles")
});

/// Converts values for one profile. Cheap to construct; borrows the profile's
/// lease-term table.
#[derive(Debug, Clone, Copy)]
pub struct ValueConverter<'a> {
    lease_terms: &'a LeaseTermTable,
    currency_symbol: &'a str,
}

impl<'a> ValueConverter<'a> {
    pub fn new(lease_terms: &'a LeaseTermTable, currency_symbol: &'a str) -> Self {
        Self {
            lease_terms,
            currency_symbol,
        }
    }

    /// Convert a raw search term according to `kind`.
    ///
    /// `lang` selects the decimal convention for currency input. Lookup
    /// conversion issues one store query; a store failure comes back as
    /// [`ConversionError::Store`] and must not be swallowed by callers.
    pub fn to_query_value(
        &self,
        raw: &str,
        kind: &ConversionKind,
        lang: &LanguageTag,
        store: &dyn RecordStore,
    ) -> Result<FieldValue, ConversionError> {
        match kind {
            ConversionKind::None => Ok(FieldValue::Text(raw.to_string())),
            ConversionKind::CurrencyToNumber => {
                parse_currency(raw, lang.number_format()).map(FieldValue::Number)
            }
            ConversionKind::LeaseTerm => self
                .encode_lease_term(raw)
                .map(|code| FieldValue::Number(Decimal::from(code))),
            ConversionKind::LookupByDisplayName { entity, name_field } => {
                resolve_lookup(raw, entity, name_field, store)
            }
        }
    }

    /// Format a stored value for a special column.
    ///
    /// Returns an error when the value does not fit the format (a text value
    /// in a currency column, an unknown lease code); the renderer then falls
    /// back to the plain display form.
    pub fn to_display(
        &self,
        value: &FieldValue,
        format: SpecialFormat,
        lang: &LanguageTag,
    ) -> Result<String, ConversionError> {
        match (format, value) {
            (SpecialFormat::LeaseTerm, FieldValue::Number(n)) => self.decode_lease_term(*n, lang),
            (SpecialFormat::LeaseTerm, FieldValue::Text(t)) => {
                // Some stores hand option values back as text.
                let n = Decimal::from_str(t.trim())
                    .map_err(|_| ConversionError::UnknownLeaseTerm(t.clone()))?;
                self.decode_lease_term(n, lang)
            }
            (SpecialFormat::Currency, FieldValue::Number(n)) => {
                Ok(format_currency(*n, lang, self.currency_symbol))
            }
            (SpecialFormat::Date, FieldValue::Date(d)) => Ok(format_date(d, lang)),
            (SpecialFormat::Currency, other) => {
                Err(ConversionError::InvalidCurrencyFormat(other.to_string()))
            }
            (SpecialFormat::LeaseTerm, other) => Err(ConversionError::UnknownLeaseTerm(other.to_string())),
            (SpecialFormat::Date, other) => Ok(other.to_string()),
        }
    }

    /// "36 months", "3 years", "36" → stored code.
    pub fn encode_lease_term(&self, raw: &str) -> Result<i64, ConversionError> {
        let unknown = || ConversionError::UnknownLeaseTerm(raw.to_string());
        let caps = LEASE_TERM_RE.captures(raw).ok_or_else(unknown)?;
        let count: u32 = caps[1].parse().map_err(|_| unknown())?;
        let unit = caps.get(2).map(|m| m.as_str().to_lowercase());
        let months = match unit.as_deref() {
            Some(u) if u.starts_with('y') || u.starts_with("an") => count.checked_mul(12).ok_or_else(unknown)?,
            _ => count,
        };
        self.lease_terms
            .by_months(months)
            .map(|t| t.code)
            .ok_or_else(unknown)
    }

    /// Stored code → localised descriptor. Falls back to "N months" in the
    /// requested language when the table has no label for it.
    pub fn decode_lease_term(&self, code: Decimal, lang: &LanguageTag) -> Result<String, ConversionError> {
        let unknown = || ConversionError::UnknownLeaseTerm(code.to_string());
        if !code.fract().is_zero() {
            return Err(unknown());
        }
        let code = code.to_i64().ok_or_else(unknown)?;
        let term = self.lease_terms.by_code(code).ok_or_else(unknown)?;
        Ok(match term.label_for(lang) {
            Some(label) => label.to_string(),
            None if lang.primary() == "fr" => format!("{} mois", term.months),
            None => format!("{} months", term.months),
        })
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

fn resolve_lookup(
    name: &str,
    entity: &str,
    name_field: &str,
    store: &dyn RecordStore,
) -> Result<FieldValue, ConversionError> {
    let query = EntityQuery::new(entity, Combine::And)
        .condition(Condition::single(
            name_field,
            Operator::Equal,
            FieldValue::text(name.trim()),
        ))
        .columns(vec![name_field.to_string()]);

    let mut matches = store.query(&query)?;
    if matches.len() != 1 {
        return Err(ConversionError::LookupNotResolved {
            entity: entity.to_string(),
            name: name.to_string(),
            matches: matches.len(),
        });
    }
    let record = matches.remove(0);
    Ok(FieldValue::Reference {
        entity: record.entity,
        id: record.id,
    })
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Parse a monetary amount written with either decimal convention.
///
/// When both `.` and `,` appear the last one is the decimal mark. A lone
/// separator is the decimal mark if it matches `format.decimal` or is not
/// followed by exactly three digits; otherwise it groups thousands.
pub fn parse_currency(raw: &str, format: NumberFormat) -> Result<Decimal, ConversionError> {
    let invalid = || ConversionError::InvalidCurrencyFormat(raw.to_string());
    let caps = CURRENCY_RE.captures(raw.trim()).ok_or_else(invalid)?;

    let open = caps.get(1).is_some();
    let close = caps.get(6).is_some();
    if open != close {
        return Err(invalid());
    }
    let signs: Vec<&str> = [caps.get(2), caps.get(3), caps.get(5)]
        .into_iter()
        .flatten()
        .map(|m| m.as_str())
        .collect();
    if signs.len() > 1 || (open && !signs.is_empty()) {
        return Err(invalid());
    }
    let negative = open || signs.first() == Some(&"-");

    // Whitespace and apostrophes only ever group digits.
    let body: String = caps[4]
        .chars()
        .filter(|c| !(c.is_whitespace() || *c == '\'' || *c == '\u{a0}' || *c == '\u{202f}'))
        .collect();

    let dots = body.matches('.').count();
    let commas = body.matches(',').count();
    let decimal_mark = match (dots, commas) {
        (0, 0) => None,
        (_, 0) | (0, _) => {
            let sep = if dots > 0 { '.' } else { ',' };
            let count = dots + commas;
            let tail = body.rsplit(sep).next().unwrap_or_default();
            if count == 1 && (sep == format.decimal || tail.len() != 3) {
                Some(sep)
            } else {
                None
            }
        }
        _ => {
            let last_dot = body.rfind('.');
            let last_comma = body.rfind(',');
            if last_dot > last_comma { Some('.') } else { Some(',') }
        }
    };

    let (int_part, frac_part) = match decimal_mark {
        Some(mark) => {
            let (i, f) = body.rsplit_once(mark).ok_or_else(invalid)?;
            (i.to_string(), f.to_string())
        }
        None => (body.clone(), String::new()),
    };
    if !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let digits = ungroup(&int_part).ok_or_else(invalid)?;
    let normalized = if frac_part.is_empty() {
        digits
    } else {
        format!("{digits}.{frac_part}")
    };
    let value = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    Ok(if negative { -value } else { value })
}

/// Strip `.`/`,` grouping from an integer part, requiring groups of three.
fn ungroup(int_part: &str) -> Option<String> {
    if int_part.is_empty() {
        return Some("0".to_string());
    }
    let groups: Vec<&str> = int_part.split(['.', ',']).collect();
    if groups.iter().any(|g| g.is_empty() || !g.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    if groups.len() > 1 {
        let (first, rest) = groups.split_first()?;
        if first.len() > 3 || rest.iter().any(|g| g.len() != 3) {
            return None;
        }
    }
    Some(groups.concat())
}

/// Format an amount with two decimals, the language's separators and the
/// currency symbol (prefixed in English, suffixed otherwise).
pub fn format_currency(value: Decimal, lang: &LanguageTag, symbol: &str) -> String {
    let format = lang.number_format();
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((&text, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(format.group);
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let amount = format!("{sign}{grouped}{}{frac_part}", format.decimal);
    if symbol.is_empty() {
        amount
    } else if lang.primary() == "en" {
        format!("{sign}{symbol}{grouped}.{frac_part}")
    } else {
        format!("{amount}\u{a0}{symbol}")
    }
}

fn format_date(date: &chrono::DateTime<chrono::Utc>, lang: &LanguageTag) -> String {
    match lang.primary() {
        "en" => date.format("%m/%d/%Y").to_string(),
        _ => date.format("%d/%m/%Y").to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
