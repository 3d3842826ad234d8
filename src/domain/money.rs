use std::fmt;

/// Money is represented as whole Tanzanian shillings. The shilling has no
/// minor unit in retail practice, so 15000 means "15,000 Tsh" exactly and
/// no floating point is involved anywhere.
pub type Tsh = i64;

/// Format an amount with thousands separators.
/// Example: 15000 -> "15,000", -2500 -> "-2,500"
pub fn format_tsh(amount: Tsh) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let digits = amount.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped)
}

/// Parse an amount string into shillings.
/// Accepts plain integers and comma-grouped input: "15000", "15,000".
pub fn parse_tsh(input: &str) -> Result<Tsh, ParseTshError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseTshError::InvalidFormat);
    }

    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');

    let cleaned: String = input.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseTshError::InvalidFormat);
    }

    let amount: i64 = cleaned.parse().map_err(|_| ParseTshError::InvalidFormat)?;
    Ok(if negative { -amount } else { amount })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTshError {
    InvalidFormat,
}

impl fmt::Display for ParseTshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseTshError::InvalidFormat => write!(f, "invalid amount format"),
        }
    }
}

impl std::error::Error for ParseTshError {}
