//! Ticker normalization.
//!
//! Maps loosely typed user input onto the symbols the market-data source
//! expects: bare index names get their `^` prefix and a handful of Paris
//! listings get the `.PA` exchange suffix.

/// Paris-listed tickers that need the `.PA` suffix when typed bare.
const PARIS_LISTINGS: &[&str] = &[
    "AIR", "OR", "MC", "EL", "DG", "BNP", "ACA", "GLE", "RMS", "SAN", "SU", "AI",
];

/// Normalize a raw ticker.
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return raw.to_string();
    }
    let s = raw.trim().to_uppercase();

    match s.as_str() {
        "FCHI" => return "^FCHI".to_string(),
        "GSPC" => return "^GSPC".to_string(),
        _ => {}
    }

    if s.contains('.') || s.starts_with('^') {
        return s;
    }

    if PARIS_LISTINGS.contains(&s.as_str()) {
        return format!("{}.PA", s);
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices() {
        assert_eq!(normalize("gspc"), "^GSPC");
        assert_eq!(normalize(" FCHI "), "^FCHI");
        assert_eq!(normalize("^ixic"), "^IXIC");
    }

    #[test]
    fn test_paris_suffix() {
        assert_eq!(normalize("mc"), "MC.PA");
        assert_eq!(normalize("BNP"), "BNP.PA");
        assert_eq!(normalize("bnp.pa"), "BNP.PA");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(normalize("aapl"), "AAPL");
        assert_eq!(normalize("SAP.DE"), "SAP.DE");
        assert_eq!(normalize("   "), "   ");
        assert_eq!(normalize(""), "");
    }
}
