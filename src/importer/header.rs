/// Normalize a raw column header into a canonical lookup key:
/// lowercase, runs of whitespace/punctuation collapsed to single underscores.
///
/// "EI Site ID" -> "ei_site_id". Pure and deterministic, so the same sheet
/// always yields the same column map.
pub fn canonical_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            if pending_separator && !key.is_empty() {
                key.push('_');
            }
            pending_separator = false;
            for lower in c.to_lowercase() {
                key.push(lower);
            }
        } else {
            pending_separator = true;
        }
    }

    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_case_and_whitespace() {
        assert_eq!(canonical_key("EI Site ID"), "ei_site_id");
        assert_eq!(canonical_key("ei_site_id"), "ei_site_id");
        assert_eq!(canonical_key(" EI   Site ID "), "ei_site_id");
    }

    #[test]
    fn punctuation_becomes_single_separator() {
        assert_eq!(canonical_key("risk_assessment"), "risk_assessment");
        assert_eq!(canonical_key("Risk-Assessment"), "risk_assessment");
        assert_eq!(canonical_key("Site  --  Name"), "site_name");
    }

    #[test]
    fn leading_and_trailing_separators_are_dropped() {
        assert_eq!(canonical_key("  (zm)  "), "zm");
        assert_eq!(canonical_key("___"), "");
        assert_eq!(canonical_key(""), "");
    }
}
