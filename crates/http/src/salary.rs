//! Salary display helpers

/// Symbol for a currency code, or the code itself when unknown
pub fn currency_symbol(code: &str) -> &str {
    match code {
        "USD" | "MXN" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "CAD" => "C$",
        "AUD" => "A$",
        "JPY" | "CNY" => "¥",
        "CHF" => "CHF",
        "INR" => "₹",
        other => other,
    }
}

/// Salary range prefixed with its currency symbol; empty when no range is set
pub fn format_salary(salary_range: Option<&str>, currency_code: &str) -> String {
    match salary_range {
        Some(range) if !range.is_empty() => format!("{}{range}", currency_symbol(currency_code)),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_currencies() {
        assert_eq!(currency_symbol("GBP"), "£");
        assert_eq!(currency_symbol("CAD"), "C$");
        assert_eq!(currency_symbol("SEK"), "SEK");
    }

    #[test]
    fn formats_only_present_ranges() {
        assert_eq!(format_salary(Some("80k-100k"), "EUR"), "€80k-100k");
        assert_eq!(format_salary(None, "USD"), "");
        assert_eq!(format_salary(Some(""), "USD"), "");
    }
}
