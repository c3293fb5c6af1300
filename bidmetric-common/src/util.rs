//! Utility functions for BidMetric services.

const LAKH: f64 = 100_000.0;
const CRORE: f64 = 10_000_000.0;

/// Format a rupee amount using Indian units (Cr, L).
///
/// Amounts below one lakh are printed with Indian digit grouping
/// (`12,34,567` style for the thousands and hundreds groups).
pub fn format_inr(amount: f64) -> String {
    if amount >= CRORE {
        format!("₹{:.2} Cr", amount / CRORE)
    } else if amount >= LAKH {
        format!("₹{:.2} L", amount / LAKH)
    } else {
        format!("₹{}", group_indian_digits(amount.round() as u64))
    }
}

/// Group digits the Indian way: last three, then pairs.
fn group_indian_digits(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Format a percentage with an explicit sign and one decimal, e.g. `+15.0%`.
pub fn format_signed_pct(pct: f64) -> String {
    let rounded = round_to(pct, 1);
    if rounded >= 0.0 {
        format!("+{:.1}%", rounded.abs())
    } else {
        format!("{:.1}%", rounded)
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
