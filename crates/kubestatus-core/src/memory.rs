/// Bytes in one gibibyte
const GIB: f64 = 1_073_741_824.0;

/// Binary suffixes and their byte multipliers
const SUFFIXES: [(&str, f64); 3] = [
    ("Ki", 1024.0),
    ("Mi", 1024.0 * 1024.0),
    ("Gi", 1024.0 * 1024.0 * 1024.0),
];

/// Convert a Kubernetes memory quantity (`16318412Ki`, `512Mi`, `8Gi` or a raw
/// byte count) to whole gibibytes.
///
/// Rounds half away from zero (`f64::round`). Returns `None` for empty input,
/// and logs a warning and returns `None` when the number itself is malformed.
pub fn quantity_to_gib(quantity: &str) -> Option<i64> {
    let quantity = quantity.trim();
    if quantity.is_empty() {
        return None;
    }

    let (number, multiplier) = SUFFIXES
        .iter()
        .find_map(|(suffix, multiplier)| {
            quantity
                .strip_suffix(suffix)
                .map(|number| (number, *multiplier))
        })
        .unwrap_or((quantity, 1.0));

    match number.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some((value * multiplier / GIB).round() as i64),
        _ => {
            tracing::warn!(quantity, "failed to convert memory quantity");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_bytes() {
        assert_eq!(quantity_to_gib("1073741824"), Some(1));
        assert_eq!(quantity_to_gib("0"), Some(0));
    }

    #[test]
    fn test_binary_suffixes() {
        assert_eq!(quantity_to_gib("1048576Ki"), Some(1));
        assert_eq!(quantity_to_gib("1048576Mi"), Some(1024));
        assert_eq!(quantity_to_gib("1Gi"), Some(1));
        assert_eq!(quantity_to_gib("5120Gi"), Some(5120));
    }

    #[test]
    fn test_typical_node_capacity() {
        // 16318412Ki is ~15.56 GiB
        assert_eq!(quantity_to_gib("16318412Ki"), Some(16));
        assert_eq!(quantity_to_gib("  8Gi "), Some(8));
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        assert_eq!(quantity_to_gib("1536Mi"), Some(2));
        assert_eq!(quantity_to_gib("1535Mi"), Some(1));
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(quantity_to_gib(""), None);
        assert_eq!(quantity_to_gib("   "), None);
    }

    #[test]
    fn test_malformed_is_none() {
        assert_eq!(quantity_to_gib("abcKi"), None);
        assert_eq!(quantity_to_gib("Ki"), None);
        assert_eq!(quantity_to_gib("NaN"), None);
        assert_eq!(quantity_to_gib("inf"), None);
    }
}
