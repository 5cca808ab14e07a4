//! Discount display rule.
//!
//! A location's discount is shown from its numeric bounds when it has any,
//! falling back to the free-text value and then to [`DEFAULT_DISCOUNT`]. The
//! bulk loader stores `discount_value` with the same rule, so both paths
//! always agree.

/// Shown when a location carries neither bounds nor a free-text discount.
pub const DEFAULT_DISCOUNT: &str = "По социальной карте";

/// Render the discount of a location.
///
/// - both bounds, equal: `"10%"`
/// - both bounds, different: `"10-20%"`
/// - a single bound: that bound, `"15%"`
/// - no bounds: `value` when non-empty, [`DEFAULT_DISCOUNT`] otherwise
///
/// Bounds are truncated toward zero before rendering.
pub fn discount_display(min: Option<f64>, max: Option<f64>, value: Option<&str>) -> String {
    if let Some(bounds) = bounds_display(min, max) {
        return bounds;
    }

    value
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_DISCOUNT)
        .to_string()
}

/// Render the numeric bounds alone, `None` when neither is present.
pub(crate) fn bounds_display(min: Option<f64>, max: Option<f64>) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) if min == max => Some(format!("{}%", whole_percent(min))),
        (Some(min), Some(max)) => Some(format!(
            "{}-{}%",
            whole_percent(min),
            whole_percent(max)
        )),
        (Some(bound), None) | (None, Some(bound)) => Some(format!("{}%", whole_percent(bound))),
        (None, None) => None,
    }
}

fn whole_percent(value: f64) -> i64 {
    value.trunc() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_bounds_render_single_percentage() {
        assert_eq!(discount_display(Some(10.0), Some(10.0), Some("free text")), "10%");
    }

    #[test]
    fn different_bounds_render_range() {
        assert_eq!(discount_display(Some(5.0), Some(20.0), None), "5-20%");
    }

    #[test]
    fn single_bound_renders_that_bound() {
        assert_eq!(discount_display(Some(7.0), None, None), "7%");
        assert_eq!(discount_display(None, Some(30.0), None), "30%");
    }

    #[test]
    fn bounds_are_truncated() {
        assert_eq!(discount_display(Some(7.9), Some(12.5), None), "7-12%");
    }

    #[test]
    fn no_bounds_fall_back_to_value() {
        assert_eq!(
            discount_display(None, None, Some("Бесплатный вход")),
            "Бесплатный вход"
        );
    }

    #[test]
    fn empty_value_falls_back_to_default() {
        assert_eq!(discount_display(None, None, Some("")), DEFAULT_DISCOUNT);
        assert_eq!(discount_display(None, None, None), DEFAULT_DISCOUNT);
    }
}
