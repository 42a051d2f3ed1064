//! Property tests for unit conversion.

use pdf_quill::geometry::{points_to_units, units_to_points, Size, Unit};
use proptest::prelude::*;

fn unit() -> impl Strategy<Value = Unit> {
    prop_oneof![
        Just(Unit::Point),
        Just(Unit::Millimeter),
        Just(Unit::Centimeter),
        Just(Unit::Inch),
        Just(Unit::Pixel),
    ]
}

proptest! {
    #[test]
    fn units_round_trip(unit in unit(), value in -1.0e6f64..1.0e6) {
        let back = points_to_units(unit, units_to_points(unit, value));
        prop_assert!((back - value).abs() <= 1e-9 * value.abs().max(1.0));
    }

    #[test]
    fn sizes_round_trip(unit in unit(), w in 0.1f64..5000.0, h in 0.1f64..5000.0) {
        let size = Size::new(w, h).to_points(unit).to_units(unit);
        prop_assert!((size.w - w).abs() <= 1e-9 * w);
        prop_assert!((size.h - h).abs() <= 1e-9 * h);
    }

    #[test]
    fn unit_names_parse_back(unit in unit()) {
        prop_assert_eq!(unit.as_str().parse::<Unit>().unwrap(), unit);
    }
}
