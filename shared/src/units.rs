use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionUnit {
    Mm,
    #[default]
    Cm,
    M,
    In,
}

impl DimensionUnit {
    pub fn cm_factor(self) -> f64 {
        match self {
            DimensionUnit::Mm => 0.1,
            DimensionUnit::Cm => 1.0,
            DimensionUnit::M => 100.0,
            DimensionUnit::In => 2.54,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mm" => Some(DimensionUnit::Mm),
            "cm" => Some(DimensionUnit::Cm),
            "m" => Some(DimensionUnit::M),
            "in" | "inch" | "inches" => Some(DimensionUnit::In),
            _ => None,
        }
    }
}

/// Width, depth and height as entered by the requester.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub w: Option<f64>,
    pub d: Option<f64>,
    pub h: Option<f64>,
    pub unit: DimensionUnit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimsCm {
    pub w: Option<f64>,
    pub d: Option<f64>,
    pub h: Option<f64>,
}

impl Dimensions {
    pub fn new(w: f64, d: f64, h: f64, unit: DimensionUnit) -> Self {
        Self {
            w: Some(w),
            d: Some(d),
            h: Some(h),
            unit,
        }
    }

    pub fn to_cm(&self) -> DimsCm {
        DimsCm {
            w: normalize_to_cm(self.w, self.unit),
            d: normalize_to_cm(self.d, self.unit),
            h: normalize_to_cm(self.h, self.unit),
        }
    }

    pub fn is_complete(&self) -> bool {
        let dims = self.to_cm();
        dims.w.is_some() && dims.d.is_some() && dims.h.is_some()
    }
}

impl DimsCm {
    pub fn cbm(&self) -> Option<f64> {
        cbm_per_unit(self.w, self.d, self.h)
    }
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Zero, negative and non-finite values count as missing.
pub fn normalize_to_cm(value: Option<f64>, unit: DimensionUnit) -> Option<f64> {
    let value = value.filter(|v| v.is_finite() && *v > 0.0)?;
    Some(value * unit.cm_factor())
}

/// Parses free-form numeric input before normalization.
pub fn parse_dimension(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn cbm_per_unit(w_cm: Option<f64>, d_cm: Option<f64>, h_cm: Option<f64>) -> Option<f64> {
    let (w, d, h) = (w_cm?, d_cm?, h_cm?);
    Some(round3((w / 100.0) * (d / 100.0) * (h / 100.0)))
}

pub fn total_cbm(item_cbm: Option<f64>, quantity: Option<i64>) -> Option<f64> {
    let item_cbm = item_cbm?;
    let quantity = quantity.filter(|q| *q > 0)?;
    Some(round3(item_cbm * quantity as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DimensionUnit::Mm, 250.0, 25.0)]
    #[case(DimensionUnit::Cm, 25.0, 25.0)]
    #[case(DimensionUnit::M, 1.5, 150.0)]
    #[case(DimensionUnit::In, 10.0, 25.4)]
    fn normalizes_with_fixed_factor(#[case] unit: DimensionUnit, #[case] value: f64, #[case] expected: f64) {
        let cm = normalize_to_cm(Some(value), unit).unwrap();
        assert!((cm - expected).abs() < 1e-9, "{cm} != {expected}");
    }

    #[rstest]
    #[case(DimensionUnit::Mm)]
    #[case(DimensionUnit::Cm)]
    #[case(DimensionUnit::M)]
    #[case(DimensionUnit::In)]
    fn zero_and_missing_are_null(#[case] unit: DimensionUnit) {
        assert_eq!(normalize_to_cm(Some(0.0), unit), None);
        assert_eq!(normalize_to_cm(None, unit), None);
        assert_eq!(normalize_to_cm(Some(f64::NAN), unit), None);
    }

    #[test]
    fn parses_numeric_text_only() {
        assert_eq!(parse_dimension(" 24 "), Some(24.0));
        assert_eq!(parse_dimension("twenty"), None);
        assert_eq!(parse_dimension(""), None);
    }

    #[test]
    fn cbm_for_inch_chair() {
        let dims = Dimensions::new(24.0, 18.0, 30.0, DimensionUnit::In).to_cm();
        assert_eq!(dims.cbm(), Some(0.212));
        assert_eq!(cbm_per_unit(Some(60.96), Some(45.72), Some(76.2)), Some(0.212));
    }

    #[test]
    fn cbm_requires_every_dimension() {
        assert_eq!(cbm_per_unit(Some(60.0), None, Some(40.0)), None);
    }

    #[test]
    fn total_cbm_scales_by_quantity() {
        assert_eq!(total_cbm(Some(0.212), Some(5)), Some(1.06));
        assert_eq!(total_cbm(Some(0.212), Some(0)), None);
        assert_eq!(total_cbm(Some(0.212), Some(-2)), None);
        assert_eq!(total_cbm(Some(0.212), None), None);
        assert_eq!(total_cbm(None, Some(5)), None);
    }
}
