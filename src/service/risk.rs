//! Risk score calculation for the UMKM cyber-risk survey
//!
//! Formula:
//! - peluang (likelihood) = ((f*2) + (g*2) + h + i) / 6
//! - impact               = (h + i) / 2
//! - total                = round(peluang * impact), scale 2..36
//! - category             = LOW if total <= 15, MEDIUM if total <= 25, HIGH otherwise

use std::fmt;

use serde::Serialize;

use crate::model::{RiskCategory, RiskInput, RiskScore};

/// Highest total that is still LOW
const LOW_MAX: i32 = 15;
/// Highest total that is still MEDIUM
const MEDIUM_MAX: i32 = 25;

const ORDINAL_RANGE: (i32, i32) = (1, 6);
const RECOVERY_VALUES: &[i32] = &[2, 4, 6];

/// One of the four calculator inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskInputField {
    F,
    G,
    H,
    I,
}

impl RiskInputField {
    /// Short formula name ("f", "g", "h", "i")
    pub fn code(&self) -> &'static str {
        match self {
            RiskInputField::F => "f",
            RiskInputField::G => "g",
            RiskInputField::H => "h",
            RiskInputField::I => "i",
        }
    }

    /// Name of the field in the survey form
    pub fn form_name(&self) -> &'static str {
        match self {
            RiskInputField::F => "biaya_pengetahuan",
            RiskInputField::G => "pengaruh_kerugian",
            RiskInputField::H => "Frekuensi_serangan",
            RiskInputField::I => "Pemulihan",
        }
    }

    fn allowed(&self) -> AllowedValues {
        match self {
            RiskInputField::I => AllowedValues::OneOf(RECOVERY_VALUES),
            _ => AllowedValues::Range(ORDINAL_RANGE.0, ORDINAL_RANGE.1),
        }
    }
}

/// Values accepted for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedValues {
    /// Inclusive integer range
    Range(i32, i32),
    OneOf(&'static [i32]),
}

impl AllowedValues {
    pub fn contains(&self, value: i32) -> bool {
        match self {
            AllowedValues::Range(min, max) => (*min..=*max).contains(&value),
            AllowedValues::OneOf(values) => values.contains(&value),
        }
    }

    pub fn values(&self) -> Vec<i32> {
        match self {
            AllowedValues::Range(min, max) => (*min..=*max).collect(),
            AllowedValues::OneOf(values) => values.to_vec(),
        }
    }
}

impl fmt::Display for AllowedValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowedValues::Range(min, max) => write!(f, "{}-{}", min, max),
            AllowedValues::OneOf(values) => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                match rendered.split_last() {
                    Some((last, rest)) if !rest.is_empty() => {
                        write!(f, "{}, or {}", rest.join(", "), last)
                    }
                    _ => f.write_str(&rendered.join(", ")),
                }
            }
        }
    }
}

/// An input outside its allowed range or set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {} ({}): {value}. Must be {allowed}", .field.form_name(), .field.code())]
pub struct RiskInputError {
    pub field: RiskInputField,
    pub value: i32,
    pub allowed: AllowedValues,
}

/// Stateless calculator mapping survey answers to a risk score
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskCalculator;

impl RiskCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Check every input against its allowed values, in f, g, h, i order
    pub fn validate(&self, input: &RiskInput) -> Result<(), RiskInputError> {
        let fields = [
            (RiskInputField::F, input.f),
            (RiskInputField::G, input.g),
            (RiskInputField::H, input.h),
            (RiskInputField::I, input.i),
        ];

        for (field, value) in fields {
            let allowed = field.allowed();
            if !allowed.contains(value) {
                return Err(RiskInputError {
                    field,
                    value,
                    allowed,
                });
            }
        }

        Ok(())
    }

    /// Validate and score the inputs
    pub fn calculate(&self, input: &RiskInput) -> Result<RiskScore, RiskInputError> {
        self.validate(input)?;

        let f = f64::from(input.f);
        let g = f64::from(input.g);
        let h = f64::from(input.h);
        let i = f64::from(input.i);

        let peluang = ((f * 2.0) + (g * 2.0) + h + i) / 6.0;
        let impact = (h + i) / 2.0;
        // f64::round rounds half away from zero
        let total = (peluang * impact).round() as i32;

        Ok(RiskScore {
            peluang: round4(peluang),
            impact: round4(impact),
            total,
            category: categorize(total),
        })
    }
}

/// Category for an integer total
pub fn categorize(total: i32) -> RiskCategory {
    if total <= LOW_MAX {
        RiskCategory::Low
    } else if total <= MEDIUM_MAX {
        RiskCategory::Medium
    } else {
        RiskCategory::High
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(f: i32, g: i32, h: i32, i: i32) -> RiskInput {
        RiskInput { f, g, h, i }
    }

    #[test]
    fn test_reference_example() {
        let score = RiskCalculator::new().calculate(&input(4, 5, 3, 4)).unwrap();
        assert_eq!(score.peluang, 4.1667);
        assert_eq!(score.impact, 3.5);
        assert_eq!(score.total, 15);
        assert_eq!(score.category, RiskCategory::Low);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(categorize(15), RiskCategory::Low);
        assert_eq!(categorize(16), RiskCategory::Medium);
        assert_eq!(categorize(25), RiskCategory::Medium);
        assert_eq!(categorize(26), RiskCategory::High);
    }

    #[test]
    fn test_boundary_inputs() {
        let calc = RiskCalculator::new();

        // 3.0 * 5.0 = 15
        let low = calc.calculate(&input(1, 3, 4, 6)).unwrap();
        assert_eq!((low.total, low.category), (15, RiskCategory::Low));

        // 2.6667 * 6.0 = 16
        let medium = calc.calculate(&input(1, 1, 6, 6)).unwrap();
        assert_eq!((medium.total, medium.category), (16, RiskCategory::Medium));

        // 4.5 * 5.5 = 24.75 -> 25
        let upper_medium = calc.calculate(&input(2, 6, 5, 6)).unwrap();
        assert_eq!(
            (upper_medium.total, upper_medium.category),
            (25, RiskCategory::Medium)
        );

        // 4.3333 * 6.0 = 26
        let high = calc.calculate(&input(1, 6, 6, 6)).unwrap();
        assert_eq!((high.total, high.category), (26, RiskCategory::High));
    }

    #[test]
    fn test_extremes() {
        let calc = RiskCalculator::new();

        let min = calc.calculate(&input(1, 1, 1, 2)).unwrap();
        assert_eq!(min.total, 2);
        assert_eq!(min.peluang, 1.1667);
        assert_eq!(min.impact, 1.5);

        let max = calc.calculate(&input(6, 6, 6, 6)).unwrap();
        assert_eq!(max.total, 36);
        assert_eq!(max.category, RiskCategory::High);
    }

    #[test]
    fn test_formula_holds_for_every_valid_input() {
        let calc = RiskCalculator::new();

        for f in 1..=6 {
            for g in 1..=6 {
                for h in 1..=6 {
                    for i in [2, 4, 6] {
                        let score = calc.calculate(&input(f, g, h, i)).unwrap();

                        let peluang = f64::from(2 * f + 2 * g + h + i) / 6.0;
                        let impact = f64::from(h + i) / 2.0;
                        let total = (peluang * impact).round() as i32;

                        assert_eq!(score.total, total);
                        assert_eq!(score.category, categorize(total));
                        assert!((score.peluang - peluang).abs() < 0.00005);
                        assert!((score.impact - impact).abs() < 0.00005);
                        assert!((2..=36).contains(&score.total));
                    }
                }
            }
        }
    }

    #[test]
    fn test_category_uses_rounded_total() {
        // 3.5 * 4.5 = 15.75 rounds to 16
        let score = RiskCalculator::new().calculate(&input(1, 5, 3, 6)).unwrap();
        assert_eq!(score.total, 16);
        assert_eq!(score.category, RiskCategory::Medium);

        // 3.6667 * 4.0 = 14.67 rounds up to 15 and stays LOW
        let score = RiskCalculator::new().calculate(&input(1, 6, 2, 6)).unwrap();
        assert_eq!(score.total, 15);
        assert_eq!(score.category, RiskCategory::Low);
    }

    #[test]
    fn test_invalid_f() {
        let err = RiskCalculator::new()
            .calculate(&input(7, 1, 1, 2))
            .unwrap_err();
        assert_eq!(err.field, RiskInputField::F);
        assert_eq!(err.field.code(), "f");
        assert_eq!(err.value, 7);
        assert_eq!(err.allowed.to_string(), "1-6");
        assert_eq!(
            err.to_string(),
            "Invalid biaya_pengetahuan (f): 7. Must be 1-6"
        );
    }

    #[test]
    fn test_invalid_i() {
        let err = RiskCalculator::new()
            .calculate(&input(1, 1, 1, 3))
            .unwrap_err();
        assert_eq!(err.field, RiskInputField::I);
        assert_eq!(err.value, 3);
        assert_eq!(err.allowed.values(), vec![2, 4, 6]);
        assert_eq!(err.allowed.to_string(), "2, 4, or 6");
    }

    #[test]
    fn test_first_invalid_field_is_reported() {
        let err = RiskCalculator::new()
            .validate(&input(1, 0, 9, 5))
            .unwrap_err();
        assert_eq!(err.field, RiskInputField::G);
        assert_eq!(err.value, 0);
    }

    #[test]
    fn test_lower_bound_is_checked() {
        let err = RiskCalculator::new()
            .validate(&input(1, 1, 0, 2))
            .unwrap_err();
        assert_eq!(err.field, RiskInputField::H);
        assert_eq!(err.field.form_name(), "Frekuensi_serangan");
    }
}
