//! Scaling of per-can nutrient values to the volume actually consumed.

use crate::{Error, NutrientProfile, Result, REFERENCE_VOLUME_OZ};

/// Scale a 12 fl oz profile to `consumed_oz`
///
/// Every field is rounded half away from zero and clamped at zero, so the
/// result always holds whole, non-negative amounts. Only the profile is
/// rounded; callers keep the consumed volume as given.
pub fn scale(profile: &NutrientProfile, consumed_oz: f64) -> Result<NutrientProfile> {
    if !consumed_oz.is_finite() || consumed_oz <= 0.0 {
        return Err(Error::InvalidVolume(consumed_oz));
    }

    let ratio = consumed_oz / REFERENCE_VOLUME_OZ;

    Ok(NutrientProfile {
        calories: round_non_negative(f64::from(profile.calories) * ratio) as u32,
        sugar_g: round_non_negative(profile.sugar_g * ratio),
        carbs_g: round_non_negative(profile.carbs_g * ratio),
        caffeine_mg: round_non_negative(profile.caffeine_mg * ratio),
    })
}

fn round_non_negative(value: f64) -> f64 {
    let rounded = value.round();
    // also folds -0.0 and NaN into 0.0
    if rounded > 0.0 {
        rounded
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic() -> NutrientProfile {
        NutrientProfile {
            calories: 140,
            sugar_g: 39.0,
            carbs_g: 39.0,
            caffeine_mg: 34.0,
        }
    }

    #[test]
    fn test_reference_volume_is_identity() {
        let scaled = scale(&classic(), 12.0).unwrap();
        assert_eq!(scaled, classic());
    }

    #[test]
    fn test_two_liter_bottle() {
        let scaled = scale(&classic(), 67.6).unwrap();
        assert_eq!(scaled.calories, 789);
        assert_eq!(scaled.sugar_g, 220.0);
        assert_eq!(scaled.carbs_g, 220.0);
        assert_eq!(scaled.caffeine_mg, 192.0);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        // 6 oz of a 1-calorie-per-can drink is exactly half a calorie
        let profile = NutrientProfile {
            calories: 1,
            sugar_g: 3.0,
            carbs_g: 5.0,
            caffeine_mg: 0.0,
        };
        let scaled = scale(&profile, 6.0).unwrap();
        assert_eq!(scaled.calories, 1);
        assert_eq!(scaled.sugar_g, 2.0);
        assert_eq!(scaled.carbs_g, 3.0);
        assert_eq!(scaled.caffeine_mg, 0.0);
    }

    #[test]
    fn test_outputs_are_whole_and_non_negative() {
        for oz in [0.1, 1.0, 7.5, 8.0, 16.9, 20.0, 33.8, 67.6, 1000.0] {
            let scaled = scale(&classic(), oz).unwrap();
            for value in [scaled.sugar_g, scaled.carbs_g, scaled.caffeine_mg] {
                assert!(value >= 0.0);
                assert_eq!(value.fract(), 0.0, "{} oz gave {}", oz, value);
                assert!(value.is_sign_positive());
            }
        }
    }

    #[test]
    fn test_tiny_volume_rounds_to_zero() {
        let scaled = scale(&classic(), 0.01).unwrap();
        assert_eq!(scaled, NutrientProfile::default());
    }

    #[test]
    fn test_rejects_non_positive_volume() {
        for oz in [0.0, -0.0, -12.0, f64::NAN, f64::INFINITY] {
            let result = scale(&classic(), oz);
            assert!(
                matches!(result, Err(Error::InvalidVolume(_))),
                "{} oz should be rejected",
                oz
            );
        }
    }
}
