//! Reference catalog of drinks and their nutrition per 12 fl oz.
//!
//! The built-in catalog covers the common US cola, citrus and fruit sodas.
//! A custom catalog can be loaded from a TOML file instead; either way the
//! catalog is read-only after it has been loaded.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Common container sizes, smallest first
const COMMON_SIZES: &[ServingSize] = &[
    ServingSize { label: "7.5 fl oz (Mini Can)", volume_oz: 7.5 },
    ServingSize { label: "8 fl oz (Small)", volume_oz: 8.0 },
    ServingSize { label: "12 fl oz (Can)", volume_oz: 12.0 },
    ServingSize { label: "16 fl oz (Medium)", volume_oz: 16.0 },
    ServingSize { label: "16.9 fl oz (Bottle)", volume_oz: 16.9 },
    ServingSize { label: "20 fl oz (Large)", volume_oz: 20.0 },
    ServingSize { label: "24 fl oz (XL)", volume_oz: 24.0 },
    ServingSize { label: "1 Liter (33.8 fl oz)", volume_oz: 33.8 },
    ServingSize { label: "2 Liter (67.6 fl oz)", volume_oz: 67.6 },
];

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// The container sizes presentation code offers as presets
pub fn common_sizes() -> &'static [ServingSize] {
    COMMON_SIZES
}

/// Resolve a serving size given as a preset or a plain number of fl oz
///
/// A preset matches its full label, the part before the parentheses
/// ("12 fl oz", "2 Liter") or the name inside them ("Can", "Bottle"),
/// ignoring case. Numbers are returned as-is; `scale` validates them.
pub fn find_size(input: &str) -> Result<f64> {
    let wanted = input.trim();

    let preset = COMMON_SIZES.iter().find(|size| {
        let (head, tail) = match size.label.split_once(" (") {
            Some((head, tail)) => (head, tail.trim_end_matches(')')),
            None => (size.label, size.label),
        };
        [size.label, head, tail]
            .iter()
            .any(|name| name.eq_ignore_ascii_case(wanted))
    });

    if let Some(size) = preset {
        return Ok(size.volume_oz);
    }

    wanted
        .parse::<f64>()
        .map_err(|_| Error::UnknownSize(input.to_string()))
}

fn variant(
    name: &str,
    calories: u32,
    sugar_g: f64,
    carbs_g: f64,
    caffeine_mg: f64,
) -> CatalogVariant {
    CatalogVariant {
        name: name.into(),
        per_reference: NutrientProfile {
            calories,
            sugar_g,
            carbs_g,
            caffeine_mg,
        },
    }
}

/// Builds the default catalog
///
/// **Note**: For production use, prefer `default_catalog()` which returns a
/// cached reference. This function is retained for tests.
pub fn build_default_catalog() -> Catalog {
    let brands = vec![
        CatalogBrand {
            name: "Coca-Cola".into(),
            variants: vec![
                variant("Coca-Cola Classic", 140, 39.0, 39.0, 34.0),
                variant("Diet Coke", 0, 0.0, 0.0, 46.0),
                variant("Coke Zero Sugar", 0, 0.0, 0.0, 34.0),
                variant("Caffeine Free Coke", 140, 39.0, 39.0, 0.0),
            ],
        },
        CatalogBrand {
            name: "Pepsi".into(),
            variants: vec![
                variant("Pepsi", 150, 41.0, 41.0, 38.0),
                variant("Diet Pepsi", 0, 0.0, 0.0, 35.0),
                variant("Pepsi Zero Sugar", 0, 0.0, 0.0, 69.0),
                variant("Caffeine Free Pepsi", 150, 41.0, 41.0, 0.0),
            ],
        },
        CatalogBrand {
            name: "Mountain Dew".into(),
            variants: vec![
                variant("Mountain Dew", 170, 46.0, 46.0, 54.0),
                variant("Diet Mountain Dew", 0, 0.0, 0.0, 54.0),
                variant("Mountain Dew Zero Sugar", 0, 0.0, 0.0, 68.0),
                variant("Mountain Dew Code Red", 170, 46.0, 46.0, 54.0),
            ],
        },
        CatalogBrand {
            name: "Dr Pepper".into(),
            variants: vec![
                variant("Dr Pepper", 150, 40.0, 40.0, 41.0),
                variant("Diet Dr Pepper", 0, 0.0, 0.0, 41.0),
                variant("Dr Pepper Zero Sugar", 0, 0.0, 0.0, 41.0),
                variant("Caffeine Free Dr Pepper", 150, 40.0, 40.0, 0.0),
            ],
        },
        CatalogBrand {
            name: "Sprite".into(),
            variants: vec![
                variant("Sprite", 140, 38.0, 38.0, 0.0),
                variant("Sprite Zero Sugar", 0, 0.0, 0.0, 0.0),
            ],
        },
        CatalogBrand {
            name: "Fanta".into(),
            variants: vec![
                variant("Fanta Orange", 160, 44.0, 44.0, 0.0),
                variant("Fanta Orange Zero Sugar", 0, 0.0, 0.0, 0.0),
                variant("Fanta Grape", 160, 44.0, 44.0, 0.0),
                variant("Fanta Strawberry", 160, 44.0, 44.0, 0.0),
            ],
        },
    ];

    Catalog { brands }
}

impl Catalog {
    /// Load a catalog from a TOML file and validate it
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog: Catalog = toml::from_str(&contents)?;

        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }

        tracing::info!(
            "Loaded catalog with {} brands from {:?}",
            catalog.brands.len(),
            path
        );
        Ok(catalog)
    }

    /// Brands in presentation order
    pub fn brands(&self) -> &[CatalogBrand] {
        &self.brands
    }

    pub fn find_brand(&self, brand: &str) -> Option<&CatalogBrand> {
        self.brands.iter().find(|b| b.name == brand)
    }

    /// Find a variant of a brand
    ///
    /// Fails with `Error::NotFound` when either name is missing.
    pub fn lookup(&self, brand: &str, variant: &str) -> Result<&CatalogVariant> {
        self.find_brand(brand)
            .and_then(|b| b.variants.iter().find(|v| v.name == variant))
            .ok_or_else(|| Error::not_found(brand, variant))
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut brand_names = HashSet::new();

        if self.brands.is_empty() {
            errors.push("Catalog has no brands".to_string());
        }

        for brand in &self.brands {
            if brand.name.is_empty() {
                errors.push("Brand has empty name".to_string());
            }
            if !brand_names.insert(brand.name.as_str()) {
                errors.push(format!("Duplicate brand '{}'", brand.name));
            }
            if brand.variants.is_empty() {
                errors.push(format!("Brand '{}' has no variants", brand.name));
            }

            let mut variant_names = HashSet::new();
            for variant in &brand.variants {
                if variant.name.is_empty() {
                    errors.push(format!(
                        "Brand '{}' has a variant with empty name",
                        brand.name
                    ));
                }
                if !variant_names.insert(variant.name.as_str()) {
                    errors.push(format!(
                        "Brand '{}' lists variant '{}' twice",
                        brand.name, variant.name
                    ));
                }

                let profile = &variant.per_reference;
                for (field, value) in [
                    ("sugar_g", profile.sugar_g),
                    ("carbs_g", profile.carbs_g),
                    ("caffeine_mg", profile.caffeine_mg),
                ] {
                    if !value.is_finite() || value < 0.0 {
                        errors.push(format!(
                            "Variant '{}': {} must be a non-negative number, got {}",
                            variant.name, field, value
                        ));
                    }
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.brands.len(), 6);
        let variant_count: usize = catalog.brands.iter().map(|b| b.variants.len()).sum();
        assert_eq!(variant_count, 22);
    }

    #[test]
    fn test_default_catalog_validates() {
        let errors = default_catalog().validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_lookup_classic() {
        let variant = default_catalog()
            .lookup("Coca-Cola", "Coca-Cola Classic")
            .unwrap();
        assert_eq!(variant.per_reference.calories, 140);
        assert_eq!(variant.per_reference.sugar_g, 39.0);
        assert_eq!(variant.per_reference.carbs_g, 39.0);
        assert_eq!(variant.per_reference.caffeine_mg, 34.0);
    }

    #[test]
    fn test_lookup_unknown_brand_or_variant() {
        let catalog = default_catalog();
        assert!(matches!(
            catalog.lookup("Tab", "Tab"),
            Err(Error::NotFound { .. })
        ));
        // Variant exists, but under another brand
        assert!(matches!(
            catalog.lookup("Coca-Cola", "Pepsi"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_brand_order_preserved() {
        let names: Vec<_> = default_catalog()
            .brands()
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(
            names,
            ["Coca-Cola", "Pepsi", "Mountain Dew", "Dr Pepper", "Sprite", "Fanta"]
        );
    }

    #[test]
    fn test_common_sizes_include_can_and_two_liter() {
        let sizes = common_sizes();
        assert!(sizes.iter().any(|s| s.volume_oz == 12.0));
        assert!(sizes.iter().any(|s| s.volume_oz == 67.6));
        assert!(sizes.windows(2).all(|w| w[0].volume_oz < w[1].volume_oz));
    }

    #[test]
    fn test_find_size_by_label_name_or_number() {
        assert_eq!(find_size("12 fl oz (Can)").unwrap(), 12.0);
        assert_eq!(find_size("can").unwrap(), 12.0);
        assert_eq!(find_size("Bottle").unwrap(), 16.9);
        assert_eq!(find_size("2 Liter").unwrap(), 67.6);
        assert_eq!(find_size("20 fl oz").unwrap(), 20.0);
        assert_eq!(find_size(" 33.8 ").unwrap(), 33.8);
        assert_eq!(find_size("10").unwrap(), 10.0);
    }

    #[test]
    fn test_find_size_unknown_label() {
        assert!(matches!(
            find_size("Big Gulp"),
            Err(Error::UnknownSize(label)) if label == "Big Gulp"
        ));
    }

    #[test]
    fn test_validate_reports_problems() {
        let catalog = Catalog {
            brands: vec![
                CatalogBrand {
                    name: "Acme".into(),
                    variants: vec![
                        variant("Acme Cola", 100, 25.0, 25.0, 10.0),
                        variant("Acme Cola", 100, 25.0, 25.0, 10.0),
                    ],
                },
                CatalogBrand {
                    name: "Acme".into(),
                    variants: vec![variant("Broken", 0, -1.0, 0.0, f64::NAN)],
                },
                CatalogBrand {
                    name: "Empty".into(),
                    variants: vec![],
                },
            ],
        };

        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("Duplicate brand 'Acme'")));
        assert!(errors.iter().any(|e| e.contains("twice")));
        assert!(errors.iter().any(|e| e.contains("sugar_g")));
        assert!(errors.iter().any(|e| e.contains("caffeine_mg")));
        assert!(errors.iter().any(|e| e.contains("'Empty' has no variants")));
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
[[brands]]
name = "Store Brand"

[[brands.variants]]
name = "Store Cola"
calories = 120
sugar_g = 33.0
carbs_g = 33.0
caffeine_mg = 30.0
"#,
        )
        .unwrap();

        let catalog = Catalog::load_from(&path).unwrap();
        let cola = catalog.lookup("Store Brand", "Store Cola").unwrap();
        assert_eq!(cola.per_reference.calories, 120);
        assert_eq!(cola.per_reference.caffeine_mg, 30.0);
    }

    #[test]
    fn test_load_from_rejects_invalid_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
[[brands]]
name = "Nothing Here"
variants = []
"#,
        )
        .unwrap();

        let result = Catalog::load_from(&path);
        assert!(matches!(result, Err(Error::CatalogValidation(_))));
    }
}
