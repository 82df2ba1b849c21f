// 🗂️ Activity Taxonomy - Scope → Category → Variant → activity code
// Turns a form submission into a validated ActivityEntry

use crate::error::{EngineResult, ValidationError};
use crate::estimation::{check_count, check_positive, EstimationConfig, PremiseType, Proxy};
use crate::ledger::{ActivityEntry, QUALITY_MEASURED, QUALITY_MEASURED_FLEET};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// SCOPES & CATEGORIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Scope {
    One,
    Two,
    Three,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::One, Scope::Two, Scope::Three];

    pub fn number(&self) -> u8 {
        match self {
            Scope::One => 1,
            Scope::Two => 2,
            Scope::Three => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Scope> {
        match n {
            1 => Some(Scope::One),
            2 => Some(Scope::Two),
            3 => Some(Scope::Three),
            _ => None,
        }
    }

    pub fn categories(&self) -> &'static [Category] {
        match self {
            Scope::One => &[Category::Fuel, Category::Refrigerants],
            Scope::Two => &[Category::Energy],
            Scope::Three => &[
                Category::Paper,
                Category::Water,
                Category::BusinessTravel,
                Category::WasteDisposal,
                Category::EmployeeCommute,
            ],
        }
    }

    /// Scope an internally generated activity code belongs to
    pub fn for_activity_code(code: &str) -> Option<Scope> {
        Scope::ALL
            .into_iter()
            .find(|scope| {
                scope
                    .categories()
                    .iter()
                    .any(|c| c.activity_codes().iter().any(|known| *known == code))
            })
    }
}

impl TryFrom<u8> for Scope {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Scope::from_number(n).ok_or_else(|| format!("scope must be 1, 2 or 3, got {}", n))
    }
}

impl From<Scope> for u8 {
    fn from(scope: Scope) -> u8 {
        scope.number()
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Scope {}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Fuel,
    Refrigerants,
    Energy,
    Paper,
    Water,
    BusinessTravel,
    WasteDisposal,
    EmployeeCommute,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Fuel => "Fuel",
            Category::Refrigerants => "Refrigerants",
            Category::Energy => "Energy",
            Category::Paper => "Paper",
            Category::Water => "Water",
            Category::BusinessTravel => "Business travel",
            Category::WasteDisposal => "Waste disposal",
            Category::EmployeeCommute => "Employee commute",
        }
    }

    pub fn from_label(label: &str) -> Option<Category> {
        Scope::ALL
            .iter()
            .flat_map(|s| s.categories().iter())
            .find(|c| c.label().eq_ignore_ascii_case(label))
            .copied()
    }

    pub fn scope(&self) -> Scope {
        match self {
            Category::Fuel | Category::Refrigerants => Scope::One,
            Category::Energy => Scope::Two,
            _ => Scope::Three,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Category::Fuel => "litre",
            Category::Refrigerants | Category::Paper | Category::WasteDisposal => "kg",
            Category::Energy => "kWh",
            Category::Water => "m³",
            Category::BusinessTravel | Category::EmployeeCommute => "km",
        }
    }

    /// Selectable variant labels, empty when the category has a single form
    pub fn variants(&self) -> Vec<&'static str> {
        match self {
            Category::Fuel => FuelType::ALL.iter().map(|v| v.label()).collect(),
            Category::Refrigerants => Refrigerant::ALL.iter().map(|v| v.label()).collect(),
            Category::BusinessTravel => TravelMode::ALL.iter().map(|v| v.label()).collect(),
            Category::WasteDisposal => WasteRoute::ALL.iter().map(|v| v.label()).collect(),
            Category::Energy => ENERGY_VARIANTS.to_vec(),
            Category::Paper | Category::Water | Category::EmployeeCommute => Vec::new(),
        }
    }

    pub fn activity_codes(&self) -> Vec<&'static str> {
        match self {
            Category::Fuel => FuelType::ALL.iter().map(|v| v.activity_code()).collect(),
            Category::Refrigerants => Refrigerant::ALL.iter().map(|v| v.activity_code()).collect(),
            Category::BusinessTravel => TravelMode::ALL.iter().map(|v| v.activity_code()).collect(),
            Category::WasteDisposal => WasteRoute::ALL.iter().map(|v| v.activity_code()).collect(),
            Category::Energy => vec!["electricity_kwh"],
            Category::Paper => vec!["paper_kg"],
            Category::Water => vec!["water_m3"],
            Category::EmployeeCommute => vec!["employee_commute_km"],
        }
    }

    /// Input schema of one variant: what a form must collect
    pub fn required_inputs(&self, variant: &str) -> Vec<InputSpec> {
        match self {
            Category::Fuel => vec![
                InputSpec::positive("economy_l_per_100km", "L/100km"),
                InputSpec::positive("distance_km", "km/yr per vehicle"),
                InputSpec::count("fleet_size", "vehicles"),
            ],
            Category::Refrigerants | Category::Paper | Category::WasteDisposal => {
                vec![InputSpec::positive("kg", "kg")]
            }
            Category::Water => vec![InputSpec::positive("m3", "m³")],
            Category::BusinessTravel => vec![InputSpec::positive("km", "km")],
            Category::EmployeeCommute => vec![
                InputSpec::count("employees", "people"),
                InputSpec::positive("km_per_employee", "km/emp/yr"),
            ],
            Category::Energy => match variant {
                "Floor area" => vec![InputSpec::positive("area_m2", "m²")],
                "Occupants" => vec![InputSpec::count("occupants", "people")],
                "Bulk kW" => vec![
                    InputSpec::positive("total_kw", "kW"),
                    InputSpec::positive("hours", "h"),
                ],
                v if v.starts_with(PREMISE_PREFIX) => vec![InputSpec::positive("area_m2", "m²")],
                "Appliance list" => vec![
                    InputSpec::count("units", "units"),
                    InputSpec::positive("kw_per_unit", "kW"),
                    InputSpec::positive("hours", "h"),
                ],
                _ => vec![InputSpec::positive("kwh", "kWh")],
            },
        }
    }
}

const PREMISE_PREFIX: &str = "Premise type: ";

const ENERGY_VARIANTS: [&str; 8] = [
    "Measured",
    "Floor area",
    "Occupants",
    "Bulk kW",
    "Premise type: Office",
    "Premise type: Retail",
    "Premise type: Warehouse",
    "Appliance list",
];

// ============================================================================
// INPUT SCHEMA
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputKind {
    /// Real number > 0
    Positive,
    /// Integer > 0
    Count,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSpec {
    pub name: &'static str,
    pub unit: &'static str,
    pub kind: InputKind,
}

impl InputSpec {
    fn positive(name: &'static str, unit: &'static str) -> Self {
        InputSpec { name, unit, kind: InputKind::Positive }
    }

    fn count(name: &'static str, unit: &'static str) -> Self {
        InputSpec { name, unit, kind: InputKind::Count }
    }
}

// ============================================================================
// VARIANTS
// ============================================================================

macro_rules! variant_enum {
    ($name:ident { $($variant:ident => ($label:literal, $code:literal)),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn activity_code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn from_label(label: &str) -> Option<$name> {
                Self::ALL.iter().find(|v| v.label() == label).copied()
            }
        }
    };
}

variant_enum!(FuelType {
    Petrol => ("Petrol", "petrol_litre"),
    Diesel => ("Diesel", "diesel_litre"),
});

variant_enum!(Refrigerant {
    R134a => ("R-134a", "r134a_kg"),
    R410a => ("R-410a", "r410a_kg"),
});

variant_enum!(TravelMode {
    DomesticAir => ("Domestic air", "business_air_domestic_km"),
    LongHaulAir => ("Long-haul air", "business_air_longhaul_km"),
    Taxi => ("Taxi", "taxi_km"),
});

variant_enum!(WasteRoute {
    Landfill => ("Landfill", "waste_landfill_kg"),
    Incineration => ("Incineration", "waste_incineration_kg"),
});

// ============================================================================
// ACTIVITY REQUEST
// ============================================================================

/// A typed form submission, one variant per (category, form)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ActivityRequest {
    Fuel {
        fuel: FuelType,
        economy_l_per_100km: f64,
        distance_km: f64,
        fleet_size: u32,
    },
    Refrigerant {
        gas: Refrigerant,
        kg: f64,
    },
    ElectricityMeasured {
        kwh: f64,
    },
    ElectricityEstimated {
        proxy: Proxy,
    },
    BusinessTravel {
        mode: TravelMode,
        km: f64,
    },
    WasteDisposal {
        route: WasteRoute,
        kg: f64,
    },
    EmployeeCommute {
        employees: u32,
        km_per_employee: f64,
    },
    Paper {
        kg: f64,
    },
    Water {
        m3: f64,
    },
}

impl ActivityRequest {
    pub fn category(&self) -> Category {
        match self {
            ActivityRequest::Fuel { .. } => Category::Fuel,
            ActivityRequest::Refrigerant { .. } => Category::Refrigerants,
            ActivityRequest::ElectricityMeasured { .. } | ActivityRequest::ElectricityEstimated { .. } => {
                Category::Energy
            }
            ActivityRequest::BusinessTravel { .. } => Category::BusinessTravel,
            ActivityRequest::WasteDisposal { .. } => Category::WasteDisposal,
            ActivityRequest::EmployeeCommute { .. } => Category::EmployeeCommute,
            ActivityRequest::Paper { .. } => Category::Paper,
            ActivityRequest::Water { .. } => Category::Water,
        }
    }

    fn context(&self) -> String {
        let category = self.category();
        format!("{} / {}", category.scope(), category.label())
    }

    /// Build a request from labels and named numeric inputs, as a generic form would
    pub fn from_raw(
        scope: u8,
        category: &str,
        variant: &str,
        inputs: &BTreeMap<String, f64>,
    ) -> Result<ActivityRequest, ValidationError> {
        let context = format!("Scope {} / {}", scope, category);

        let scope = Scope::from_number(scope)
            .ok_or_else(|| ValidationError::single(&context, "scope", "must be 1, 2 or 3"))?;
        let cat = Category::from_label(category)
            .filter(|c| c.scope() == scope)
            .ok_or_else(|| {
                ValidationError::single(&context, "category", format!("not a category of {}", scope))
            })?;

        // Labels match case-insensitively, like categories; single-form
        // categories take no variant at all
        let variants = cat.variants();
        let variant = if variants.is_empty() {
            if !variant.trim().is_empty() {
                return Err(ValidationError::single(
                    &context,
                    "variant",
                    format!("{} has no variants, got '{}'", cat.label(), variant),
                ));
            }
            ""
        } else {
            variants
                .iter()
                .copied()
                .find(|v| v.eq_ignore_ascii_case(variant.trim()))
                .ok_or_else(|| {
                    ValidationError::single(
                        &context,
                        "variant",
                        format!("expected one of {:?}, got '{}'", variants, variant),
                    )
                })?
        };

        // Missing inputs are reported like non-positive ones
        let mut err = ValidationError::new(&context);
        let mut values = BTreeMap::new();
        for spec in cat.required_inputs(variant) {
            match inputs.get(spec.name) {
                None => err.push(spec.name, "required input is missing"),
                Some(v) => {
                    let ok = match spec.kind {
                        InputKind::Positive => v.is_finite() && *v > 0.0,
                        InputKind::Count => v.is_finite() && *v >= 1.0 && v.fract() == 0.0 && *v <= u32::MAX as f64,
                    };
                    if !ok {
                        let expect = match spec.kind {
                            InputKind::Positive => "must be > 0",
                            InputKind::Count => "must be a positive integer",
                        };
                        err.push(spec.name, format!("{}, got {}", expect, v));
                    }
                    values.insert(spec.name, *v);
                }
            }
        }
        err.into_result()?;

        let num = |name: &str| values.get(name).copied().unwrap_or(0.0);
        let count = |name: &str| num(name) as u32;

        let request = match cat {
            Category::Fuel => ActivityRequest::Fuel {
                fuel: FuelType::from_label(variant).unwrap_or(FuelType::Petrol),
                economy_l_per_100km: num("economy_l_per_100km"),
                distance_km: num("distance_km"),
                fleet_size: count("fleet_size"),
            },
            Category::Refrigerants => ActivityRequest::Refrigerant {
                gas: Refrigerant::from_label(variant).unwrap_or(Refrigerant::R134a),
                kg: num("kg"),
            },
            Category::BusinessTravel => ActivityRequest::BusinessTravel {
                mode: TravelMode::from_label(variant).unwrap_or(TravelMode::Taxi),
                km: num("km"),
            },
            Category::WasteDisposal => ActivityRequest::WasteDisposal {
                route: WasteRoute::from_label(variant).unwrap_or(WasteRoute::Landfill),
                kg: num("kg"),
            },
            Category::EmployeeCommute => ActivityRequest::EmployeeCommute {
                employees: count("employees"),
                km_per_employee: num("km_per_employee"),
            },
            Category::Paper => ActivityRequest::Paper { kg: num("kg") },
            Category::Water => ActivityRequest::Water { m3: num("m3") },
            Category::Energy => match variant {
                "Measured" => ActivityRequest::ElectricityMeasured { kwh: num("kwh") },
                "Floor area" => estimated(Proxy::FloorArea { area_m2: num("area_m2") }),
                "Occupants" => estimated(Proxy::Occupancy { occupants: count("occupants") }),
                "Bulk kW" => estimated(Proxy::BulkPower { total_kw: num("total_kw"), hours: num("hours") }),
                "Appliance list" => estimated(Proxy::ApplianceInventory {
                    units: count("units"),
                    kw_per_unit: num("kw_per_unit"),
                    hours: num("hours"),
                }),
                other => {
                    let premise = other
                        .strip_prefix(PREMISE_PREFIX)
                        .and_then(|p| PremiseType::ALL.into_iter().find(|t| t.label() == p))
                        .unwrap_or(PremiseType::Office);
                    estimated(Proxy::Premise { premise, area_m2: num("area_m2") })
                }
            },
        };

        Ok(request)
    }
}

fn estimated(proxy: Proxy) -> ActivityRequest {
    ActivityRequest::ElectricityEstimated { proxy }
}

// ============================================================================
// CLASSIFY
// ============================================================================

/// Validate a submission and map it to (activity_code, quantity, unit, scope, quality)
///
/// Every numeric input must be strictly positive (counts: positive integers);
/// all failures of one submission are reported together.
pub fn classify(request: &ActivityRequest, config: &EstimationConfig) -> EngineResult<ActivityEntry> {
    let category = request.category();
    let scope = category.scope();
    let unit = category.unit();
    let mut err = ValidationError::new(request.context());

    let (code, quantity, quality) = match *request {
        ActivityRequest::Fuel { fuel, economy_l_per_100km, distance_km, fleet_size } => {
            check_positive(&mut err, "economy_l_per_100km", economy_l_per_100km);
            check_positive(&mut err, "distance_km", distance_km);
            check_count(&mut err, "fleet_size", fleet_size);
            let litres = distance_km * economy_l_per_100km / 100.0 * fleet_size as f64;
            (fuel.activity_code(), litres, QUALITY_MEASURED_FLEET)
        }
        ActivityRequest::Refrigerant { gas, kg } => {
            check_positive(&mut err, "kg", kg);
            (gas.activity_code(), kg, QUALITY_MEASURED)
        }
        ActivityRequest::ElectricityMeasured { kwh } => {
            check_positive(&mut err, "kwh", kwh);
            ("electricity_kwh", kwh, QUALITY_MEASURED)
        }
        ActivityRequest::ElectricityEstimated { ref proxy } => {
            let estimate = config.estimate(proxy)?;
            return Ok(ActivityEntry::new("electricity_kwh", estimate.kwh, unit, scope, estimate.quality));
        }
        ActivityRequest::BusinessTravel { mode, km } => {
            check_positive(&mut err, "km", km);
            (mode.activity_code(), km, QUALITY_MEASURED)
        }
        ActivityRequest::WasteDisposal { route, kg } => {
            check_positive(&mut err, "kg", kg);
            (route.activity_code(), kg, QUALITY_MEASURED)
        }
        ActivityRequest::EmployeeCommute { employees, km_per_employee } => {
            check_count(&mut err, "employees", employees);
            check_positive(&mut err, "km_per_employee", km_per_employee);
            ("employee_commute_km", employees as f64 * km_per_employee, QUALITY_MEASURED)
        }
        ActivityRequest::Paper { kg } => {
            check_positive(&mut err, "kg", kg);
            ("paper_kg", kg, QUALITY_MEASURED)
        }
        ActivityRequest::Water { m3 } => {
            check_positive(&mut err, "m3", m3);
            ("water_m3", m3, QUALITY_MEASURED)
        }
    };

    err.into_result()?;
    Ok(ActivityEntry::new(code, quantity, unit, scope, quality))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::factors::FactorRegistry;
    use crate::ledger::QUALITY_ESTIMATED_PROXY;

    fn config() -> EstimationConfig {
        EstimationConfig::default()
    }

    fn rejected(request: ActivityRequest) -> ValidationError {
        match classify(&request, &config()) {
            Err(EngineError::Validation(v)) => v,
            other => panic!("expected validation error for {:?}, got {:?}", request, other),
        }
    }

    #[test]
    fn test_scope_categories() {
        assert_eq!(Scope::One.categories(), &[Category::Fuel, Category::Refrigerants]);
        assert_eq!(Scope::Two.categories(), &[Category::Energy]);
        assert_eq!(Scope::Three.categories().len(), 5);
        assert_eq!(Category::EmployeeCommute.scope(), Scope::Three);
    }

    #[test]
    fn test_every_taxonomy_code_has_a_factor() {
        let registry = FactorRegistry::builtin();
        for scope in Scope::ALL {
            for category in scope.categories() {
                for code in category.activity_codes() {
                    assert!(registry.contains(code), "missing factor for {}", code);
                    assert_eq!(Scope::for_activity_code(code), Some(scope));
                }
            }
        }
    }

    #[test]
    fn test_fuel_fleet_formula() {
        let request = ActivityRequest::Fuel {
            fuel: FuelType::Diesel,
            economy_l_per_100km: 8.0,
            distance_km: 20000.0,
            fleet_size: 3,
        };
        let entry = classify(&request, &config()).unwrap();

        assert_eq!(entry.activity_code, "diesel_litre");
        assert_eq!(entry.quantity, 4800.0);
        assert_eq!(entry.unit, "litre");
        assert_eq!(entry.scope, 1);
        assert_eq!(entry.quality, "Measured – fleet");
    }

    #[test]
    fn test_fuel_rejects_zero_economy() {
        let err = rejected(ActivityRequest::Fuel {
            fuel: FuelType::Petrol,
            economy_l_per_100km: 0.0,
            distance_km: 1000.0,
            fleet_size: 2,
        });
        assert!(err.has_field("economy_l_per_100km"));
        assert_eq!(err.context, "Scope 1 / Fuel");
    }

    #[test]
    fn test_fuel_rejects_distance_and_fleet() {
        let err = rejected(ActivityRequest::Fuel {
            fuel: FuelType::Diesel,
            economy_l_per_100km: 8.0,
            distance_km: 0.0,
            fleet_size: 0,
        });
        assert!(err.has_field("distance_km"));
        assert!(err.has_field("fleet_size"));
        assert!(!err.has_field("economy_l_per_100km"));

        let err = rejected(ActivityRequest::Fuel {
            fuel: FuelType::Diesel,
            economy_l_per_100km: 8.0,
            distance_km: -500.0,
            fleet_size: 1,
        });
        assert_eq!(err.errors.len(), 1);
        assert!(err.has_field("distance_km"));
    }

    #[test]
    fn test_direct_quantities_must_be_positive() {
        let cases = [
            (ActivityRequest::Refrigerant { gas: Refrigerant::R134a, kg: 0.0 }, "kg"),
            (ActivityRequest::Refrigerant { gas: Refrigerant::R410a, kg: -2.0 }, "kg"),
            (ActivityRequest::ElectricityMeasured { kwh: 0.0 }, "kwh"),
            (ActivityRequest::BusinessTravel { mode: TravelMode::DomesticAir, km: 0.0 }, "km"),
            (ActivityRequest::WasteDisposal { route: WasteRoute::Landfill, kg: -1.0 }, "kg"),
            (ActivityRequest::Water { m3: 0.0 }, "m3"),
            (ActivityRequest::Paper { kg: f64::NAN }, "kg"),
        ];

        for (request, field) in cases {
            assert!(rejected(request).has_field(field), "{} not reported", field);
        }
    }

    #[test]
    fn test_direct_quantity_categories() {
        let gas = classify(&ActivityRequest::Refrigerant { gas: Refrigerant::R410a, kg: 2.5 }, &config()).unwrap();
        assert_eq!((gas.activity_code.as_str(), gas.quantity, gas.scope), ("r410a_kg", 2.5, 1));

        let trip = classify(&ActivityRequest::BusinessTravel { mode: TravelMode::LongHaulAir, km: 9000.0 }, &config()).unwrap();
        assert_eq!(trip.activity_code, "business_air_longhaul_km");
        assert_eq!(trip.scope, 3);

        let waste = classify(&ActivityRequest::WasteDisposal { route: WasteRoute::Incineration, kg: 40.0 }, &config()).unwrap();
        assert_eq!(waste.activity_code, "waste_incineration_kg");

        let water = classify(&ActivityRequest::Water { m3: 12.0 }, &config()).unwrap();
        assert_eq!((water.activity_code.as_str(), water.unit.as_str()), ("water_m3", "m³"));

        assert!(rejected(ActivityRequest::Paper { kg: 0.0 }).has_field("kg"));
    }

    #[test]
    fn test_employee_commute() {
        let entry = classify(
            &ActivityRequest::EmployeeCommute { employees: 25, km_per_employee: 4000.0 },
            &config(),
        )
        .unwrap();
        assert_eq!(entry.quantity, 100000.0);
        assert_eq!(entry.activity_code, "employee_commute_km");

        let err = rejected(ActivityRequest::EmployeeCommute { employees: 0, km_per_employee: 4000.0 });
        assert!(err.has_field("employees"));
    }

    #[test]
    fn test_energy_measured_vs_estimated_quality() {
        let measured = classify(&ActivityRequest::ElectricityMeasured { kwh: 1000.0 }, &config()).unwrap();
        assert_eq!(measured.quality, QUALITY_MEASURED);

        let estimated = classify(
            &ActivityRequest::ElectricityEstimated { proxy: Proxy::FloorArea { area_m2: 50.0 } },
            &config(),
        )
        .unwrap();
        assert_eq!(estimated.quality, QUALITY_ESTIMATED_PROXY);
        assert_eq!(estimated.quantity, 10000.0);
        assert_eq!(estimated.activity_code, "electricity_kwh");
        assert_eq!(estimated.scope, 2);
    }

    #[test]
    fn test_from_raw_maps_labels() {
        let inputs = BTreeMap::from([
            ("economy_l_per_100km".to_string(), 10.0),
            ("distance_km".to_string(), 1000.0),
            ("fleet_size".to_string(), 2.0),
        ]);
        let request = ActivityRequest::from_raw(1, "Fuel", "Petrol", &inputs).unwrap();
        let entry = classify(&request, &config()).unwrap();
        assert_eq!(entry.activity_code, "petrol_litre");
        assert_eq!(entry.quantity, 200.0);

        let inputs = BTreeMap::from([("area_m2".to_string(), 10.0)]);
        let request = ActivityRequest::from_raw(2, "Energy", "Premise type: Retail", &inputs).unwrap();
        assert_eq!(
            request,
            ActivityRequest::ElectricityEstimated {
                proxy: Proxy::Premise { premise: PremiseType::Retail, area_m2: 10.0 }
            }
        );
    }

    #[test]
    fn test_from_raw_reports_missing_and_bad_inputs() {
        let inputs = BTreeMap::from([("fleet_size".to_string(), 1.5)]);
        let err = ActivityRequest::from_raw(1, "Fuel", "Diesel", &inputs).unwrap_err();
        assert!(err.has_field("economy_l_per_100km"));
        assert!(err.has_field("distance_km"));
        assert!(err.has_field("fleet_size"));

        let inputs = BTreeMap::from([("kg".to_string(), 1.0)]);
        assert!(ActivityRequest::from_raw(2, "Paper", "", &inputs).is_err());
        assert!(ActivityRequest::from_raw(1, "Refrigerants", "R-22", &inputs).is_err());
        assert!(ActivityRequest::from_raw(3, "Paper", "", &inputs).is_ok());
    }

    #[test]
    fn test_from_raw_variant_rules() {
        let m3 = BTreeMap::from([("m3".to_string(), 5.0)]);
        let err = ActivityRequest::from_raw(3, "Water", "Incineration", &m3).unwrap_err();
        assert!(err.has_field("variant"));
        assert!(ActivityRequest::from_raw(3, "water", "", &m3).is_ok());

        let litres = BTreeMap::from([
            ("economy_l_per_100km".to_string(), 5.0),
            ("distance_km".to_string(), 100.0),
            ("fleet_size".to_string(), 1.0),
        ]);
        let request = ActivityRequest::from_raw(1, "fuel", "diesel", &litres).unwrap();
        assert_eq!(classify(&request, &config()).unwrap().activity_code, "diesel_litre");

        let inputs = BTreeMap::from([("area_m2".to_string(), 10.0)]);
        let request = ActivityRequest::from_raw(2, "Energy", "premise type: office", &inputs).unwrap();
        assert_eq!(classify(&request, &config()).unwrap().quantity, 2000.0);
    }

    #[test]
    fn test_request_json_shape() {
        let json = r#"{"category":"fuel","fuel":"Diesel","economy_l_per_100km":8.0,"distance_km":1000.0,"fleet_size":1}"#;
        let request: ActivityRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.category(), Category::Fuel);

        let json = r#"{"category":"electricity_estimated","proxy":{"method":"occupancy","occupants":5}}"#;
        let request: ActivityRequest = serde_json::from_str(json).unwrap();
        assert_eq!(classify(&request, &config()).unwrap().quantity, 5000.0);
    }
}
