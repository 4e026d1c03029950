//! Min-max normalization and composite index derivation.
//!
//! Normalization bounds are taken over the frame passed in, not fixed
//! globally. Deriving over a filtered subset therefore changes every index
//! value, even for rows present in both frames: indices are only comparable
//! within one derivation call over one consistent row set.

use crate::config::PipelineConfig;
use crate::error::{PrepError, Result};
use crate::registry::{ColumnRegistry, SemanticRole};
use crate::utils::series_to_f64_vec;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Header of the derived health column.
pub const HEALTH_INDEX: &str = "Health Index";
/// Header of the derived economic column.
pub const ECONOMIC_INDEX: &str = "Economic Index";
/// Header of the derived mortality burden column.
pub const MORTALITY_PRESSURE: &str = "Mortality Pressure";

/// Headers of all derived columns, in derivation order.
pub const DERIVED_COLUMNS: [&str; 3] = [HEALTH_INDEX, ECONOMIC_INDEX, MORTALITY_PRESSURE];

/// One component of a composite index: a role, normalized, optionally
/// inverted (1 − x) so that "lower raw value is better" raises the index.
#[derive(Debug, Clone, Copy)]
struct Component {
    role: SemanticRole,
    inverted: bool,
}

impl Component {
    const fn of(role: SemanticRole) -> Self {
        Self {
            role,
            inverted: false,
        }
    }

    const fn inverted(role: SemanticRole) -> Self {
        Self {
            role,
            inverted: true,
        }
    }
}

/// The three composite indices, each the unweighted mean of exactly three
/// min-max normalized components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeIndex {
    Health,
    Economic,
    MortalityPressure,
}

impl CompositeIndex {
    /// All indices, in derivation order.
    pub const ALL: [CompositeIndex; 3] = [
        CompositeIndex::Health,
        CompositeIndex::Economic,
        CompositeIndex::MortalityPressure,
    ];

    /// Header of the derived column.
    pub fn output_column(&self) -> &'static str {
        match self {
            CompositeIndex::Health => HEALTH_INDEX,
            CompositeIndex::Economic => ECONOMIC_INDEX,
            CompositeIndex::MortalityPressure => MORTALITY_PRESSURE,
        }
    }

    /// The roles this index depends on.
    pub fn roles(&self) -> [SemanticRole; 3] {
        self.components().map(|c| c.role)
    }

    fn components(&self) -> [Component; 3] {
        match self {
            // Adult mortality is inverted: lower mortality raises the index.
            CompositeIndex::Health => [
                Component::of(SemanticRole::LifeExpectancy),
                Component::of(SemanticRole::Bmi),
                Component::inverted(SemanticRole::AdultMortality),
            ],
            CompositeIndex::Economic => [
                Component::of(SemanticRole::Gdp),
                Component::of(SemanticRole::IncomeComposition),
                Component::of(SemanticRole::Schooling),
            ],
            // Burden, not quality: higher pressure is worse, and the index is
            // deliberately not inverted.
            CompositeIndex::MortalityPressure => [
                Component::of(SemanticRole::AdultMortality),
                Component::of(SemanticRole::InfantDeaths),
                Component::of(SemanticRole::UnderFiveMortality),
            ],
        }
    }
}

/// Min-max normalize a numeric series into [0,1].
///
/// Bounds are computed over finite values. When the series is degenerate
/// (min == max, or no finite values at all) every output element is `fill`:
/// see [`crate::config::DEGENERATE_NORM_FILL`]. Null or non-finite inputs
/// also map to `fill`; after cleaning neither occurs.
pub fn min_max(series: &Series, fill: f64) -> Result<Series> {
    let values = series_to_f64_vec(series)?;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.iter().flatten() {
        if v.is_finite() {
            min = min.min(*v);
            max = max.max(*v);
        }
    }

    let degenerate = !min.is_finite() || !max.is_finite() || min == max;

    let normalized: Vec<f64> = values
        .iter()
        .map(|opt| match opt {
            Some(v) if !degenerate && v.is_finite() => (v - min) / (max - min),
            _ => fill,
        })
        .collect();

    Ok(Series::new(series.name().clone(), normalized))
}

/// Derives the composite index columns and appends them to the frame.
pub struct KpiDeriver;

impl KpiDeriver {
    /// Append every derivable composite index to `df`.
    ///
    /// Returns the derived column names and human-readable step strings.
    /// Indices whose roles are absent from the registry are skipped (the
    /// registry's resolution policy already decided whether that is fatal).
    pub fn derive(
        &self,
        df: &mut DataFrame,
        registry: &ColumnRegistry,
        config: &PipelineConfig,
    ) -> Result<(Vec<String>, Vec<String>)> {
        let mut derived = Vec::new();
        let mut steps = Vec::new();
        let mut normalized_cache: HashMap<SemanticRole, Vec<f64>> = HashMap::new();

        info!("Deriving composite indices over {} rows...", df.height());

        for index in CompositeIndex::ALL {
            if !registry.has_all(&index.roles()) {
                steps.push(format!(
                    "Skipped '{}' (unresolved component role)",
                    index.output_column()
                ));
                continue;
            }

            let column = self.derive_index(df, index, registry, config, &mut normalized_cache)?;
            df.with_column(column)
                .map_err(|e| PrepError::DerivationFailed {
                    index: index.output_column().to_string(),
                    reason: e.to_string(),
                })?;

            debug!("Derived '{}'", index.output_column());
            derived.push(index.output_column().to_string());
            steps.push(format!(
                "Derived '{}' from {:?}",
                index.output_column(),
                index.roles().map(|r| r.label())
            ));
        }

        Ok((derived, steps))
    }

    /// Compute one composite index as the elementwise mean of its normalized
    /// components.
    fn derive_index(
        &self,
        df: &DataFrame,
        index: CompositeIndex,
        registry: &ColumnRegistry,
        config: &PipelineConfig,
        cache: &mut HashMap<SemanticRole, Vec<f64>>,
    ) -> Result<Series> {
        let mut sums = vec![0.0f64; df.height()];

        for component in index.components() {
            if !cache.contains_key(&component.role) {
                let header = registry.column(component.role)?;
                let series = df
                    .column(header)
                    .map_err(|_| PrepError::ColumnNotFound(header.to_string()))?
                    .as_materialized_series();
                let normalized = min_max(series, config.degenerate_fill)?;
                let values: Vec<f64> = normalized
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(config.degenerate_fill))
                    .collect();
                cache.insert(component.role, values);
            }

            let values = &cache[&component.role];
            for (sum, v) in sums.iter_mut().zip(values) {
                *sum += if component.inverted { 1.0 - v } else { *v };
            }
        }

        let means: Vec<f64> = sums.into_iter().map(|s| s / 3.0).collect();
        Ok(Series::new(index.output_column().into(), means))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MissingRolePolicy, DEGENERATE_NORM_FILL};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{} != {}", a, b);
    }

    #[test]
    fn test_min_max_basic() {
        let series = Series::new("v".into(), &[50.0, 60.0, 70.0]);
        let normalized = min_max(&series, DEGENERATE_NORM_FILL).unwrap();
        let ca = normalized.f64().unwrap();

        assert_close(ca.get(0).unwrap(), 0.0);
        assert_close(ca.get(1).unwrap(), 0.5);
        assert_close(ca.get(2).unwrap(), 1.0);
    }

    #[test]
    fn test_min_max_bounds() {
        let series = Series::new("v".into(), &[3.0, -1.0, 10.0, 4.5, 0.0]);
        let normalized = min_max(&series, DEGENERATE_NORM_FILL).unwrap();
        for v in normalized.f64().unwrap().into_iter().flatten() {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_min_max_constant_series_is_half() {
        let series = Series::new("v".into(), &[7.0, 7.0, 7.0]);
        let normalized = min_max(&series, DEGENERATE_NORM_FILL).unwrap();
        for v in normalized.f64().unwrap().into_iter().flatten() {
            assert_eq!(v, 0.5);
        }
    }

    #[test]
    fn test_min_max_all_missing_is_half() {
        let series = Series::new("v".into(), &[Option::<f64>::None, None, None]);
        let normalized = min_max(&series, DEGENERATE_NORM_FILL).unwrap();
        assert_eq!(normalized.null_count(), 0);
        for v in normalized.f64().unwrap().into_iter().flatten() {
            assert_eq!(v, 0.5);
        }
    }

    #[test]
    fn test_min_max_single_row_is_half() {
        // One row: min == max by construction
        let series = Series::new("v".into(), &[42.0]);
        let normalized = min_max(&series, DEGENERATE_NORM_FILL).unwrap();
        assert_eq!(normalized.f64().unwrap().get(0).unwrap(), 0.5);
    }

    #[test]
    fn test_min_max_integer_input() {
        let series = Series::new("v".into(), &[0i64, 5, 10]);
        let normalized = min_max(&series, DEGENERATE_NORM_FILL).unwrap();
        let ca = normalized.f64().unwrap();
        assert_close(ca.get(1).unwrap(), 0.5);
    }

    fn three_row_frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("Country".into(), &["A", "B", "C"]).into(),
            Series::new("Year".into(), &[2015i64, 2015, 2015]).into(),
            Series::new("Life expectancy".into(), &[50.0, 60.0, 70.0]).into(),
            Series::new("BMI".into(), &[20.0, 25.0, 30.0]).into(),
            Series::new("Adult Mortality".into(), &[300.0, 200.0, 100.0]).into(),
            Series::new("infant deaths".into(), &[80.0, 40.0, 10.0]).into(),
            Series::new("under-five deaths".into(), &[90.0, 50.0, 15.0]).into(),
            Series::new("GDP".into(), &[500.0, 2000.0, 9000.0]).into(),
            Series::new("Income composition of resources".into(), &[0.3, 0.5, 0.8]).into(),
            Series::new("Schooling".into(), &[5.0, 10.0, 15.0]).into(),
        ])
        .unwrap()
    }

    fn derive(df: &mut DataFrame) -> (Vec<String>, Vec<String>) {
        let config = PipelineConfig::default();
        let (registry, _) = ColumnRegistry::resolve(df, MissingRolePolicy::Fail).unwrap();
        KpiDeriver.derive(df, &registry, &config).unwrap()
    }

    #[test]
    fn test_health_index_exact_scenario() {
        let mut df = three_row_frame();
        derive(&mut df);

        let health = df.column(HEALTH_INDEX).unwrap();
        let ca = health.as_materialized_series().f64().unwrap().clone();

        // Row 1: mm(life)=0, mm(bmi)=0, 1-mm(mort)=1-1=0 -> 0.0
        assert_close(ca.get(0).unwrap(), 0.0);
        // Row 2: 0.5, 0.5, 1-0.5 -> 0.5
        assert_close(ca.get(1).unwrap(), 0.5);
        // Row 3: mm(life)=1, mm(bmi)=1, 1-mm(mort)=1-0=1 -> 1.0
        assert_close(ca.get(2).unwrap(), 1.0);
    }

    #[test]
    fn test_all_indices_in_unit_interval() {
        let mut df = three_row_frame();
        let (derived, _) = derive(&mut df);
        assert_eq!(derived.len(), 3);

        for name in DERIVED_COLUMNS {
            let col = df.column(name).unwrap();
            for v in col
                .as_materialized_series()
                .f64()
                .unwrap()
                .into_iter()
                .flatten()
            {
                assert!((0.0..=1.0).contains(&v), "{} out of range in {}", v, name);
            }
        }
    }

    #[test]
    fn test_mortality_pressure_not_inverted() {
        let mut df = three_row_frame();
        derive(&mut df);

        // Row 1 has the worst mortality on all three components -> pressure 1.0
        let pressure = df.column(MORTALITY_PRESSURE).unwrap();
        let ca = pressure.as_materialized_series().f64().unwrap().clone();
        assert_close(ca.get(0).unwrap(), 1.0);
        assert_close(ca.get(2).unwrap(), 0.0);
    }

    #[test]
    fn test_constant_component_contributes_half() {
        let mut df = three_row_frame();
        // Make BMI constant: its normalized component becomes 0.5 everywhere
        df.replace("BMI", Series::new("BMI".into(), &[22.0, 22.0, 22.0]))
            .unwrap();
        derive(&mut df);

        let health = df.column(HEALTH_INDEX).unwrap();
        let ca = health.as_materialized_series().f64().unwrap().clone();
        // Row 1: (0 + 0.5 + 0)/3
        assert_close(ca.get(0).unwrap(), 0.5 / 3.0);
        // Row 3: (1 + 0.5 + 1)/3
        assert_close(ca.get(2).unwrap(), 2.5 / 3.0);
    }

    #[test]
    fn test_skip_policy_omits_dependent_indices() {
        let mut df = three_row_frame();
        let _ = df.drop_in_place("GDP").unwrap();

        let config = PipelineConfig::default();
        let (registry, warnings) =
            ColumnRegistry::resolve(&df, MissingRolePolicy::Skip).unwrap();
        assert_eq!(warnings.len(), 1);

        let (derived, steps) = KpiDeriver.derive(&mut df, &registry, &config).unwrap();

        // Economic Index depends on gdp and is omitted; the others survive
        assert_eq!(
            derived,
            vec![HEALTH_INDEX.to_string(), MORTALITY_PRESSURE.to_string()]
        );
        assert!(df.column(ECONOMIC_INDEX).is_err());
        assert!(steps.iter().any(|s| s.contains("Skipped")));
    }

    #[test]
    fn test_subset_changes_bounds_and_indices() {
        // Full frame: A's life expectancy of 50 normalizes to 0 against a
        // max of 70. Drop row C and the max becomes 60, so every normalized
        // value (and therefore every index) shifts for the remaining rows.
        let mut full = three_row_frame();
        derive(&mut full);
        let full_health_b = full
            .column(HEALTH_INDEX)
            .unwrap()
            .get(1)
            .unwrap()
            .try_extract::<f64>()
            .unwrap();

        let mut subset = three_row_frame().head(Some(2));
        derive(&mut subset);
        let subset_health_b = subset
            .column(HEALTH_INDEX)
            .unwrap()
            .get(1)
            .unwrap()
            .try_extract::<f64>()
            .unwrap();

        // Row B is unchanged data, but its index value moved
        assert!((full_health_b - subset_health_b).abs() > 1e-9);
    }
}
