//! Semantic column registry.
//!
//! Source datasets name their columns freely ("Life expectancy ", "infant
//! deaths", "under-five deaths"). Every indicator the KPI deriver consumes is
//! a *role* resolved once per load to whatever literal header the table
//! carries, via keyword-substring matching with a shortest-match tie-break:
//! the canonical column beats derived/compound columns whose names happen to
//! contain the same keywords.

use crate::config::MissingRolePolicy;
use crate::error::{PrepError, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// The indicator roles the KPI deriver depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticRole {
    LifeExpectancy,
    Bmi,
    AdultMortality,
    InfantDeaths,
    UnderFiveMortality,
    Gdp,
    IncomeComposition,
    Schooling,
}

impl SemanticRole {
    /// All roles, in a stable order.
    pub const ALL: [SemanticRole; 8] = [
        SemanticRole::LifeExpectancy,
        SemanticRole::Bmi,
        SemanticRole::AdultMortality,
        SemanticRole::InfantDeaths,
        SemanticRole::UnderFiveMortality,
        SemanticRole::Gdp,
        SemanticRole::IncomeComposition,
        SemanticRole::Schooling,
    ];

    /// Lowercase keyword fragments that must all appear in a normalized
    /// header for it to be a candidate for this role.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            SemanticRole::LifeExpectancy => &["life", "expect"],
            SemanticRole::Bmi => &["bmi"],
            SemanticRole::AdultMortality => &["adult", "mort"],
            SemanticRole::InfantDeaths => &["infant", "death"],
            SemanticRole::UnderFiveMortality => &["under", "five"],
            SemanticRole::Gdp => &["gdp"],
            SemanticRole::IncomeComposition => &["income", "composition"],
            SemanticRole::Schooling => &["school"],
        }
    }

    /// Short stable name, used in errors and reports.
    pub fn label(&self) -> &'static str {
        match self {
            SemanticRole::LifeExpectancy => "life-expectancy",
            SemanticRole::Bmi => "bmi",
            SemanticRole::AdultMortality => "adult-mortality",
            SemanticRole::InfantDeaths => "infant-deaths",
            SemanticRole::UnderFiveMortality => "under-five-mortality",
            SemanticRole::Gdp => "gdp",
            SemanticRole::IncomeComposition => "income-composition",
            SemanticRole::Schooling => "schooling",
        }
    }
}

/// Normalize a header for keyword matching: lowercase with spaces,
/// underscores and hyphens stripped.
fn normalize_for_match(header: &str) -> String {
    header
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect()
}

/// Find the header matching a keyword set.
///
/// A header is a candidate when every keyword fragment appears as a substring
/// of its normalized form. Among candidates the shortest normalized header
/// wins; length ties go to the first in header order.
pub fn detect_col<'a>(headers: &'a [String], keywords: &[&str]) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;

    for header in headers {
        let norm = normalize_for_match(header);
        if keywords.iter().all(|k| norm.contains(k)) {
            match best {
                Some((_, best_len)) if norm.len() >= best_len => {}
                _ => best = Some((header.as_str(), norm.len())),
            }
        }
    }

    best.map(|(header, _)| header)
}

/// Map from semantic role to the literal header that carries it in the
/// loaded table. Resolved once per load and consumed by the KPI deriver and
/// the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRegistry {
    columns: HashMap<SemanticRole, String>,
}

impl ColumnRegistry {
    /// Resolve every role against the frame's headers.
    ///
    /// Under [`MissingRolePolicy::Fail`] the first unresolvable role is a
    /// configuration error naming the role and its keyword set. Under
    /// [`MissingRolePolicy::Skip`] unresolvable roles are left absent and a
    /// warning string is returned for each.
    pub fn resolve(df: &DataFrame, policy: MissingRolePolicy) -> Result<(Self, Vec<String>)> {
        let headers: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let mut columns = HashMap::new();
        let mut warnings = Vec::new();

        for role in SemanticRole::ALL {
            match detect_col(&headers, role.keywords()) {
                Some(header) => {
                    debug!("Resolved role '{}' to column '{}'", role.label(), header);
                    columns.insert(role, header.to_string());
                }
                None => match policy {
                    MissingRolePolicy::Fail => {
                        return Err(PrepError::RoleNotResolved {
                            role: role.label().to_string(),
                            keywords: role.keywords().iter().map(|k| k.to_string()).collect(),
                        });
                    }
                    MissingRolePolicy::Skip => {
                        warn!("No column matches role '{}'", role.label());
                        warnings.push(format!(
                            "No column matches role '{}' (keywords: {:?}); dependent indices omitted",
                            role.label(),
                            role.keywords()
                        ));
                    }
                },
            }
        }

        Ok((Self { columns }, warnings))
    }

    /// The resolved header for a role, if any.
    pub fn get(&self, role: SemanticRole) -> Option<&str> {
        self.columns.get(&role).map(|s| s.as_str())
    }

    /// The resolved header for a role, or an error naming the role.
    pub fn column(&self, role: SemanticRole) -> Result<&str> {
        self.get(role).ok_or_else(|| PrepError::RoleNotResolved {
            role: role.label().to_string(),
            keywords: role.keywords().iter().map(|k| k.to_string()).collect(),
        })
    }

    /// Whether every role in the slice resolved.
    pub fn has_all(&self, roles: &[SemanticRole]) -> bool {
        roles.iter().all(|r| self.columns.contains_key(r))
    }

    /// Stable label -> header map for summaries and reports.
    pub fn as_label_map(&self) -> BTreeMap<String, String> {
        self.columns
            .iter()
            .map(|(role, header)| (role.label().to_string(), header.clone()))
            .collect()
    }
}
