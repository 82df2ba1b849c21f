// 📊 Aggregator - tCO2e by (scope, quality) and by scope
// Always recomputed from the enriched rows it is given

use crate::enrichment::EnrichedRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// AGGREGATE SUMMARY
// ============================================================================

/// Sparse mapping (scope, quality) → summed tCO2e
///
/// Groups without rows are absent, never zero-valued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateSummary {
    groups: BTreeMap<(u8, String), f64>,
}

impl AggregateSummary {
    pub fn get(&self, scope: u8, quality: &str) -> Option<f64> {
        self.groups.get(&(scope, quality.to_string())).copied()
    }

    /// (scope, quality, tCO2e), ordered by scope then quality
    pub fn groups(&self) -> impl Iterator<Item = (u8, &str, f64)> {
        self.groups.iter().map(|((scope, quality), t)| (*scope, quality.as_str(), *t))
    }

    /// Flat records for JSON consumers (tuple keys do not map to JSON objects)
    pub fn records(&self) -> Vec<SummaryGroup> {
        self.groups()
            .map(|(scope, quality, t_co2e)| SummaryGroup {
                scope,
                quality: quality.to_string(),
                t_co2e,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.groups.values().sum()
    }

    /// Scope × quality matrix for charting; empty cells are None
    pub fn pivot(&self) -> Pivot {
        let mut scopes: Vec<u8> = self.groups.keys().map(|(s, _)| *s).collect();
        scopes.dedup();

        let mut qualities: Vec<String> = self.groups.keys().map(|(_, q)| q.clone()).collect();
        qualities.sort();
        qualities.dedup();

        let cells = scopes
            .iter()
            .map(|scope| {
                qualities
                    .iter()
                    .map(|q| self.get(*scope, q))
                    .collect()
            })
            .collect();

        Pivot { scopes, qualities, cells }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryGroup {
    pub scope: u8,
    pub quality: String,
    #[serde(rename = "tCO2e")]
    pub t_co2e: f64,
}

/// Pivoted view: one row per scope, one column per quality tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pivot {
    pub scopes: Vec<u8>,
    pub qualities: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

// ============================================================================
// SUMMARIZE
// ============================================================================

/// Group by (scope, quality) and sum tCO2e
pub fn summarize(rows: &[EnrichedRow]) -> AggregateSummary {
    let mut groups: BTreeMap<(u8, String), f64> = BTreeMap::new();

    for row in rows {
        *groups.entry((row.scope, row.quality.clone())).or_insert(0.0) += row.t_co2e;
    }

    debug!(rows = rows.len(), groups = groups.len(), "summarized emissions");
    AggregateSummary { groups }
}

/// Sum tCO2e per scope across quality tiers; scopes without rows are absent
pub fn totals_by_scope(rows: &[EnrichedRow]) -> BTreeMap<u8, f64> {
    let mut totals = BTreeMap::new();

    for row in rows {
        *totals.entry(row.scope).or_insert(0.0) += row.t_co2e;
    }

    totals
}

/// Sum of every row's tCO2e
pub fn grand_total(rows: &[EnrichedRow]) -> f64 {
    rows.iter().map(|r| r.t_co2e).sum()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{QUALITY_ESTIMATED_PROXY, QUALITY_MEASURED};

    fn row(scope: u8, quality: &str, t: f64) -> EnrichedRow {
        EnrichedRow {
            activity_code: "x".to_string(),
            quantity: 1.0,
            unit: "u".to_string(),
            scope,
            quality: quality.to_string(),
            ef: t * 1000.0,
            kg_co2e: t * 1000.0,
            t_co2e: t,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_summarize_groups_by_scope_and_quality() {
        let rows = vec![
            row(1, QUALITY_MEASURED, 0.268),
            row(2, QUALITY_MEASURED, 0.43),
            row(2, QUALITY_ESTIMATED_PROXY, 4.3),
            row(2, QUALITY_MEASURED, 0.07),
        ];

        let summary = summarize(&rows);

        assert_eq!(summary.len(), 3);
        assert!(approx(summary.get(1, QUALITY_MEASURED).unwrap(), 0.268));
        assert!(approx(summary.get(2, QUALITY_MEASURED).unwrap(), 0.5));
        assert!(approx(summary.get(2, QUALITY_ESTIMATED_PROXY).unwrap(), 4.3));
    }

    #[test]
    fn test_empty_groups_are_absent() {
        let summary = summarize(&[row(3, QUALITY_MEASURED, 1.0)]);

        assert_eq!(summary.get(1, QUALITY_MEASURED), None);
        assert_eq!(summary.get(3, QUALITY_ESTIMATED_PROXY), None);
        assert!(summarize(&[]).is_empty());
        assert!(totals_by_scope(&[]).is_empty());
    }

    #[test]
    fn test_views_are_additive() {
        let rows = vec![
            row(1, QUALITY_MEASURED, 0.1),
            row(1, "Measured – fleet", 2.2),
            row(2, QUALITY_ESTIMATED_PROXY, 3.3),
            row(3, QUALITY_MEASURED, 0.04),
            row(3, QUALITY_MEASURED, 5.0),
        ];

        let summary = summarize(&rows);
        let by_scope = totals_by_scope(&rows);
        let total = grand_total(&rows);

        assert!(approx(summary.total(), total));
        assert!(approx(by_scope.values().sum::<f64>(), total));

        for (scope, scope_total) in &by_scope {
            let from_groups: f64 = summary.groups().filter(|(s, _, _)| s == scope).map(|(_, _, t)| t).sum();
            assert!(approx(from_groups, *scope_total));
        }
    }

    #[test]
    fn test_pivot_marks_empty_cells() {
        let rows = vec![
            row(1, QUALITY_MEASURED, 1.0),
            row(2, QUALITY_ESTIMATED_PROXY, 2.0),
        ];

        let pivot = summarize(&rows).pivot();

        assert_eq!(pivot.scopes, vec![1, 2]);
        assert_eq!(pivot.qualities, vec![QUALITY_ESTIMATED_PROXY.to_string(), QUALITY_MEASURED.to_string()]);
        assert_eq!(pivot.cells[0], vec![None, Some(1.0)]);
        assert_eq!(pivot.cells[1], vec![Some(2.0), None]);
    }

    #[test]
    fn test_records_serialize_to_json() {
        let summary = summarize(&[row(2, QUALITY_MEASURED, 0.43)]);
        let json = serde_json::to_string(&summary.records()).unwrap();

        assert_eq!(json, r#"[{"scope":2,"quality":"Measured","tCO2e":0.43}]"#);
    }
}
