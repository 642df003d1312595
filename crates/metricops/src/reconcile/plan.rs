//! Chart diffing by name.

use std::collections::{HashMap, HashSet};

use crate::config::ConfigError;
use crate::model::{ChartDefinition, RemoteChart, SpaceDefinition};

/// Chart operations needed to turn the existing charts of a space into the
/// desired ones.
#[derive(Debug, Default, PartialEq)]
pub struct ChartPlan<'a> {
    /// Existing charts whose name is not desired any more.
    pub delete: Vec<&'a RemoteChart>,
    /// Desired charts paired with the existing chart of the same name.
    pub update: Vec<(&'a RemoteChart, &'a ChartDefinition)>,
    /// Desired charts with no existing counterpart.
    pub create: Vec<&'a ChartDefinition>,
}

impl ChartPlan<'_> {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.update.is_empty() && self.create.is_empty()
    }

    pub fn len(&self) -> usize {
        self.delete.len() + self.update.len() + self.create.len()
    }
}

/// Matches existing and desired charts by name.
///
/// The three sets are disjoint and keep the iteration order of their inputs.
/// When several existing charts share a name, the first one is updated and
/// the others are left alone.
pub fn plan_charts<'a>(existing: &'a [RemoteChart], desired: &'a [ChartDefinition]) -> ChartPlan<'a> {
    let desired_names: HashSet<&str> = desired.iter().map(|chart| chart.name.as_str()).collect();

    let mut by_name: HashMap<&str, &RemoteChart> = HashMap::new();
    for chart in existing {
        by_name.entry(chart.name()).or_insert(chart);
    }

    let mut plan = ChartPlan::default();

    for chart in existing {
        if !desired_names.contains(chart.name()) {
            plan.delete.push(chart);
        }
    }

    for chart in desired {
        match by_name.get(chart.name.as_str()) {
            Some(&current) => plan.update.push((current, chart)),
            None => plan.create.push(chart),
        }
    }

    plan
}

/// Checks that every chart has a name and that names are unique.
pub fn validate_space(space: &SpaceDefinition) -> Result<(), ConfigError> {
    if space.charts.iter().any(|chart| chart.name.is_empty()) {
        return Err(ConfigError::EmptyChartName {
            space: space.name.clone(),
        });
    }

    let mut seen = HashSet::new();
    if !space.charts.iter().all(|chart| seen.insert(chart.name.as_str())) {
        return Err(ConfigError::DuplicateChartNames {
            space: space.name.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: u64, name: &str) -> RemoteChart {
        RemoteChart {
            id,
            definition: ChartDefinition::new(name),
        }
    }

    fn names(charts: &[&ChartDefinition]) -> Vec<String> {
        charts.iter().map(|chart| chart.name.clone()).collect()
    }

    #[test]
    fn test_plan_matches_by_name() {
        let existing = vec![remote(1, "chart1"), remote(2, "chart2")];
        let desired = vec![ChartDefinition::new("chart1"), ChartDefinition::new("chart3")];

        let plan = plan_charts(&existing, &desired);

        assert_eq!(plan.delete.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(plan.update.len(), 1);
        assert_eq!(plan.update[0].0.id, 1);
        assert_eq!(plan.update[0].1.name, "chart1");
        assert_eq!(names(&plan.create), vec!["chart3"]);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_plan_keeps_iteration_order() {
        let existing = vec![remote(5, "e"), remote(4, "d"), remote(3, "c")];
        let desired = vec![
            ChartDefinition::new("z"),
            ChartDefinition::new("c"),
            ChartDefinition::new("y"),
        ];

        let plan = plan_charts(&existing, &desired);

        assert_eq!(plan.delete.iter().map(|c| c.id).collect::<Vec<_>>(), vec![5, 4]);
        assert_eq!(names(&plan.create), vec!["z", "y"]);
    }

    #[test]
    fn test_plan_edge_cases() {
        let existing = vec![remote(1, "a")];
        let desired = vec![ChartDefinition::new("a")];

        // (existing, desired, deletes, updates, creates)
        let cases: [(&[RemoteChart], &[ChartDefinition], usize, usize, usize); 4] = [
            (&[], &[], 0, 0, 0),
            (&existing, &[], 1, 0, 0),
            (&[], &desired, 0, 0, 1),
            (&existing, &desired, 0, 1, 0),
        ];

        for (i, (existing, desired, deletes, updates, creates)) in cases.into_iter().enumerate() {
            let plan = plan_charts(existing, desired);
            assert_eq!(plan.delete.len(), deletes, "case {i}");
            assert_eq!(plan.update.len(), updates, "case {i}");
            assert_eq!(plan.create.len(), creates, "case {i}");
        }
    }

    #[test]
    fn test_plan_duplicate_remote_names_update_first() {
        let existing = vec![remote(1, "a"), remote(2, "a")];
        let desired = vec![ChartDefinition::new("a")];

        let plan = plan_charts(&existing, &desired);
        assert!(plan.delete.is_empty());
        assert_eq!(plan.update[0].0.id, 1);
    }

    #[test]
    fn test_validate_empty_name() {
        let space = SpaceDefinition {
            name: "S".to_string(),
            charts: vec![ChartDefinition::new("")],
        };
        let err = validate_space(&space).unwrap_err();
        assert_eq!(err.to_string(), "empty chart name in space S");
    }

    #[test]
    fn test_validate_duplicate_names() {
        let space = SpaceDefinition {
            name: "S".to_string(),
            charts: vec![ChartDefinition::new("A"), ChartDefinition::new("A")],
        };
        let err = validate_space(&space).unwrap_err();
        assert_eq!(err.to_string(), "duplicate chart names in space S");
    }

    #[test]
    fn test_validate_ok() {
        let space = SpaceDefinition {
            name: "S".to_string(),
            charts: vec![ChartDefinition::new("A"), ChartDefinition::new("B")],
        };
        assert!(validate_space(&space).is_ok());
        assert!(validate_space(&SpaceDefinition::default()).is_ok());
    }
}
