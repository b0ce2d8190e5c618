//! Run planning: the full pipeline from declarations to a group-ordered list
//! of units the host should execute.
//!
//! ```text
//! groups ──► group graph ──► group order ─────────────┐
//! units  ──► unit graph  ──► unit order ──────────────┤
//! request ─► necessary set (optionally via groups) ───┴─► RunPlan
//! ```

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, instrument};

use crate::builder::{build_group_graph, build_unit_graph};
use crate::config::PlanningConfig;
use crate::error::OrderError;
use crate::issue::Issue;
use crate::model::{Group, Unit, UnitId};
use crate::necessary::{resolve, resolve_with_groups};
use crate::orderer::order_graph;

/// One group's slice of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedGroup {
    pub name: String,
    pub serialized: bool,
    pub depends_on: Vec<String>,
    /// Group was not declared; it exists only because units named it.
    pub implicit: bool,
    /// Units to execute, in dependency order.
    pub units: Vec<Unit>,
}

impl PlannedGroup {
    /// The group as the skip decision expects it.
    #[must_use]
    pub fn group(&self) -> Group {
        Group::new(self.name.clone())
            .serialized(self.serialized)
            .depends_on(self.depends_on.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunPlan {
    /// Non-empty groups in group order.
    pub groups: Vec<PlannedGroup>,
    pub issues: Vec<Issue>,
    /// Distinct units requested (every unit when no request was given).
    pub requested: usize,
    /// Units in the plan.
    pub scheduled: usize,
}

impl RunPlan {
    /// Every planned unit, group by group.
    pub fn units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.groups.iter().flat_map(|group| group.units.iter())
    }
}

/// Plan a run over `groups` and `units`.
///
/// With `requested` set, only the necessary set of those units is planned;
/// otherwise every unit is. Units whose group was never declared get an
/// implicit, non-serialized group placed after the declared ones.
///
/// # Errors
///
/// Fails on an ambiguous dependency name or a cycle in either graph.
#[instrument(skip_all, fields(groups = groups.len(), units = units.len()))]
pub fn plan_run(
    groups: &[Group],
    units: &[Unit],
    requested: Option<&[UnitId]>,
    config: &PlanningConfig,
) -> Result<RunPlan, OrderError> {
    let (all_groups, implicit) = with_implicit_groups(groups, units);

    let group_built = build_group_graph(&all_groups)?;
    let group_sequence = order_graph(&group_built.graph)?;
    let mut issues = group_built.issues;

    let unit_built = build_unit_graph(units)?;
    let unit_sequence = order_graph(&unit_built.graph)?;
    issues.extend(unit_built.issues);

    let (selected, requested_count) = match requested {
        None => (None, unit_sequence.len()),
        Some(ids) => {
            let wanted: Vec<Unit> = ids
                .iter()
                .map(|id| {
                    units.iter().find(|u| &u.id == id).cloned().unwrap_or_else(|| {
                        Unit::new(id.group.clone(), id.name.clone())
                    })
                })
                .collect();

            let set = if config.expand_group_dependencies {
                resolve_with_groups(&unit_built.graph, &group_built.graph, units, &wanted)
            } else {
                resolve(&unit_built.graph, &wanted)
            };

            let requested_count = set.requested();
            issues.extend(set.issues.iter().cloned());
            let ids: HashSet<UnitId> = set.into_members().into_iter().map(|u| u.id).collect();
            (Some(ids), requested_count)
        }
    };

    let planned: Vec<PlannedGroup> = group_sequence
        .into_iter()
        .filter_map(|group| {
            let members: Vec<Unit> = unit_sequence
                .iter()
                .filter(|u| u.group() == group.name)
                .filter(|u| selected.as_ref().is_none_or(|ids| ids.contains(&u.id)))
                .cloned()
                .collect();
            if members.is_empty() {
                return None;
            }
            Some(PlannedGroup {
                implicit: implicit.contains(&group.name),
                name: group.name,
                serialized: group.serialized,
                depends_on: group.depends_on,
                units: members,
            })
        })
        .collect();

    let scheduled = planned.iter().map(|g| g.units.len()).sum();
    info!(
        groups = planned.len(),
        requested = requested_count,
        scheduled,
        issues = issues.len(),
        "run plan ready"
    );

    Ok(RunPlan {
        groups: planned,
        issues,
        requested: requested_count,
        scheduled,
    })
}

/// Declared groups followed by one implicit group per undeclared group name,
/// in the order units first mention them.
fn with_implicit_groups(groups: &[Group], units: &[Unit]) -> (Vec<Group>, HashSet<String>) {
    let declared: HashSet<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    let mut all = groups.to_vec();
    let mut implicit: HashSet<String> = HashSet::new();

    for unit in units {
        if !declared.contains(unit.group()) && implicit.insert(unit.group().to_string()) {
            all.push(Group::new(unit.group()));
        }
    }

    (all, implicit)
}
