use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::classify::classify_individual;
use crate::error::DomainError;
use crate::models::{Competitor, GenderLabel, Metric, Scored, Team};
use crate::names::NameGenderIndex;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
}

/// Buckets records by key. Records whose key is `None` are left out.
pub fn group_by<'a, T, K, F>(records: &'a [T], key_fn: F) -> BTreeMap<K, Vec<&'a T>>
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    let mut groups: BTreeMap<K, Vec<&'a T>> = BTreeMap::new();
    for record in records {
        if let Some(key) = key_fn(record) {
            groups.entry(key).or_default().push(record);
        }
    }
    groups
}

/// Values of `metric` across the group. Missing or non-finite values are errors.
pub fn metric_values<T: Scored>(group: &[&T], metric: Metric) -> Result<Vec<f64>, DomainError> {
    group
        .iter()
        .map(|record| {
            let value = record.require(metric)?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(DomainError::NonFiniteMetric {
                    record: record.display_name().to_string(),
                    metric,
                })
            }
        })
        .collect()
}

pub fn summarize<T: Scored>(group: &[&T], metric: Metric) -> Result<Summary, DomainError> {
    if group.is_empty() {
        return Err(DomainError::EmptyGroup(format!("no records to summarise {metric}")));
    }
    let values = metric_values(group, metric)?;
    Ok(Summary {
        count: values.len(),
        mean: mean(&values)?,
        median: median(&values)?,
    })
}

pub fn mean(values: &[f64]) -> Result<f64, DomainError> {
    if values.is_empty() {
        return Err(DomainError::EmptySample("mean of no values"));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Middle value, averaging the two central values for even lengths.
pub fn median(values: &[f64]) -> Result<f64, DomainError> {
    if values.is_empty() {
        return Err(DomainError::EmptySample("median of no values"));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Result<f64, DomainError> {
    let mu = mean(values)?;
    let variance = values.iter().map(|value| (value - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(variance.sqrt())
}

/// A zero speaker score marks a competitor who did not attend or forfeited.
pub fn attended(competitor: &Competitor) -> bool {
    competitor.metric(Metric::Speaks) != Some(0.0)
}

pub fn clears_floor<T: Scored>(record: &T, floor: f64) -> bool {
    record.metric(Metric::Speaks).is_some_and(|speaks| speaks > floor)
}

/// Pairs competitors into teams by team id, in first-seen order.
///
/// Teams with fewer than two members are dropped and only the first two rows
/// of a team are paired. A team is kept only when both members' speaks clear
/// `member_floor`. Team points and wins come from the first member's row,
/// speaks are summed.
pub fn derive_teams(competitors: &[Competitor], member_floor: f64) -> Vec<Team> {
    let mut order: Vec<&str> = Vec::new();
    let mut members: BTreeMap<&str, Vec<&Competitor>> = BTreeMap::new();

    for competitor in competitors {
        let Some(team_id) = competitor.team_id.as_deref() else {
            continue;
        };
        let entry = members.entry(team_id).or_default();
        if entry.is_empty() {
            order.push(team_id);
        }
        entry.push(competitor);
    }

    let mut teams = Vec::new();
    for team_id in order {
        let Some(rows) = members.get(team_id) else {
            continue;
        };
        let [first, second, ..] = rows.as_slice() else {
            continue;
        };
        if !clears_floor(*first, member_floor) || !clears_floor(*second, member_floor) {
            continue;
        }

        let mut metrics = BTreeMap::new();
        for metric in [Metric::Points, Metric::Wins] {
            if let Some(value) = first.metric(metric) {
                metrics.insert(metric, value);
            }
        }
        if let (Some(a), Some(b)) = (first.metric(Metric::Speaks), second.metric(Metric::Speaks)) {
            metrics.insert(Metric::Speaks, a + b);
        }

        teams.push(Team {
            team_id: team_id.to_string(),
            members: (first.full_name.clone(), second.full_name.clone()),
            metrics,
        });
    }
    teams
}

/// Speaks of male and female members belonging to the given teams.
pub fn member_speaks_by_gender(
    competitors: &[Competitor],
    team_ids: &HashSet<&str>,
    index: &NameGenderIndex,
) -> (Vec<f64>, Vec<f64>) {
    let mut male = Vec::new();
    let mut female = Vec::new();

    for competitor in competitors {
        let on_team = competitor
            .team_id
            .as_deref()
            .is_some_and(|team_id| team_ids.contains(team_id));
        let Some(speaks) = competitor.metric(Metric::Speaks).filter(|_| on_team) else {
            continue;
        };
        match classify_individual(&competitor.full_name, index) {
            GenderLabel::Male => male.push(speaks),
            GenderLabel::Female => female.push(speaks),
            GenderLabel::Undefined => {}
        }
    }

    (male, female)
}
