use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "M" | "m" | "Male" | "male" => Ok(Gender::Male),
            "F" | "f" | "Female" | "female" => Ok(Gender::Female),
            other => Err(format!("unrecognised gender '{other}'")),
        }
    }
}

/// Outcome of looking a first name up in the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GenderLabel {
    Male,
    Female,
    Undefined,
}

impl GenderLabel {
    pub fn group(self) -> Option<GenderGroup> {
        match self {
            GenderLabel::Male => Some(GenderGroup::Male),
            GenderLabel::Female => Some(GenderGroup::Female),
            GenderLabel::Undefined => None,
        }
    }
}

impl From<Gender> for GenderLabel {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => GenderLabel::Male,
            Gender::Female => GenderLabel::Female,
        }
    }
}

impl fmt::Display for GenderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GenderLabel::Male => "M",
            GenderLabel::Female => "F",
            GenderLabel::Undefined => "Undefined",
        };
        f.write_str(text)
    }
}

/// Gender composition of a two-person team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TeamLabel {
    MM,
    FF,
    FM,
    Undefined,
}

impl TeamLabel {
    pub fn group(self) -> Option<GenderGroup> {
        match self {
            TeamLabel::MM => Some(GenderGroup::MM),
            TeamLabel::FF => Some(GenderGroup::FF),
            TeamLabel::FM => Some(GenderGroup::FM),
            TeamLabel::Undefined => None,
        }
    }
}

impl fmt::Display for TeamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.group() {
            Some(group) => group.fmt(f),
            None => f.write_str("Undefined"),
        }
    }
}

/// Aggregation key. Individuals fall into Male/Female, teams into MM/FF/FM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GenderGroup {
    Male,
    Female,
    MM,
    FF,
    FM,
}

impl fmt::Display for GenderGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GenderGroup::Male => "Male",
            GenderGroup::Female => "Female",
            GenderGroup::MM => "MM",
            GenderGroup::FF => "FF",
            GenderGroup::FM => "FM",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Metric {
    Speaks,
    Ranks,
    Wins,
    Points,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Speaks => "Speaks",
            Metric::Ranks => "Ranks",
            Metric::Wins => "Wins",
            Metric::Points => "Points",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "speaks" => Ok(Metric::Speaks),
            "ranks" => Ok(Metric::Ranks),
            "wins" => Ok(Metric::Wins),
            "points" => Ok(Metric::Points),
            _ => Err(DomainError::UnknownMetric(value.to_string())),
        }
    }
}

/// One row of the reference name-frequency table.
#[derive(Debug, Clone, PartialEq)]
pub struct NameRecord {
    pub first_name: String,
    pub gender: Gender,
    pub frequency: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Competitor {
    pub full_name: String,
    pub team_id: Option<String>,
    pub metrics: BTreeMap<Metric, f64>,
    /// Columns the schema does not interpret, kept for display.
    pub raw: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct Team {
    pub team_id: String,
    pub members: (String, String),
    pub metrics: BTreeMap<Metric, f64>,
}

/// Anything carrying named numeric metrics that the aggregator can read.
pub trait Scored {
    fn display_name(&self) -> &str;

    fn metric(&self, metric: Metric) -> Option<f64>;

    fn require(&self, metric: Metric) -> Result<f64, DomainError> {
        self.metric(metric).ok_or_else(|| DomainError::MissingMetric {
            record: self.display_name().to_string(),
            metric,
        })
    }
}

impl Scored for Competitor {
    fn display_name(&self) -> &str {
        &self.full_name
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }
}

impl Scored for Team {
    fn display_name(&self) -> &str {
        &self.team_id
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }
}
