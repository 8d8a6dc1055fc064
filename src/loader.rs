use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::Path;

use csv::StringRecord;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{DataSourceError, DomainError};
use crate::models::{Competitor, Gender, Metric, NameRecord, Team};

const OPTIONAL_METRICS: [Metric; 3] = [Metric::Ranks, Metric::Wins, Metric::Points];

#[derive(Debug, Clone, Default)]
pub struct SpeakerTab {
    pub competitors: Vec<Competitor>,
    /// Number of `R<n>` round columns in the header.
    pub rounds: usize,
    pub metrics: BTreeSet<Metric>,
    pub has_teams: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TeamTab {
    pub teams: Vec<Team>,
    pub metrics: BTreeSet<Metric>,
}

pub fn load_names(path: &Path) -> Result<Vec<NameRecord>, DataSourceError> {
    let label = path.display().to_string();
    let reader = csv::Reader::from_path(path).map_err(|source| DataSourceError::Csv {
        path: label.clone(),
        source,
    })?;
    let records = read_names(reader, &label)?;
    info!(path = %label, records = records.len(), "loaded name table");
    Ok(records)
}

pub fn load_speaker_tab(path: &Path) -> Result<SpeakerTab, DataSourceError> {
    let label = path.display().to_string();
    let reader = csv::Reader::from_path(path).map_err(|source| DataSourceError::Csv {
        path: label.clone(),
        source,
    })?;
    let tab = read_speaker_tab(reader, &label)?;
    info!(
        path = %label,
        competitors = tab.competitors.len(),
        rounds = tab.rounds,
        "loaded speaker tab"
    );
    Ok(tab)
}

pub fn load_team_tab(path: &Path) -> Result<TeamTab, DataSourceError> {
    let label = path.display().to_string();
    let reader = csv::Reader::from_path(path).map_err(|source| DataSourceError::Csv {
        path: label.clone(),
        source,
    })?;
    let tab = read_team_tab(reader, &label)?;
    info!(path = %label, teams = tab.teams.len(), "loaded team tab");
    Ok(tab)
}

fn read_names<R: io::Read>(
    mut reader: csv::Reader<R>,
    label: &str,
) -> Result<Vec<NameRecord>, DataSourceError> {
    #[derive(Deserialize)]
    struct CsvRow {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Gender")]
        gender: String,
        #[serde(rename = "Frequency")]
        frequency: u64,
    }

    let mut records = Vec::new();
    for (offset, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.map_err(|source| DataSourceError::Csv {
            path: label.to_string(),
            source,
        })?;
        let gender: Gender = row.gender.parse().map_err(|reason| DataSourceError::Invalid {
            path: label.to_string(),
            source: DomainError::MalformedRecord {
                row: offset + 2,
                reason,
            },
        })?;
        records.push(NameRecord {
            first_name: row.name,
            gender,
            frequency: row.frequency,
        });
    }
    Ok(records)
}

struct Columns {
    headers: StringRecord,
}

impl Columns {
    fn find(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header.trim() == name)
    }

    fn require(&self, name: &'static str, label: &str) -> Result<usize, DataSourceError> {
        self.find(name).ok_or_else(|| DataSourceError::MissingColumn {
            path: label.to_string(),
            column: name,
        })
    }
}

fn headers<R: io::Read>(reader: &mut csv::Reader<R>, label: &str) -> Result<Columns, DataSourceError> {
    let headers = reader.headers().map_err(|source| DataSourceError::Csv {
        path: label.to_string(),
        source,
    })?;
    Ok(Columns {
        headers: headers.clone(),
    })
}

fn is_round_column(header: &str) -> bool {
    header
        .trim()
        .strip_prefix('R')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

fn text<'r>(record: &'r StringRecord, column: usize) -> &'r str {
    record.get(column).map(str::trim).unwrap_or("")
}

fn number(record: &StringRecord, column: usize, row: usize) -> Result<Option<f64>, DomainError> {
    let value = text(record, column);
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(DomainError::MalformedRecord {
            row,
            reason: format!("'{value}' is not a finite number"),
        }),
    }
}

fn required_text(record: &StringRecord, column: usize, row: usize, field: &str) -> Result<String, DomainError> {
    let value = text(record, column);
    if value.is_empty() {
        return Err(DomainError::MalformedRecord {
            row,
            reason: format!("missing {field}"),
        });
    }
    Ok(value.to_string())
}

fn read_speaker_tab<R: io::Read>(
    mut reader: csv::Reader<R>,
    label: &str,
) -> Result<SpeakerTab, DataSourceError> {
    let columns = headers(&mut reader, label)?;
    let name_col = columns.require("Name", label)?;
    let speaks_col = columns.require("Speaks", label)?;
    let team_col = columns.find("Team");
    let optional: Vec<(Metric, usize)> = OPTIONAL_METRICS
        .iter()
        .filter_map(|metric| columns.find(metric.as_str()).map(|col| (*metric, col)))
        .collect();

    let known: BTreeSet<usize> = [Some(name_col), Some(speaks_col), team_col]
        .into_iter()
        .flatten()
        .chain(optional.iter().map(|(_, col)| *col))
        .collect();
    let rounds = columns.headers.iter().filter(|h| is_round_column(h)).count();

    let invalid = |source: DomainError| DataSourceError::Invalid {
        path: label.to_string(),
        source,
    };

    let mut competitors = Vec::new();
    for (offset, result) in reader.records().enumerate() {
        let record = result.map_err(|source| DataSourceError::Csv {
            path: label.to_string(),
            source,
        })?;
        let row = offset + 2;

        let full_name = required_text(&record, name_col, row, "Name").map_err(invalid)?;
        let mut metrics = BTreeMap::new();
        // Blank speaks are read as 0, the marker for an absent competitor.
        let speaks = number(&record, speaks_col, row).map_err(invalid)?.unwrap_or(0.0);
        metrics.insert(Metric::Speaks, speaks);
        for (metric, col) in &optional {
            if let Some(value) = number(&record, *col, row).map_err(invalid)? {
                metrics.insert(*metric, value);
            }
        }

        let raw = columns
            .headers
            .iter()
            .enumerate()
            .filter(|(col, _)| !known.contains(col))
            .map(|(col, header)| (header.trim().to_string(), text(&record, col).to_string()))
            .collect();

        competitors.push(Competitor {
            full_name,
            team_id: team_col
                .map(|col| text(&record, col))
                .filter(|team| !team.is_empty())
                .map(str::to_string),
            metrics,
            raw,
        });
    }

    if competitors.is_empty() {
        return Err(DataSourceError::Empty(label.to_string()));
    }

    let mut metrics: BTreeSet<Metric> = optional.iter().map(|(metric, _)| *metric).collect();
    metrics.insert(Metric::Speaks);
    debug!(?metrics, rounds, "speaker tab schema");

    Ok(SpeakerTab {
        competitors,
        rounds,
        metrics,
        has_teams: team_col.is_some(),
    })
}

fn read_team_tab<R: io::Read>(
    mut reader: csv::Reader<R>,
    label: &str,
) -> Result<TeamTab, DataSourceError> {
    let columns = headers(&mut reader, label)?;
    let first_col = columns.require("Debater 1", label)?;
    let second_col = columns.require("Debater 2", label)?;
    let speaks_col = columns.require("Speaks", label)?;
    let team_col = columns.find("Team");
    let optional: Vec<(Metric, usize)> = OPTIONAL_METRICS
        .iter()
        .filter_map(|metric| columns.find(metric.as_str()).map(|col| (*metric, col)))
        .collect();

    let invalid = |source: DomainError| DataSourceError::Invalid {
        path: label.to_string(),
        source,
    };

    let mut teams = Vec::new();
    for (offset, result) in reader.records().enumerate() {
        let record = result.map_err(|source| DataSourceError::Csv {
            path: label.to_string(),
            source,
        })?;
        let row = offset + 2;

        let first = required_text(&record, first_col, row, "Debater 1").map_err(invalid)?;
        let second = required_text(&record, second_col, row, "Debater 2").map_err(invalid)?;
        let mut metrics = BTreeMap::new();
        let speaks = number(&record, speaks_col, row).map_err(invalid)?.unwrap_or(0.0);
        metrics.insert(Metric::Speaks, speaks);
        for (metric, col) in &optional {
            if let Some(value) = number(&record, *col, row).map_err(invalid)? {
                metrics.insert(*metric, value);
            }
        }

        let team_id = team_col
            .map(|col| text(&record, col))
            .filter(|team| !team.is_empty())
            .map_or_else(|| format!("{first} & {second}"), str::to_string);

        teams.push(Team {
            team_id,
            members: (first, second),
            metrics,
        });
    }

    if teams.is_empty() {
        return Err(DataSourceError::Empty(label.to_string()));
    }

    let mut metrics: BTreeSet<Metric> = optional.iter().map(|(metric, _)| *metric).collect();
    metrics.insert(Metric::Speaks);

    Ok(TeamTab { teams, metrics })
}
