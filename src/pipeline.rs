use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{
    attended, clears_floor, derive_teams, group_by, member_speaks_by_gender, summarize, Summary,
};
use crate::classify::{classify_individual, classify_team, TeamStrategy};
use crate::error::DomainError;
use crate::loader::{SpeakerTab, TeamTab};
use crate::models::{GenderGroup, GenderLabel, Metric, Scored, Team, TeamLabel};
use crate::names::NameGenderIndex;
use crate::posterior::{beta_posterior, normal_exceedance, BetaPosterior};
use crate::significance::{SignificanceResult, SignificanceTester, DEFAULT_ITERATIONS};

#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    pub metrics: Vec<Metric>,
    /// Metric compared between groups and fed to the posterior.
    pub test_metric: Metric,
    pub significance_threshold: f64,
    pub bootstrap_iterations: usize,
    pub score_threshold: f64,
    pub zero_score_exclusion: bool,
    /// Minimum team `Speaks`, exclusive. A team-tab row is checked on its
    /// combined total; a team built from a speaker tab needs each member
    /// above it.
    pub team_score_floor: f64,
    pub team_strategy: TeamStrategy,
    pub seed: Option<u64>,
    pub workers: usize,
    /// Rounds in the tournament, taken from the loaded tab when it has round columns.
    pub rounds: Option<usize>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            metrics: vec![Metric::Speaks, Metric::Ranks, Metric::Wins],
            test_metric: Metric::Speaks,
            significance_threshold: 0.05,
            bootstrap_iterations: DEFAULT_ITERATIONS,
            score_threshold: 80.0,
            zero_score_exclusion: true,
            team_score_floor: 60.0,
            team_strategy: TeamStrategy::Lenient,
            seed: None,
            workers: 1,
            rounds: None,
        }
    }
}

pub type GroupSummaries = BTreeMap<GenderGroup, BTreeMap<Metric, Summary>>;

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub metric: Metric,
    pub groups: (GenderGroup, GenderGroup),
    pub result: SignificanceResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct MixedTeamSplit {
    pub male: Option<Summary>,
    pub female: Option<Summary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamListing {
    pub team_id: String,
    pub members: (String, String),
    pub label: TeamLabel,
}

/// Team statistics derived from the `Team` column of a speaker tab.
#[derive(Debug, Clone, Serialize)]
pub struct TeamSection {
    pub strategy: TeamStrategy,
    pub team_count: usize,
    pub groups: GroupSummaries,
    pub mixed_split: MixedTeamSplit,
    /// Normal-approximation chance that a team's points exceed two per round.
    pub break_outlook: BTreeMap<GenderGroup, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeakerReport {
    pub generated_at: DateTime<Utc>,
    pub competitors: usize,
    pub eligible: usize,
    pub classified: usize,
    pub coverage: f64,
    pub male_to_female_ratio: Option<f64>,
    pub groups: GroupSummaries,
    pub comparison: Comparison,
    pub score_threshold: f64,
    pub posteriors: BTreeMap<GenderGroup, BetaPosterior>,
    pub teams: Option<TeamSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    pub generated_at: DateTime<Utc>,
    pub strategy: TeamStrategy,
    pub teams: usize,
    pub eligible: usize,
    pub listing: Vec<TeamListing>,
    pub groups: GroupSummaries,
    pub comparison: Comparison,
    pub score_threshold: f64,
    pub posteriors: BTreeMap<GenderGroup, BetaPosterior>,
}

/// Runs classification, aggregation and both inferential procedures over one
/// loaded tab. Formatting is left to the caller.
pub struct ReportPipeline<'a> {
    index: &'a NameGenderIndex,
    config: &'a ReportConfig,
}

impl<'a> ReportPipeline<'a> {
    pub fn new(index: &'a NameGenderIndex, config: &'a ReportConfig) -> Self {
        Self { index, config }
    }

    pub async fn speakers(&self, tab: &SpeakerTab) -> Result<SpeakerReport, DomainError> {
        let config = self.config;
        let eligible: Vec<_> = tab
            .competitors
            .iter()
            .filter(|competitor| !config.zero_score_exclusion || attended(competitor))
            .cloned()
            .collect();
        if eligible.len() < tab.competitors.len() {
            info!(
                excluded = tab.competitors.len() - eligible.len(),
                "excluded competitors with zero speaks"
            );
        }

        let resolved = tab
            .competitors
            .iter()
            .filter(|c| classify_individual(&c.full_name, self.index) != GenderLabel::Undefined)
            .count();
        let coverage = resolved as f64 / tab.competitors.len().max(1) as f64;

        let groups = group_by(&eligible, |c| classify_individual(&c.full_name, self.index).group());
        let classified: usize = groups.values().map(Vec::len).sum();
        let count = |group: GenderGroup| groups.get(&group).map_or(0, Vec::len);
        let male_to_female_ratio = match count(GenderGroup::Female) {
            0 => None,
            female => Some(count(GenderGroup::Male) as f64 / female as f64),
        };
        info!(
            eligible = eligible.len(),
            male = count(GenderGroup::Male),
            female = count(GenderGroup::Female),
            coverage,
            "classified speakers"
        );

        let metrics = self.requested_metrics(&tab.metrics);
        let summaries = summarize_groups(&groups, &metrics)?;
        let comparison = self.compare(&groups, &tab.metrics).await?;
        let posteriors = self.posteriors(&groups)?;

        let teams = if tab.has_teams {
            self.team_section(tab)?
        } else {
            None
        };

        Ok(SpeakerReport {
            generated_at: Utc::now(),
            competitors: tab.competitors.len(),
            eligible: eligible.len(),
            classified,
            coverage,
            male_to_female_ratio,
            groups: summaries,
            comparison,
            score_threshold: config.score_threshold,
            posteriors,
            teams,
        })
    }

    pub async fn teams(&self, tab: &TeamTab) -> Result<TeamReport, DomainError> {
        let config = self.config;
        let listing: Vec<TeamListing> = tab
            .teams
            .iter()
            .map(|team| TeamListing {
                team_id: team.team_id.clone(),
                members: team.members.clone(),
                label: self.label_team(team, TeamStrategy::Strict),
            })
            .collect();

        let eligible: Vec<Team> = tab
            .teams
            .iter()
            .filter(|team| clears_floor(*team, config.team_score_floor))
            .cloned()
            .collect();
        let groups = group_by(&eligible, |team| {
            self.label_team(team, config.team_strategy).group()
        });
        info!(
            teams = tab.teams.len(),
            eligible = eligible.len(),
            strategy = ?config.team_strategy,
            "classified teams"
        );

        let metrics = self.requested_metrics(&tab.metrics);
        let summaries = summarize_groups(&groups, &metrics)?;
        let comparison = self.compare(&groups, &tab.metrics).await?;
        let posteriors = self.posteriors(&groups)?;

        Ok(TeamReport {
            generated_at: Utc::now(),
            strategy: config.team_strategy,
            teams: tab.teams.len(),
            eligible: eligible.len(),
            listing,
            groups: summaries,
            comparison,
            score_threshold: config.score_threshold,
            posteriors,
        })
    }

    fn label_team(&self, team: &Team, strategy: TeamStrategy) -> TeamLabel {
        classify_team(&team.members.0, &team.members.1, self.index, strategy)
    }

    fn requested_metrics(&self, available: &BTreeSet<Metric>) -> Vec<Metric> {
        self.config
            .metrics
            .iter()
            .copied()
            .filter(|metric| {
                let present = available.contains(metric);
                if !present {
                    debug!(%metric, "metric not present in tab, skipping");
                }
                present
            })
            .collect()
    }

    async fn compare<T: Scored>(
        &self,
        groups: &BTreeMap<GenderGroup, Vec<&T>>,
        available: &BTreeSet<Metric>,
    ) -> Result<Comparison, DomainError> {
        let metric = self.config.test_metric;
        if !available.contains(&metric) {
            return Err(DomainError::MissingMetric {
                record: "tab".to_string(),
                metric,
            });
        }

        let (first, second) = largest_two(groups)?;
        let sample_a = present_values(&groups[&first], metric);
        let sample_b = present_values(&groups[&second], metric);

        let tester = SignificanceTester {
            iterations: self.config.bootstrap_iterations,
            workers: self.config.workers,
            seed: self.config.seed,
            alpha: self.config.significance_threshold,
        };
        let result = tester.run(&sample_a, &sample_b).await?;
        info!(
            %first,
            %second,
            %metric,
            p_value = result.p_value,
            significant = result.significant,
            "resampling test"
        );

        Ok(Comparison {
            metric,
            groups: (first, second),
            result,
        })
    }

    /// The tournament-wide prior is drawn from classified records only.
    fn posteriors<T: Scored>(
        &self,
        groups: &BTreeMap<GenderGroup, Vec<&T>>,
    ) -> Result<BTreeMap<GenderGroup, BetaPosterior>, DomainError> {
        let metric = self.config.test_metric;
        let everyone: Vec<f64> = groups
            .values()
            .flat_map(|records| present_values(records, metric))
            .collect();

        groups
            .iter()
            .map(|(group, records)| {
                let sample = present_values(records, metric);
                beta_posterior(&sample, self.config.score_threshold, &everyone)
                    .map(|posterior| (*group, posterior))
            })
            .collect()
    }

    fn team_section(&self, tab: &SpeakerTab) -> Result<Option<TeamSection>, DomainError> {
        let config = self.config;
        let teams = derive_teams(&tab.competitors, config.team_score_floor);
        if teams.is_empty() {
            warn!("speaker tab has a Team column but no complete teams");
            return Ok(None);
        }

        let groups = group_by(&teams, |team| {
            self.label_team(team, config.team_strategy).group()
        });
        let metrics: Vec<Metric> = [Metric::Points, Metric::Wins, Metric::Speaks]
            .into_iter()
            .filter(|metric| tab.metrics.contains(metric))
            .collect();
        let summaries = summarize_groups(&groups, &metrics)?;

        let mixed: HashSet<&str> = groups
            .get(&GenderGroup::FM)
            .map(|teams| teams.iter().map(|team| team.team_id.as_str()).collect())
            .unwrap_or_default();
        let (male, female) = member_speaks_by_gender(&tab.competitors, &mixed, self.index);
        let mixed_split = MixedTeamSplit {
            male: summarize_values(&male),
            female: summarize_values(&female),
        };

        let mut break_outlook = BTreeMap::new();
        if let Some(rounds) = config.rounds.filter(|rounds| *rounds > 0) {
            let cutoff = 2.0 * rounds as f64;
            for (group, records) in &groups {
                let points = present_values(records, Metric::Points);
                if points.is_empty() {
                    continue;
                }
                break_outlook.insert(*group, normal_exceedance(&points, cutoff)?);
            }
        }

        Ok(Some(TeamSection {
            strategy: config.team_strategy,
            team_count: teams.len(),
            groups: summaries,
            mixed_split,
            break_outlook,
        }))
    }
}

/// Summaries per group, counting only records that carry each metric.
fn summarize_groups<T: Scored>(
    groups: &BTreeMap<GenderGroup, Vec<&T>>,
    metrics: &[Metric],
) -> Result<GroupSummaries, DomainError> {
    let mut out = GroupSummaries::new();
    for (group, records) in groups {
        let entry = out.entry(*group).or_default();
        for metric in metrics {
            let with_metric: Vec<&T> = records
                .iter()
                .copied()
                .filter(|record| record.metric(*metric).is_some())
                .collect();
            if with_metric.is_empty() {
                debug!(%group, %metric, "no values to summarise");
                continue;
            }
            entry.insert(*metric, summarize(&with_metric, *metric)?);
        }
    }
    Ok(out)
}

fn summarize_values(values: &[f64]) -> Option<Summary> {
    let mean = crate::aggregate::mean(values).ok()?;
    let median = crate::aggregate::median(values).ok()?;
    Some(Summary {
        count: values.len(),
        mean,
        median,
    })
}

fn present_values<T: Scored>(records: &[&T], metric: Metric) -> Vec<f64> {
    records.iter().filter_map(|record| record.metric(metric)).collect()
}

/// The two most populous groups, ties resolved by group order.
fn largest_two<T>(
    groups: &BTreeMap<GenderGroup, Vec<&T>>,
) -> Result<(GenderGroup, GenderGroup), DomainError> {
    let mut sizes: Vec<(GenderGroup, usize)> = groups
        .iter()
        .filter(|(_, records)| !records.is_empty())
        .map(|(group, records)| (*group, records.len()))
        .collect();
    sizes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    match sizes.as_slice() {
        [first, second, ..] => Ok((first.0, second.0)),
        _ => Err(DomainError::InsufficientGroups {
            found: sizes.iter().map(|(group, _)| *group).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Competitor, Gender, NameRecord};

    fn index() -> NameGenderIndex {
        let names = [
            ("Adam", Gender::Male),
            ("Ben", Gender::Male),
            ("Carl", Gender::Male),
            ("Dev", Gender::Male),
            ("Eli", Gender::Male),
            ("Fay", Gender::Female),
            ("Gia", Gender::Female),
            ("Hana", Gender::Female),
            ("Iris", Gender::Female),
            ("Jo", Gender::Female),
        ];
        let records: Vec<NameRecord> = names
            .iter()
            .map(|(name, gender)| NameRecord {
                first_name: name.to_string(),
                gender: *gender,
                frequency: 100,
            })
            .collect();
        NameGenderIndex::build(&records)
    }

    fn competitor(name: &str, team: Option<&str>, speaks: f64, points: Option<f64>) -> Competitor {
        let mut metrics = BTreeMap::new();
        metrics.insert(Metric::Speaks, speaks);
        if let Some(points) = points {
            metrics.insert(Metric::Points, points);
        }
        Competitor {
            full_name: name.to_string(),
            team_id: team.map(str::to_string),
            metrics,
            raw: BTreeMap::new(),
        }
    }

    fn separated_tab() -> SpeakerTab {
        let male = ["Adam", "Ben", "Carl", "Dev", "Eli"];
        let female = ["Fay", "Gia", "Hana", "Iris", "Jo"];
        let mut competitors = Vec::new();
        for (i, name) in male.iter().enumerate() {
            competitors.push(competitor(&format!("{name} Smith"), None, 70.0 + 2.0 * i as f64, None));
        }
        for (i, name) in female.iter().enumerate() {
            competitors.push(competitor(&format!("{name} Jones"), None, 80.0 + 2.0 * i as f64, None));
        }
        SpeakerTab {
            competitors,
            rounds: 0,
            metrics: [Metric::Speaks].into_iter().collect(),
            has_teams: false,
        }
    }

    fn seeded() -> ReportConfig {
        ReportConfig {
            seed: Some(11),
            ..ReportConfig::default()
        }
    }

    #[tokio::test]
    async fn separated_speakers_end_to_end() {
        let index = index();
        let config = seeded();
        let report = ReportPipeline::new(&index, &config)
            .speakers(&separated_tab())
            .await
            .unwrap();

        let male = report.groups[&GenderGroup::Male][&Metric::Speaks];
        let female = report.groups[&GenderGroup::Female][&Metric::Speaks];
        assert_eq!(male.count, 5);
        assert!((male.mean - 74.0).abs() < 1e-9);
        assert!((female.mean - 84.0).abs() < 1e-9);
        assert!((female.median - 84.0).abs() < 1e-9);

        assert!(report.comparison.result.p_value < 0.05);
        assert!(report.comparison.result.significant);
        assert_eq!(report.male_to_female_ratio, Some(1.0));
        assert_eq!(report.coverage, 1.0);
        assert!(report.teams.is_none());

        // Half the field is at or above 80: two prior successes for a group of five.
        let female_posterior = report.posteriors[&GenderGroup::Female];
        assert_eq!((female_posterior.prior_alpha, female_posterior.prior_beta), (2, 3));
        assert_eq!((female_posterior.alpha, female_posterior.beta), (6, 4));
        let male_posterior = report.posteriors[&GenderGroup::Male];
        assert_eq!((male_posterior.alpha, male_posterior.beta), (2, 8));
    }

    #[tokio::test]
    async fn zero_speaks_are_excluded_unless_disabled() {
        let index = index();
        let mut tab = separated_tab();
        tab.competitors.push(competitor("Adam Absent", None, 0.0, None));

        let config = seeded();
        let report = ReportPipeline::new(&index, &config).speakers(&tab).await.unwrap();
        assert_eq!(report.competitors, 11);
        assert_eq!(report.eligible, 10);
        assert!((report.groups[&GenderGroup::Male][&Metric::Speaks].mean - 74.0).abs() < 1e-9);

        let config = ReportConfig {
            zero_score_exclusion: false,
            ..seeded()
        };
        let report = ReportPipeline::new(&index, &config).speakers(&tab).await.unwrap();
        assert_eq!(report.groups[&GenderGroup::Male][&Metric::Speaks].count, 6);
    }

    #[tokio::test]
    async fn unresolved_names_stay_out_of_gender_groups() {
        let index = index();
        let mut tab = separated_tab();
        tab.competitors.push(competitor("Quinn Ray", None, 99.0, None));

        let config = seeded();
        let report = ReportPipeline::new(&index, &config).speakers(&tab).await.unwrap();
        assert_eq!(report.eligible, 11);
        assert_eq!(report.classified, 10);
        assert!((report.coverage - 10.0 / 11.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn nan_speaks_stop_the_run_before_summaries() {
        let index = index();
        let tab = SpeakerTab {
            competitors: vec![
                competitor("Adam A", None, 70.0, None),
                competitor("Adam B", None, f64::NAN, None),
                competitor("Fay F", None, 80.0, None),
                competitor("Fay G", None, 82.0, None),
            ],
            rounds: 0,
            metrics: [Metric::Speaks].into_iter().collect(),
            has_teams: false,
        };

        let config = seeded();
        let err = ReportPipeline::new(&index, &config)
            .speakers(&tab)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::NonFiniteMetric {
                record: "Adam B".to_string(),
                metric: Metric::Speaks,
            }
        );
    }

    #[tokio::test]
    async fn prior_rate_counts_classified_competitors_only() {
        let index = index();
        let tab = SpeakerTab {
            competitors: vec![
                competitor("Adam A", None, 70.0, None),
                competitor("Fay F", None, 90.0, None),
                competitor("Zed Y", None, 70.0, None),
                competitor("Zed Z", None, 70.0, None),
            ],
            rounds: 0,
            metrics: [Metric::Speaks].into_iter().collect(),
            has_teams: false,
        };
        let config = ReportConfig {
            bootstrap_iterations: 200,
            ..seeded()
        };

        let report = ReportPipeline::new(&index, &config).speakers(&tab).await.unwrap();
        assert_eq!(report.eligible, 4);
        for posterior in report.posteriors.values() {
            assert!((posterior.prior_rate - 0.5).abs() < 1e-12);
        }
        let female = report.posteriors[&GenderGroup::Female];
        assert_eq!((female.alpha, female.beta), (1, 1));
    }

    #[tokio::test]
    async fn single_gender_field_cannot_be_compared() {
        let index = index();
        let mut tab = separated_tab();
        tab.competitors.truncate(5);

        let config = seeded();
        let err = ReportPipeline::new(&index, &config)
            .speakers(&tab)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientGroups {
                found: vec![GenderGroup::Male]
            }
        );
    }

    #[tokio::test]
    async fn speaker_tab_teams_are_summarised() {
        let index = index();
        let competitors = vec![
            competitor("Adam A", Some("Alpha"), 76.0, Some(15.0)),
            competitor("Ben B", Some("Alpha"), 75.0, Some(15.0)),
            competitor("Fay F", Some("Beta"), 77.0, Some(13.0)),
            competitor("Gia G", Some("Beta"), 78.0, Some(13.0)),
            competitor("Carl C", Some("Gamma"), 74.0, Some(9.0)),
            competitor("Hana H", Some("Gamma"), 79.0, Some(9.0)),
            competitor("Dev D", Some("Delta"), 72.0, Some(10.0)),
            competitor("Iris I", Some("Delta"), 73.0, Some(10.0)),
        ];
        let tab = SpeakerTab {
            competitors,
            rounds: 5,
            metrics: [Metric::Speaks, Metric::Points].into_iter().collect(),
            has_teams: true,
        };
        let config = ReportConfig {
            rounds: Some(tab.rounds),
            ..seeded()
        };

        let report = ReportPipeline::new(&index, &config).speakers(&tab).await.unwrap();
        let teams = report.teams.expect("team section");
        assert_eq!(teams.team_count, 4);
        assert_eq!(teams.groups[&GenderGroup::MM][&Metric::Points].mean, 15.0);
        assert_eq!(teams.groups[&GenderGroup::FF][&Metric::Points].count, 1);
        let mixed = teams.groups[&GenderGroup::FM][&Metric::Points];
        assert_eq!(mixed.count, 2);
        assert!((mixed.mean - 9.5).abs() < 1e-9);

        let male = teams.mixed_split.male.expect("male members");
        let female = teams.mixed_split.female.expect("female members");
        assert!((male.mean - 73.0).abs() < 1e-9);
        assert!((female.mean - 76.0).abs() < 1e-9);

        assert_eq!(teams.break_outlook[&GenderGroup::MM], 1.0);
        assert_eq!(teams.break_outlook[&GenderGroup::FF], 1.0);
        assert!(teams.break_outlook[&GenderGroup::FM] < 0.5);
    }

    fn team(first: &str, second: &str, speaks: f64, wins: f64) -> Team {
        let mut metrics = BTreeMap::new();
        metrics.insert(Metric::Speaks, speaks);
        metrics.insert(Metric::Wins, wins);
        Team {
            team_id: format!("{first} & {second}"),
            members: (first.to_string(), second.to_string()),
            metrics,
        }
    }

    fn team_tab() -> TeamTab {
        TeamTab {
            teams: vec![
                team("Adam A", "Ben B", 150.0, 4.0),
                team("Carl C", "Dev D", 152.0, 5.0),
                team("Fay F", "Gia G", 160.0, 3.0),
                team("Hana H", "Eli E", 158.0, 4.0),
                team("Iris I", "Quinn Q", 149.0, 2.0),
                team("Jo J", "Ray R", 0.0, 0.0),
            ],
            metrics: [Metric::Speaks, Metric::Wins].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn lenient_team_strategy_folds_unresolved_into_mixed() {
        let index = index();
        let config = ReportConfig {
            bootstrap_iterations: 500,
            ..seeded()
        };
        let report = ReportPipeline::new(&index, &config).teams(&team_tab()).await.unwrap();

        assert_eq!(report.teams, 6);
        assert_eq!(report.eligible, 5);
        assert_eq!(report.groups[&GenderGroup::FM][&Metric::Speaks].count, 2);
        assert_eq!(report.groups[&GenderGroup::MM][&Metric::Wins].mean, 4.5);
        assert_eq!(report.comparison.groups, (GenderGroup::MM, GenderGroup::FM));

        let labels: Vec<TeamLabel> = report.listing.iter().map(|entry| entry.label).collect();
        assert_eq!(
            labels,
            vec![
                TeamLabel::MM,
                TeamLabel::MM,
                TeamLabel::FF,
                TeamLabel::FM,
                TeamLabel::Undefined,
                TeamLabel::Undefined,
            ]
        );
    }

    #[tokio::test]
    async fn strict_team_strategy_drops_unresolved_pairs() {
        let index = index();
        let config = ReportConfig {
            team_strategy: TeamStrategy::Strict,
            bootstrap_iterations: 500,
            ..seeded()
        };
        let report = ReportPipeline::new(&index, &config).teams(&team_tab()).await.unwrap();
        assert_eq!(report.groups[&GenderGroup::FM][&Metric::Speaks].count, 1);
        assert_eq!(report.posteriors.len(), 3);
    }

    #[tokio::test]
    async fn missing_test_metric_is_reported() {
        let index = index();
        let config = ReportConfig {
            test_metric: Metric::Ranks,
            ..seeded()
        };
        let err = ReportPipeline::new(&index, &config)
            .speakers(&separated_tab())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::MissingMetric {
                metric: Metric::Ranks,
                ..
            }
        ));
    }

    #[test]
    fn requested_metrics_are_limited_to_the_tab() {
        let index = index();
        let config = ReportConfig::default();
        let pipeline = ReportPipeline::new(&index, &config);
        let available: BTreeSet<Metric> = [Metric::Speaks, Metric::Wins].into_iter().collect();
        assert_eq!(
            pipeline.requested_metrics(&available),
            vec![Metric::Speaks, Metric::Wins]
        );
    }
}
