use std::collections::BTreeMap;
use std::fmt::Write;

use crate::models::{GenderGroup, Metric};
use crate::pipeline::{Comparison, GroupSummaries, SpeakerReport, TeamReport, TeamSection};
use crate::posterior::BetaPosterior;

pub fn render_speaker_report(title: &str, report: &SpeakerReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {title} - Speaker Statistics by Gender");
    let _ = writeln!(output, "Generated {}", report.generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Field");
    let _ = writeln!(
        output,
        "- {} competitors loaded, {} eligible, {} classified by first name",
        report.competitors, report.eligible, report.classified
    );
    let _ = writeln!(
        output,
        "- Name classification coverage: {:.1}%",
        report.coverage * 100.0
    );
    match report.male_to_female_ratio {
        Some(ratio) => {
            let _ = writeln!(output, "- Ratio of men to women: {ratio:.2}");
        }
        None => {
            let _ = writeln!(output, "- Ratio of men to women: n/a (no female competitors)");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Group Summaries");
    write_groups(&mut output, &report.groups);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Significance");
    write_comparison(&mut output, &report.comparison);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Posterior P({} > {})", report.comparison.metric, report.score_threshold);
    write_posteriors(&mut output, &report.posteriors);

    if let Some(teams) = &report.teams {
        let _ = writeln!(output);
        write_team_section(&mut output, teams);
    }

    output
}

pub fn render_team_report(title: &str, report: &TeamReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {title} - Team Statistics by Gender Composition");
    let _ = writeln!(output, "Generated {}", report.generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Teams");
    let _ = writeln!(
        output,
        "- {} teams loaded, {} eligible ({:?} classification)",
        report.teams, report.eligible, report.strategy
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "| Team | Debaters | Composition |");
    let _ = writeln!(output, "|------|----------|-------------|");
    for entry in &report.listing {
        let _ = writeln!(
            output,
            "| {} | {} / {} | {} |",
            entry.team_id, entry.members.0, entry.members.1, entry.label
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Composition Summaries");
    write_groups(&mut output, &report.groups);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Significance");
    write_comparison(&mut output, &report.comparison);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Posterior P({} > {})", report.comparison.metric, report.score_threshold);
    write_posteriors(&mut output, &report.posteriors);

    output
}

fn write_groups(output: &mut String, groups: &GroupSummaries) {
    if groups.is_empty() {
        let _ = writeln!(output, "No classified records.");
        return;
    }

    for (group, summaries) in groups {
        let _ = writeln!(output, "### {group}");
        for (metric, summary) in summaries {
            let _ = writeln!(
                output,
                "- {}: n={}, mean {:.2}, median {:.2}",
                metric, summary.count, summary.mean, summary.median
            );
        }
    }
}

fn write_comparison(output: &mut String, comparison: &Comparison) {
    let (first, second) = comparison.groups;
    let result = &comparison.result;
    let verdict = if result.significant {
        "Statistically significant"
    } else {
        "Not statistically significant"
    };
    let _ = writeln!(
        output,
        "- {verdict} difference in {} between {first} and {second}: p = {:.4} (alpha {})",
        comparison.metric, result.p_value, result.alpha
    );
    let _ = writeln!(
        output,
        "- Observed mean gap {:.2} over {} resamples",
        result.observed_diff, result.iterations
    );
}

fn write_posteriors(output: &mut String, posteriors: &BTreeMap<GenderGroup, BetaPosterior>) {
    for (group, posterior) in posteriors {
        let mean = posterior
            .mean()
            .map_or_else(|| "n/a".to_string(), |mean| format!("{mean:.3}"));
        let _ = writeln!(
            output,
            "- {group}: Beta({}, {}), posterior mean {mean}, tournament prior {:.3}",
            posterior.alpha, posterior.beta, posterior.prior_rate
        );
    }
}

fn write_team_section(output: &mut String, teams: &TeamSection) {
    let _ = writeln!(output, "## Teams ({:?} classification)", teams.strategy);
    let _ = writeln!(output, "- {} complete teams", teams.team_count);
    write_groups(output, &teams.groups);

    let _ = writeln!(output);
    let _ = writeln!(output, "### Speaks within FM teams");
    for (label, summary) in [("Male", &teams.mixed_split.male), ("Female", &teams.mixed_split.female)] {
        match summary {
            Some(summary) => {
                let _ = writeln!(
                    output,
                    "- {label} members: n={}, mean {:.1}",
                    summary.count, summary.mean
                );
            }
            None => {
                let _ = writeln!(output, "- {label} members: none identified");
            }
        }
    }

    if !teams.break_outlook.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "### P({} > 2 x rounds), normal approximation", Metric::Points);
        for (group, probability) in &teams.break_outlook {
            let _ = writeln!(output, "- {group}: {probability:.3}");
        }
    }
}
