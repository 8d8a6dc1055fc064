use serde::Serialize;

use crate::models::{GenderLabel, TeamLabel};
use crate::names::NameGenderIndex;

/// How a team with an unresolved member is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
pub enum TeamStrategy {
    /// Any unresolved member makes the whole team `Undefined`.
    Strict,
    /// Only fully resolved MM and FF pairs are distinguished; everything else is FM.
    #[default]
    Lenient,
}

/// The token before the first space, or `None` when there is nothing to look up.
pub fn first_name(full_name: &str) -> Option<&str> {
    full_name.split(' ').next().filter(|token| !token.is_empty())
}

pub fn classify_individual(full_name: &str, index: &NameGenderIndex) -> GenderLabel {
    first_name(full_name).map_or(GenderLabel::Undefined, |name| index.lookup(name))
}

pub fn classify_team(
    first: &str,
    second: &str,
    index: &NameGenderIndex,
    strategy: TeamStrategy,
) -> TeamLabel {
    let pair = (
        classify_individual(first, index),
        classify_individual(second, index),
    );

    match strategy {
        TeamStrategy::Strict => strict_label(pair),
        TeamStrategy::Lenient => match pair {
            (GenderLabel::Male, GenderLabel::Male) => TeamLabel::MM,
            (GenderLabel::Female, GenderLabel::Female) => TeamLabel::FF,
            _ => TeamLabel::FM,
        },
    }
}

fn strict_label(pair: (GenderLabel, GenderLabel)) -> TeamLabel {
    let codes = match pair {
        (GenderLabel::Undefined, _) | (_, GenderLabel::Undefined) => return TeamLabel::Undefined,
        (a, b) => {
            let mut codes = [a.to_string(), b.to_string()];
            codes.sort();
            codes.concat()
        }
    };

    match codes.as_str() {
        "MM" => TeamLabel::MM,
        "FF" => TeamLabel::FF,
        _ => TeamLabel::FM,
    }
}
