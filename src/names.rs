use std::collections::HashMap;

use crate::models::{Gender, GenderLabel, NameRecord};

/// First name to predominant gender, built once per run from a frequency table.
#[derive(Debug, Clone, Default)]
pub struct NameGenderIndex {
    names: HashMap<String, Gender>,
}

impl NameGenderIndex {
    /// Keeps, per first name, the entry with the strictly greatest frequency.
    /// Equal frequencies leave the earlier entry in place.
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a NameRecord>,
    {
        let mut best: HashMap<&'a str, (Gender, u64)> = HashMap::new();

        for record in records {
            let entry = best
                .entry(record.first_name.as_str())
                .or_insert((record.gender, record.frequency));
            if record.frequency > entry.1 {
                *entry = (record.gender, record.frequency);
            }
        }

        let names = best
            .into_iter()
            .map(|(name, (gender, _))| (name.to_string(), gender))
            .collect();

        Self { names }
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, first_name: &str) -> GenderLabel {
        self.names
            .get(first_name)
            .map_or(GenderLabel::Undefined, |gender| GenderLabel::from(*gender))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, gender: Gender, frequency: u64) -> NameRecord {
        NameRecord {
            first_name: name.to_string(),
            gender,
            frequency,
        }
    }

    #[test]
    fn single_entry_maps_to_its_gender() {
        let records = vec![
            record("Alice", Gender::Female, 120),
            record("Bob", Gender::Male, 90),
        ];
        let index = NameGenderIndex::build(&records);
        assert_eq!(index.lookup("Alice"), GenderLabel::Female);
        assert_eq!(index.lookup("Bob"), GenderLabel::Male);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn most_frequent_gender_wins() {
        let records = vec![
            record("Emily", Gender::Male, 12),
            record("Emily", Gender::Female, 25_000),
            record("Jordan", Gender::Female, 4_000),
            record("Jordan", Gender::Male, 9_000),
        ];
        let index = NameGenderIndex::build(&records);
        assert_eq!(index.lookup("Emily"), GenderLabel::Female);
        assert_eq!(index.lookup("Jordan"), GenderLabel::Male);
    }

    #[test]
    fn ties_keep_first_seen_entry() {
        let records = vec![
            record("Casey", Gender::Female, 500),
            record("Casey", Gender::Male, 500),
        ];
        let index = NameGenderIndex::build(&records);
        assert_eq!(index.lookup("Casey"), GenderLabel::Female);
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let records = vec![record("Alice", Gender::Female, 1)];
        let index = NameGenderIndex::build(&records);
        assert_eq!(index.lookup("alice"), GenderLabel::Undefined);
        assert_eq!(index.lookup("Alic"), GenderLabel::Undefined);
        assert_eq!(index.lookup(""), GenderLabel::Undefined);
    }

    #[test]
    fn empty_table_classifies_everything_undefined() {
        let index = NameGenderIndex::build(&Vec::<NameRecord>::new());
        assert!(index.is_empty());
        assert_eq!(index.lookup("Alice"), GenderLabel::Undefined);
    }
}
