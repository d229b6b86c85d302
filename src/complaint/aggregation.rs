//! Frequency tables over complaint categories and statuses.

use crate::complaint::model::Complaint;

/// Counts per key, in the order each key was first seen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
}

impl FrequencyTable {
    /// Count each key produced by `keys`.
    pub fn from_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut entries: Vec<(String, usize)> = Vec::new();

        for key in keys {
            let key = key.as_ref();

            match entries.iter_mut().find(|(existing, _)| existing == key) {
                Some((_, count)) => *count += 1,
                None => entries.push((key.to_owned(), 1)),
            }
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(label, _)| label.clone()).collect()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.entries.iter().map(|(_, count)| *count).collect()
    }

    /// The sum of every count, equal to the number of keys counted.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// The count for `key`, zero if it was never seen.
    pub fn get(&self, key: &str) -> usize {
        self.entries
            .iter()
            .find(|(label, _)| label == key)
            .map_or(0, |(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn count_by_category<'a>(complaints: impl IntoIterator<Item = &'a Complaint>) -> FrequencyTable {
    FrequencyTable::from_keys(complaints.into_iter().map(|complaint| complaint.tipo.as_str()))
}

pub fn count_by_status<'a>(complaints: impl IntoIterator<Item = &'a Complaint>) -> FrequencyTable {
    FrequencyTable::from_keys(
        complaints
            .into_iter()
            .map(|complaint| complaint.estatus.label()),
    )
}
