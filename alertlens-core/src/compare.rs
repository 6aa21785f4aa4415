// Diffing two independently extracted event collections.
//
// Equality is structural over `comparison_key` only. Timestamps and raw
// line text are not part of the key, so repeated identical errors at
// different times collapse into one key and a second occurrence on one
// side is never reported as new.

use crate::model::{InstanceEvent, KillSession, OraError, Warning};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub trait Comparable {
    /// Key used for the set difference.
    fn comparison_key(&self) -> String;
    /// Key used for the count table.
    fn group_key(&self) -> String;
}

impl Comparable for OraError {
    fn comparison_key(&self) -> String {
        if self.message.is_empty() {
            self.code.clone()
        } else {
            format!("{}|{}", self.code, self.message)
        }
    }

    fn group_key(&self) -> String {
        self.code.clone()
    }
}

impl Comparable for Warning {
    fn comparison_key(&self) -> String {
        self.message.clone()
    }

    fn group_key(&self) -> String {
        self.message.clone()
    }
}

impl Comparable for KillSession {
    fn comparison_key(&self) -> String {
        format!("{},{}|{}", self.sid, self.serial, self.reason)
    }

    fn group_key(&self) -> String {
        self.reason.clone()
    }
}

impl Comparable for InstanceEvent {
    fn comparison_key(&self) -> String {
        format!("{}|{}", self.kind, self.line_text)
    }

    fn group_key(&self) -> String {
        self.kind.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub key: String,
    pub count_a: usize,
    pub count_b: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison<T> {
    pub counts: Vec<CountRow>,
    /// Events of B whose key never occurs in A, in B's order.
    pub new_in_b: Vec<T>,
    /// Events of A whose key never occurs in B, in A's order.
    pub new_in_a: Vec<T>,
}

impl<T> Comparison<T> {
    pub fn is_identical(&self) -> bool {
        self.new_in_a.is_empty()
            && self.new_in_b.is_empty()
            && self.counts.iter().all(|row| row.count_a == row.count_b)
    }
}

pub fn compare<T: Comparable + Clone>(a: &[T], b: &[T]) -> Comparison<T> {
    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for item in a {
        counts.entry(item.group_key()).or_default().0 += 1;
    }
    for item in b {
        counts.entry(item.group_key()).or_default().1 += 1;
    }

    let keys_a: HashSet<String> = a.iter().map(T::comparison_key).collect();
    let keys_b: HashSet<String> = b.iter().map(T::comparison_key).collect();

    Comparison {
        counts: counts
            .into_iter()
            .map(|(key, (count_a, count_b))| CountRow { key, count_a, count_b })
            .collect(),
        new_in_b: b
            .iter()
            .filter(|item| !keys_a.contains(&item.comparison_key()))
            .cloned()
            .collect(),
        new_in_a: a
            .iter()
            .filter(|item| !keys_b.contains(&item.comparison_key()))
            .cloned()
            .collect(),
    }
}
