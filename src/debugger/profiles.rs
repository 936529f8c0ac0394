use serde_json::Value;
use std::fmt;

/// A captured CPU profile, kept in memory only.
#[derive(Debug, Clone)]
pub struct Profile {
    pub data: Value,
    pub title: Option<String>,
}

impl Profile {
    pub fn new(data: Value, title: Option<String>) -> Self {
        Self { data, title }
    }

    /// endTime - startTime, both reported in microseconds.
    pub fn duration_us(&self) -> i64 {
        let start = self.data.get("startTime").and_then(Value::as_i64).unwrap_or(0);
        let end = self.data.get("endTime").and_then(Value::as_i64).unwrap_or(start);
        end - start
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "[Profile {} {}μs]", title, self.duration_us()),
            None => write!(f, "[Profile {}μs]", self.duration_us()),
        }
    }
}

#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: Vec<Profile>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `profile` and returns its index.
    pub fn add(&mut self, profile: Profile) -> usize {
        self.profiles.push(profile);
        self.profiles.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Profile> {
        self.profiles.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
