use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// PGN headers carried for export. Not rules-relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub event: String,
    pub site: String,
    pub date: String, // "YYYY.MM.DD", "??" for unknown parts
    pub round: String,
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    /// Any other header, e.g. TimeControl or ECO.
    pub extra: BTreeMap<String, String>,
}

impl Default for GameMetadata {
    fn default() -> Self {
        Self {
            event: "Casual Game".to_string(),
            site: "?".to_string(),
            date: chrono::Local::now().format("%Y.%m.%d").to_string(),
            round: "-".to_string(),
            white: "White".to_string(),
            black: "Black".to_string(),
            result: "*".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

impl GameMetadata {
    /// Metadata with every Seven Tag Roster field unknown, as an imported
    /// game starts before its headers are applied.
    pub fn unknown() -> Self {
        Self {
            event: "?".to_string(),
            site: "?".to_string(),
            date: "????.??.??".to_string(),
            round: "?".to_string(),
            white: "?".to_string(),
            black: "?".to_string(),
            result: "*".to_string(),
            extra: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match key {
            "Event" => self.event = value,
            "Site" => self.site = value,
            "Date" => self.date = value,
            "Round" => self.round = value,
            "White" => self.white = value,
            "Black" => self.black = value,
            "Result" => self.result = value,
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "Event" => Some(&self.event),
            "Site" => Some(&self.site),
            "Date" => Some(&self.date),
            "Round" => Some(&self.round),
            "White" => Some(&self.white),
            "Black" => Some(&self.black),
            "Result" => Some(&self.result),
            _ => self.extra.get(key).map(String::as_str),
        }
    }

    /// Headers in export order: the Seven Tag Roster, then the rest by name.
    pub fn tags(&self) -> Vec<(&str, &str)> {
        let mut tags = vec![
            ("Event", self.event.as_str()),
            ("Site", self.site.as_str()),
            ("Date", self.date.as_str()),
            ("Round", self.round.as_str()),
            ("White", self.white.as_str()),
            ("Black", self.black.as_str()),
            ("Result", self.result.as_str()),
        ];
        tags.extend(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        tags
    }
}
