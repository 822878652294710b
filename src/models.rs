//! Core data models used throughout the catalog engine.
//!
//! An [`Entry`] is one resource record as it appears in `resources.txt`.
//! Field values are kept as the raw strings read from disk so that a
//! hand-edited value (including an unknown `type`) survives a
//! parse → validate → serialize cycle untouched; typed views such as
//! [`ResourceType`] are derived on demand.

use std::fmt;
use std::str::FromStr;

/// Serialized field order. Identical for every entry.
pub const FIELD_ORDER: [&str; 7] = [
    "title",
    "type",
    "link",
    "language",
    "category",
    "description",
    "date",
];

/// The closed set of resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Book,
    Blog,
    Website,
    Package,
    Course,
    Video,
    Paper,
    Journal,
    Community,
    Repository,
    Forum,
    Conference,
    Tool,
    Podcast,
    Newsletter,
    Cheatsheet,
}

impl ResourceType {
    pub const ALL: [ResourceType; 16] = [
        ResourceType::Book,
        ResourceType::Blog,
        ResourceType::Website,
        ResourceType::Package,
        ResourceType::Course,
        ResourceType::Video,
        ResourceType::Paper,
        ResourceType::Journal,
        ResourceType::Community,
        ResourceType::Repository,
        ResourceType::Forum,
        ResourceType::Conference,
        ResourceType::Tool,
        ResourceType::Podcast,
        ResourceType::Newsletter,
        ResourceType::Cheatsheet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Book => "Book",
            ResourceType::Blog => "Blog",
            ResourceType::Website => "Website",
            ResourceType::Package => "Package",
            ResourceType::Course => "Course",
            ResourceType::Video => "Video",
            ResourceType::Paper => "Paper",
            ResourceType::Journal => "Journal",
            ResourceType::Community => "Community",
            ResourceType::Repository => "Repository",
            ResourceType::Forum => "Forum",
            ResourceType::Conference => "Conference",
            ResourceType::Tool => "Tool",
            ResourceType::Podcast => "Podcast",
            ResourceType::Newsletter => "Newsletter",
            ResourceType::Cheatsheet => "Cheatsheet",
        }
    }

    /// All type names, sorted alphabetically. Used in validation messages.
    pub fn sorted_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Self::ALL.iter().map(|t| t.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the known resource types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource type '{0}'")]
pub struct UnknownType(pub String);

impl FromStr for ResourceType {
    type Err = UnknownType;

    /// Exact, case-sensitive match. `"blog"` is not a known type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownType(s.to_string()))
    }
}

/// One catalog record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub resource_type: String,
    pub link: String,
    pub language: String,
    pub category: String,
    pub description: String,
    pub date: String,
    /// Unrecognised `key: "value"` lines, in order of appearance.
    pub extra: Vec<(String, String)>,
}

impl Entry {
    /// Builds an entry from typed classification output.
    pub fn new(
        title: impl Into<String>,
        resource_type: ResourceType,
        link: impl Into<String>,
        language: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            resource_type: resource_type.as_str().to_string(),
            link: link.into(),
            language: language.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    /// Typed view of the `type` field.
    pub fn resource_type(&self) -> Result<ResourceType, UnknownType> {
        self.resource_type.parse()
    }

    /// Category tags in order, trimmed, empty tags removed.
    pub fn categories(&self) -> Vec<&str> {
        self.category
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Value of a field by its serialized key.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "title" => Some(&self.title),
            "type" => Some(&self.resource_type),
            "link" => Some(&self.link),
            "language" => Some(&self.language),
            "category" => Some(&self.category),
            "description" => Some(&self.description),
            "date" => Some(&self.date),
            other => self
                .extra
                .iter()
                .find(|(k, _)| k == other)
                .map(|(_, v)| v.as_str()),
        }
    }

    /// Sets a field by its serialized key. Unknown keys go to `extra`,
    /// replacing an earlier value for the same key.
    pub fn set(&mut self, key: &str, value: String) {
        match key {
            "title" => self.title = value,
            "type" => self.resource_type = value,
            "link" => self.link = value,
            "language" => self.language = value,
            "category" => self.category = value,
            "description" => self.description = value,
            "date" => self.date = value,
            other => {
                if let Some(slot) = self.extra.iter_mut().find(|(k, _)| k == other) {
                    slot.1 = value;
                } else {
                    self.extra.push((other.to_string(), value));
                }
            }
        }
    }
}

/// The (type, language, category) triple produced by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub resource_type: ResourceType,
    pub language: &'static str,
    pub category: &'static str,
}

/// Metadata extracted from a fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub date: Option<String>,
}
