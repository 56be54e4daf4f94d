use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Microseconds since the Unix epoch.
pub type Micros = i64;

/// Identifier of a stored field entry. Assigned monotonically by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(EntryId)
    }
}

/// Kind of form element a value was captured from.
///
/// `Input` covers single-line inputs, which may hold passwords and other
/// secrets; those entries are stored but never offered as suggestions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Input,
    Textarea,
    Html,
    Iframe,
    Div,
    Other(String),
}

impl FieldKind {
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Input => "input",
            FieldKind::Textarea => "textarea",
            FieldKind::Html => "html",
            FieldKind::Iframe => "iframe",
            FieldKind::Div => "div",
            FieldKind::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "input" => FieldKind::Input,
            "textarea" => FieldKind::Textarea,
            "html" => FieldKind::Html,
            "iframe" => FieldKind::Iframe,
            "div" => FieldKind::Div,
            other => FieldKind::Other(other.to_string()),
        }
    }

    pub fn is_sensitive(&self) -> bool {
        matches!(self, FieldKind::Input)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FieldKind::parse(&s))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub id: EntryId,
    pub host: String,
    pub name: String,
    pub kind: FieldKind,
    pub value: String,
    pub first_used: Micros,
    pub last_used: Micros,
    pub use_count: u32,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "capture".to_string()
}

impl FieldEntry {
    /// A fresh entry captured at `now`. The id is a placeholder until the
    /// store assigns one on insert.
    pub fn new(host: &str, name: &str, kind: FieldKind, value: &str, now: Micros) -> Self {
        Self {
            id: EntryId(0),
            host: host.to_string(),
            name: name.to_string(),
            kind,
            value: value.to_string(),
            first_used: now,
            last_used: now,
            use_count: 1,
            source: default_source(),
        }
    }

    /// Record a recapture of the same value.
    pub fn touch(&mut self, now: Micros) {
        self.last_used = now.max(self.first_used);
        self.use_count = self.use_count.saturating_add(1);
    }

    pub fn is_sensitive(&self) -> bool {
        self.kind.is_sensitive()
    }
}

/// Which index produced a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    ByHost,
    ByRecency,
}

impl SourceKind {
    pub fn tag(self) -> &'static str {
        match self {
            SourceKind::ByHost => "byHost",
            SourceKind::ByRecency => "byRecency",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "byHost" => Some(SourceKind::ByHost),
            "byRecency" => Some(SourceKind::ByRecency),
            _ => None,
        }
    }

    pub fn header_title(self) -> &'static str {
        match self {
            SourceKind::ByHost => "--- This site: ---",
            SourceKind::ByRecency => "--- Recently used: ---",
        }
    }
}

/// A restore suggestion derived from one entry. Not persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub source_kind: SourceKind,
    pub entry_id: EntryId,
    pub name: String,
    pub label: String,
    pub last_used: Micros,
    pub rank: usize,
}

impl Candidate {
    /// Title shown in the restore menu: `[<last used>] <label>`.
    pub fn menu_title(&self) -> String {
        format!(
            "[{}] {}",
            crate::dates::to_short_date_string(self.last_used),
            self.label
        )
    }
}
