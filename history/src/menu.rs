//! Restore menu affordances and the host menu boundary.
//!
//! Item ids are derived from what they point at, so a click can be mapped
//! back to its entry or group without extra bookkeeping:
//! `editfld<entry id>`, `editfldbyHost`, `editfldbyRecency`, `editfldMore`,
//! `editfldMoreSeparator`.

use std::fmt;

use crate::error::HistoryError;
use crate::error::Result;
use crate::types::EntryId;
use crate::types::SourceKind;

pub const ID_PREFIX: &str = "editfld";
/// Parent of every restore item; created once by the host at startup.
pub const RESTORE_PARENT_ID: &str = "restoreEditorField";
const MORE_SUFFIX: &str = "More";
const MORE_SEPARATOR_SUFFIX: &str = "MoreSeparator";
pub const MORE_TITLE: &str = "More...";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AffordanceId(String);

impl AffordanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AffordanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a restore menu item stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AffordanceTarget {
    Entry(EntryId),
    Group(SourceKind),
    MoreSeparator,
    More,
}

impl AffordanceTarget {
    pub fn affordance_id(&self) -> AffordanceId {
        let suffix = match self {
            AffordanceTarget::Entry(id) => id.to_string(),
            AffordanceTarget::Group(kind) => kind.tag().to_string(),
            AffordanceTarget::MoreSeparator => MORE_SEPARATOR_SUFFIX.to_string(),
            AffordanceTarget::More => MORE_SUFFIX.to_string(),
        };
        AffordanceId(format!("{ID_PREFIX}{suffix}"))
    }

    /// Inverse of [`AffordanceTarget::affordance_id`]; `None` for ids that
    /// do not belong to the restore menu.
    pub fn parse(id: &str) -> Option<Self> {
        let suffix = id.strip_prefix(ID_PREFIX)?;
        match suffix {
            MORE_SUFFIX => Some(AffordanceTarget::More),
            MORE_SEPARATOR_SUFFIX => Some(AffordanceTarget::MoreSeparator),
            _ => {
                if let Some(kind) = SourceKind::from_tag(suffix) {
                    return Some(AffordanceTarget::Group(kind));
                }
                if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                suffix.parse().ok().map(AffordanceTarget::Entry)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AffordanceKind {
    Normal,
    Separator,
}

/// Creation request handed to the host menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffordanceSpec {
    pub id: AffordanceId,
    pub parent_id: Option<AffordanceId>,
    pub title: String,
    pub kind: AffordanceKind,
    pub enabled: bool,
}

impl AffordanceSpec {
    pub fn restore_item(target: AffordanceTarget, title: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: target.affordance_id(),
            parent_id: Some(AffordanceId::new(RESTORE_PARENT_ID)),
            title: title.into(),
            kind: AffordanceKind::Normal,
            enabled,
        }
    }

    pub fn restore_separator(target: AffordanceTarget) -> Self {
        Self {
            id: target.affordance_id(),
            parent_id: Some(AffordanceId::new(RESTORE_PARENT_ID)),
            title: String::new(),
            kind: AffordanceKind::Separator,
            enabled: true,
        }
    }
}

/// The browser's menu API.
pub trait HostMenu {
    /// Fails when the id already exists or the parent does not.
    fn create(&mut self, spec: &AffordanceSpec) -> Result<AffordanceId>;

    fn remove(&mut self, id: &AffordanceId) -> Result<()>;
}

/// In-process menu with the same constraints as the browser's: unique ids,
/// existing parents, and no removal of an item that still has children.
#[derive(Debug, Default)]
pub struct MemoryMenu {
    items: Vec<AffordanceSpec>,
    reject_create: Vec<AffordanceId>,
    reject_remove: Vec<AffordanceId>,
}

impl MemoryMenu {
    /// A menu holding only the restore parent item.
    pub fn with_restore_parent() -> Self {
        let mut menu = Self::default();
        menu.items.push(AffordanceSpec {
            id: AffordanceId::new(RESTORE_PARENT_ID),
            parent_id: None,
            title: "Restore editor field".to_string(),
            kind: AffordanceKind::Normal,
            enabled: true,
        });
        menu
    }

    /// Make every future `create` of `id` fail.
    pub fn reject_create_of(&mut self, id: AffordanceId) {
        self.reject_create.push(id);
    }

    /// Make every future `remove` of `id` fail.
    pub fn reject_remove_of(&mut self, id: AffordanceId) {
        self.reject_remove.push(id);
    }

    /// Undo [`MemoryMenu::reject_remove_of`].
    pub fn allow_remove_of(&mut self, id: &AffordanceId) {
        self.reject_remove.retain(|rejected| rejected != id);
    }

    pub fn items(&self) -> &[AffordanceSpec] {
        &self.items
    }

    pub fn contains(&self, id: &AffordanceId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    /// Children of `parent`, in creation order.
    pub fn children_of(&self, parent: &str) -> Vec<&AffordanceSpec> {
        self.items
            .iter()
            .filter(|item| item.parent_id.as_ref().is_some_and(|p| p.as_str() == parent))
            .collect()
    }

    fn conflict(id: &AffordanceId, reason: &str) -> HistoryError {
        HistoryError::AffordanceConflict {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl HostMenu for MemoryMenu {
    fn create(&mut self, spec: &AffordanceSpec) -> Result<AffordanceId> {
        if self.reject_create.contains(&spec.id) {
            return Err(Self::conflict(&spec.id, "rejected by host"));
        }
        if self.contains(&spec.id) {
            return Err(Self::conflict(&spec.id, "duplicate id"));
        }
        if let Some(parent) = &spec.parent_id
            && !self.contains(parent)
        {
            return Err(Self::conflict(&spec.id, "parent does not exist"));
        }
        self.items.push(spec.clone());
        Ok(spec.id.clone())
    }

    fn remove(&mut self, id: &AffordanceId) -> Result<()> {
        if self.reject_remove.contains(id) {
            return Err(Self::conflict(id, "rejected by host"));
        }
        if self.items.iter().any(|item| item.parent_id.as_ref() == Some(id)) {
            return Err(Self::conflict(id, "item still has children"));
        }
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        if self.items.len() == before {
            return Err(Self::conflict(id, "no such item"));
        }
        Ok(())
    }
}
