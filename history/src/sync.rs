//! Keeps the restore submenu in step with the active context.
//!
//! Every context change issues a [`SyncTicket`] tagged with a generation
//! number. Only the ticket of the latest change may rebuild the menu; results
//! computed for earlier contexts are dropped when they arrive.

use crate::context::ContextId;
use crate::error::Result;
use crate::menu::AffordanceId;
use crate::menu::AffordanceSpec;
use crate::menu::AffordanceTarget;
use crate::menu::HostMenu;
use crate::menu::MORE_TITLE;
use crate::types::Candidate;
use crate::types::EntryId;
use crate::types::SourceKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
    Displaying,
}

/// Handle for one in-flight recomputation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncTicket {
    generation: u64,
    context: ContextId,
}

impl SyncTicket {
    pub fn context(&self) -> ContextId {
        self.context
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The menu was rebuilt; `shown` affordances were created.
    Applied { shown: usize },
    /// The ticket belonged to a superseded context; nothing changed.
    Stale,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayedAffordance {
    pub id: AffordanceId,
    pub target: AffordanceTarget,
    pub group_header: bool,
}

/// Affordances currently shown, in creation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayedSet {
    items: Vec<DisplayedAffordance>,
}

impl DisplayedSet {
    pub fn iter(&self) -> impl Iterator<Item = &DisplayedAffordance> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn entry_ids(&self) -> Vec<EntryId> {
        self.items
            .iter()
            .filter_map(|item| match item.target {
                AffordanceTarget::Entry(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct Synchronizer {
    state: SyncState,
    generation: u64,
    current: Option<ContextId>,
    displayed: DisplayedSet,
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synchronizer {
    pub fn new() -> Self {
        Self {
            state: SyncState::Idle,
            generation: 0,
            current: None,
            displayed: DisplayedSet::default(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn current_context(&self) -> Option<ContextId> {
        self.current
    }

    pub fn displayed(&self) -> &DisplayedSet {
        &self.displayed
    }

    /// A new context became active. Any ticket issued before this one is
    /// stale from now on.
    pub fn context_changed(&mut self, ctx: ContextId) -> SyncTicket {
        self.generation += 1;
        self.current = Some(ctx);
        self.state = SyncState::Syncing;
        tracing::debug!(%ctx, generation = self.generation, "context changed");
        SyncTicket {
            generation: self.generation,
            context: ctx,
        }
    }

    pub fn is_current(&self, ticket: &SyncTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Deliver the candidates computed for `ticket`. A store fault shows no
    /// suggestions instead of failing.
    pub fn complete(
        &mut self,
        ticket: SyncTicket,
        result: Result<Vec<Candidate>>,
        menu: &mut dyn HostMenu,
    ) -> SyncOutcome {
        if !self.is_current(&ticket) {
            tracing::debug!(ctx = %ticket.context, "dropping result for superseded context");
            return SyncOutcome::Stale;
        }
        let candidates = result.unwrap_or_else(|err| {
            tracing::warn!(ctx = %ticket.context, "no suggestions available: {err}");
            Vec::new()
        });
        self.tear_down(menu);
        let leftover = self.displayed.len();
        self.build_up(menu, &candidates);
        self.state = SyncState::Displaying;
        SyncOutcome::Applied {
            shown: self.displayed.len() - leftover,
        }
    }

    /// Give up on `ticket` (page never finished loading): clear the menu so
    /// nothing from the previous page lingers.
    pub fn abandon(&mut self, ticket: SyncTicket, menu: &mut dyn HostMenu) -> SyncOutcome {
        if !self.is_current(&ticket) {
            return SyncOutcome::Stale;
        }
        self.tear_down(menu);
        self.state = SyncState::Idle;
        SyncOutcome::Applied { shown: 0 }
    }

    /// Remove every displayed affordance, newest first. Items the host
    /// refused to remove are logged and stay in the displayed set, so the
    /// next teardown tries them again.
    pub fn tear_down(&mut self, menu: &mut dyn HostMenu) {
        let mut kept = Vec::new();
        while let Some(item) = self.displayed.items.pop() {
            if let Err(err) = menu.remove(&item.id) {
                tracing::warn!(id = %item.id, "failed to remove menu item: {err}");
                kept.push(item);
            }
        }
        kept.reverse();
        self.displayed.items = kept;
    }

    /// Create affordances for `candidates`: a header before the first
    /// candidate of each source kind, one item per candidate and, when
    /// anything was listed, a separator plus a "more" item. Failed creations
    /// are logged and left out of the displayed set.
    pub fn build_up(&mut self, menu: &mut dyn HostMenu, candidates: &[Candidate]) {
        let mut seen_kinds: Vec<SourceKind> = Vec::with_capacity(2);
        for candidate in candidates {
            if !seen_kinds.contains(&candidate.source_kind) {
                seen_kinds.push(candidate.source_kind);
                let target = AffordanceTarget::Group(candidate.source_kind);
                let spec =
                    AffordanceSpec::restore_item(target, candidate.source_kind.header_title(), false);
                self.create(menu, &spec, target, true);
            }
            let target = AffordanceTarget::Entry(candidate.entry_id);
            let spec = AffordanceSpec::restore_item(target, candidate.menu_title(), true);
            self.create(menu, &spec, target, false);
        }

        if !candidates.is_empty() {
            let separator = AffordanceTarget::MoreSeparator;
            self.create(menu, &AffordanceSpec::restore_separator(separator), separator, false);
            let more = AffordanceTarget::More;
            self.create(
                menu,
                &AffordanceSpec::restore_item(more, MORE_TITLE, true),
                more,
                false,
            );
        }
    }

    fn create(
        &mut self,
        menu: &mut dyn HostMenu,
        spec: &AffordanceSpec,
        target: AffordanceTarget,
        group_header: bool,
    ) {
        match menu.create(spec) {
            Ok(id) => self.displayed.items.push(DisplayedAffordance {
                id,
                target,
                group_header,
            }),
            Err(err) => tracing::warn!(id = %spec.id, "failed to create menu item: {err}"),
        }
    }
}
