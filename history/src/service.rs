//! Event driver for the restore menu.
//!
//! The host forwards tab activations and menu clicks here; the service
//! ranks candidates for the active page and keeps the host menu in step.

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::config::HistoryConfig;
use crate::context::ContextId;
use crate::context::LoadGate;
use crate::context::TabApi;
use crate::context::host_from_url;
use crate::error::HistoryError;
use crate::error::Result;
use crate::menu::AffordanceTarget;
use crate::menu::HostMenu;
use crate::rank::RankLimits;
use crate::rank::rank_with_limits;
use crate::resolve::PageChannel;
use crate::resolve::RestoreMessage;
use crate::resolve::resolve;
use crate::store::EntryStore;
use crate::sync::SyncOutcome;
use crate::sync::Synchronizer;

/// What a click on a restore menu item did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickAction {
    /// The value was sent to the page.
    Restored(RestoreMessage),
    /// The host should open the history manager.
    OpenManager,
    /// Headers, separators and foreign items.
    Ignored,
}

struct MenuState<M> {
    sync: Synchronizer,
    menu: M,
}

pub struct RestoreMenuService<S, M, T, C> {
    store: S,
    tabs: T,
    channel: C,
    state: Mutex<MenuState<M>>,
    limits: RankLimits,
    gate: LoadGate,
}

impl<S, M, T, C> RestoreMenuService<S, M, T, C>
where
    S: EntryStore,
    M: HostMenu,
    T: TabApi,
    C: PageChannel,
{
    pub fn new(store: S, menu: M, tabs: T, channel: C, config: &HistoryConfig) -> Self {
        Self {
            store,
            tabs,
            channel,
            state: Mutex::new(MenuState {
                sync: Synchronizer::new(),
                menu,
            }),
            limits: config.rank_limits(),
            gate: config.load_gate(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `f` against the synchronizer and host menu.
    pub fn inspect<R>(&self, f: impl FnOnce(&Synchronizer, &M) -> R) -> R {
        let state = self.lock();
        f(&state.sync, &state.menu)
    }

    /// Rebuild the restore menu for `ctx`.
    ///
    /// A newer activation arriving while this one waits for the page or
    /// ranks candidates wins; this call then returns `Stale` and leaves the
    /// menu alone. A page that never finishes loading or a context that
    /// disappeared clears the menu.
    pub async fn on_context_activated(&self, ctx: ContextId) -> SyncOutcome {
        let ticket = self.lock().sync.context_changed(ctx);

        let waited = self
            .gate
            .wait_until_loaded(&self.tabs, ctx, || self.lock().sync.is_current(&ticket))
            .await;
        let info = match waited {
            Ok(info) => info,
            Err(HistoryError::StaleContext) => return SyncOutcome::Stale,
            Err(err) => {
                tracing::warn!(%ctx, "not showing suggestions: {err}");
                let mut guard = self.lock();
                let state = &mut *guard;
                return state.sync.abandon(ticket, &mut state.menu);
            }
        };

        let host = host_from_url(&info.url);
        let result = rank_with_limits(&self.store, &host, self.limits);

        let mut guard = self.lock();
        let state = &mut *guard;
        state.sync.complete(ticket, result, &mut state.menu)
    }

    /// Build the menu for whatever context is active at startup.
    pub async fn on_startup(&self) -> Option<SyncOutcome> {
        let active = self.tabs.active()?;
        Some(self.on_context_activated(active.id).await)
    }

    /// Route a click on menu item `affordance_id` made in `ctx`.
    pub fn on_click(&self, affordance_id: &str, ctx: ContextId) -> Result<ClickAction> {
        match AffordanceTarget::parse(affordance_id) {
            Some(AffordanceTarget::Entry(id)) => {
                resolve(&self.store, id, ctx, &self.channel).map(ClickAction::Restored)
            }
            Some(AffordanceTarget::More) => Ok(ClickAction::OpenManager),
            Some(AffordanceTarget::Group(_) | AffordanceTarget::MoreSeparator) | None => {
                Ok(ClickAction::Ignored)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, MenuState<M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
