//! Stand-ins for the browser side when the menu is driven from a terminal.

use fhc_history::HistoryError;
use fhc_history::context::ContextId;
use fhc_history::context::ContextInfo;
use fhc_history::context::PageStatus;
use fhc_history::context::TabApi;
use fhc_history::resolve::PageChannel;
use fhc_history::resolve::RestoreMessage;

pub(crate) const CONTEXT: ContextId = ContextId(1);

/// A single, fully loaded tab showing `url`.
pub(crate) struct UrlTab {
    info: ContextInfo,
}

impl UrlTab {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            info: ContextInfo {
                id: CONTEXT,
                url: url.to_string(),
                status: PageStatus::Complete,
            },
        }
    }
}

impl TabApi for UrlTab {
    fn active(&self) -> Option<ContextInfo> {
        Some(self.info.clone())
    }

    fn get(&self, id: ContextId) -> fhc_history::Result<ContextInfo> {
        if id == self.info.id {
            Ok(self.info.clone())
        } else {
            Err(HistoryError::InvalidInput(format!("no such tab: {id}")))
        }
    }
}

/// Prints restore messages to stdout as JSON.
pub(crate) struct StdoutChannel;

impl PageChannel for StdoutChannel {
    fn send(&self, _ctx: ContextId, msg: &RestoreMessage) {
        match serde_json::to_string(msg) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::warn!("cannot encode restore message: {err}"),
        }
    }
}
