use serde::Deserialize;
use serde::Serialize;

use crate::context::ContextId;
use crate::error::Result;
use crate::store::EntryStore;
use crate::types::EntryId;

pub const RESTORE_ACTION: &str = "formfieldValueResponseSingle";

/// Message asking the page to put `value` back into the field it came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreMessage {
    pub action: String,
    pub id: String,
    pub name: String,
    pub node_name: String,
    pub value: String,
}

/// Delivery channel into a page's content script.
pub trait PageChannel: Send + Sync {
    /// Fire-and-forget; the page may ignore the message.
    fn send(&self, ctx: ContextId, msg: &RestoreMessage);
}

/// Look `entry_id` up and hand its value to the page in `ctx`.
///
/// Returns `NotFound` if the entry was deleted after the menu was built; the
/// menu is left as is and nothing is sent. Usage counters are not touched.
pub fn resolve(
    store: &dyn EntryStore,
    entry_id: EntryId,
    ctx: ContextId,
    channel: &dyn PageChannel,
) -> Result<RestoreMessage> {
    let entry = store.get(entry_id)?;
    let msg = RestoreMessage {
        action: RESTORE_ACTION.to_string(),
        id: String::new(),
        name: entry.name,
        node_name: entry.kind.as_str().to_string(),
        value: entry.value,
    };
    tracing::debug!(%ctx, id = %entry_id, "restoring field value");
    channel.send(ctx, &msg);
    Ok(msg)
}
