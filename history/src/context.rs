use std::fmt;
use std::time::Duration;

use crate::error::HistoryError;
use crate::error::Result;

/// Stable identifier of a browsing context (tab).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageStatus {
    Loading,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextInfo {
    pub id: ContextId,
    pub url: String,
    pub status: PageStatus,
}

/// The browser's tab API.
pub trait TabApi: Send + Sync {
    /// The currently active context, if any.
    fn active(&self) -> Option<ContextInfo>;

    fn get(&self, id: ContextId) -> Result<ContextInfo>;
}

/// Hostname used to key entries captured on `url`. Local files map to
/// `localhost`; URLs without a host map to the empty string.
pub fn host_from_url(url: &str) -> String {
    if url.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("file:")) {
        return "localhost".to_string();
    }
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default()
}

/// Polls a context until its page has finished loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadGate {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for LoadGate {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            max_attempts: 30,
        }
    }
}

impl LoadGate {
    /// Wait for `ctx` to report `Complete`. Gives up with `StaleContext` as
    /// soon as `still_current` turns false and with `PageNotLoaded` after
    /// `max_attempts` polls.
    pub async fn wait_until_loaded<T: TabApi + ?Sized>(
        &self,
        tabs: &T,
        ctx: ContextId,
        still_current: impl Fn() -> bool,
    ) -> Result<ContextInfo> {
        let mut attempts = 0u32;
        loop {
            if !still_current() {
                return Err(HistoryError::StaleContext);
            }
            let info = tabs.get(ctx)?;
            if info.status == PageStatus::Complete {
                return Ok(info);
            }
            attempts += 1;
            if attempts >= self.max_attempts.max(1) {
                return Err(HistoryError::PageNotLoaded { attempts });
            }
            tracing::debug!(%ctx, attempts, "page still loading, retrying");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_extraction() {
        assert_eq!(host_from_url("https://Example.COM/login?x=1"), "example.com");
        assert_eq!(host_from_url("http://a.com:8080/"), "a.com");
        assert_eq!(host_from_url("file:///home/me/form.html"), "localhost");
        assert_eq!(host_from_url("FILE:///C:/form.html"), "localhost");
        assert_eq!(host_from_url("about:blank"), "");
        assert_eq!(host_from_url("not a url"), "");
    }
}
