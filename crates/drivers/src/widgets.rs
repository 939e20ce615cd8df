//! Shared QAD web UI widgets
//!
//! Selectors and small interaction helpers reused by the search, screen and
//! session code. The UI is built on Kendo, so most widgets are found through
//! their Kendo class names.

use std::time::Duration;
use tracing::debug;

use auxsync_browser::{BrowserError, BrowserResult, Locator, Page, WaitState};

/// Loading overlay shown while a grid or form is busy
pub(crate) const SPINNER: &str = ".k-loading-color";

/// First column of the browse grid results
pub(crate) const RESULT_ROWS: &str =
    "#qGridContent > table[aria-activedescendant=kGrid_BrowseDataGrid_active_cell] > tbody > tr";

/// Entries of an open dropdown list
pub(crate) const LIST_ITEM: &str = "li > span.k-list-item-text";

pub(crate) const TOAST: &str = ".toast-message";
pub(crate) const CONFIRM_DIALOG: &str = "#qModalDialogConfirm";

/// How long a toast may take to settle on its final text
const TOAST_TEXT_WAIT: Duration = Duration::from_secs(5);
const TOAST_POLL: Duration = Duration::from_millis(250);

pub(crate) async fn wait_for_spinner(page: &Page) -> BrowserResult<()> {
    page.wait_for(
        &Locator::css(SPINNER).first(),
        WaitState::Detached,
        None,
    )
    .await
}

/// Click the first visible element matched by `locator`. Returns `false`
/// when none is visible.
pub(crate) async fn click_first_visible(page: &Page, locator: &Locator) -> BrowserResult<bool> {
    let count = page.count(locator).await?;
    for i in 0..count {
        let candidate = locator.clone().nth(i);
        if page.is_visible(&candidate).await? {
            page.click(&candidate).await?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Accept the modal confirmation dialog
pub(crate) async fn confirm_dialog(page: &Page) -> BrowserResult<()> {
    let dialog = Locator::css(CONFIRM_DIALOG);
    page.wait_for(&dialog, WaitState::Visible, None).await?;
    page.click(&dialog).await
}

/// Wait for the first toast and check that its text contains `word`,
/// ignoring case. A toast that never appears counts as a mismatch.
pub(crate) async fn toast_contains(page: &Page, word: &str, timeout: Duration) -> BrowserResult<bool> {
    let toast = Locator::css(TOAST).first();
    match page.wait_for(&toast, WaitState::Visible, Some(timeout)).await {
        Ok(()) => {}
        Err(BrowserError::Timeout(_)) => return Ok(false),
        Err(e) => return Err(e),
    }

    let word = word.to_lowercase();
    let deadline = tokio::time::Instant::now() + TOAST_TEXT_WAIT;
    loop {
        let text = page.text_content(&toast).await?.unwrap_or_default();
        if text.to_lowercase().contains(&word) {
            return Ok(true);
        }
        if tokio::time::Instant::now() >= deadline {
            debug!("Toast text `{}` does not contain `{}`", text.trim(), word);
            return Ok(false);
        }
        tokio::time::sleep(TOAST_POLL).await;
    }
}
