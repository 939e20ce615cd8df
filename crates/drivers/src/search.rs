//! Browse view search
//!
//! Records are located in the browse grid either through the quick search
//! box or through the advanced search panel. Both end with the first row of
//! the result grid, which is visible only when something matched.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use auxsync_browser::{BrowserResult, Locator, Page};

use crate::config::TimeoutConfig;
use crate::widgets::{click_first_visible, wait_for_spinner, LIST_ITEM, RESULT_ROWS};

/// One advanced search condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub field: String,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchQuery {
    Quick(String),
    Advanced(Vec<Filter>),
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchQuery::Quick(code) => write!(f, "{}", code),
            SearchQuery::Advanced(filters) => {
                let parts: Vec<String> = filters
                    .iter()
                    .map(|c| format!("{} {} {}", c.field, c.operator, c.value))
                    .collect();
                write!(f, "{}", parts.join(" and "))
            }
        }
    }
}

/// First row of the browse results
pub(crate) fn result_row() -> Locator {
    Locator::css(RESULT_ROWS).first()
}

/// Run `query` against the browse grid and return the first result row
pub(crate) async fn run(page: &Page, query: &SearchQuery, timeouts: &TimeoutConfig) -> BrowserResult<Locator> {
    debug!("Searching browse for {}", query);
    match query {
        SearchQuery::Quick(code) => quick_search(page, code, timeouts).await,
        SearchQuery::Advanced(filters) => advanced_search(page, filters, timeouts).await,
    }
}

async fn quick_search(page: &Page, code: &str, timeouts: &TimeoutConfig) -> BrowserResult<Locator> {
    let search_bar = Locator::id("tbQuickSearch_BrowseDataGrid");

    // Default view chips narrow the search; remove them all
    let chips = search_bar.clone().parent().get_by_title("delete");
    let chip_count = page.count(&chips).await?;
    for _ in 0..chip_count {
        let chip = chips.clone().first();
        if page.count(&chip).await? == 0 || !page.is_visible(&chip).await? {
            break;
        }
        page.click(&chip).await?;
    }

    if page.is_visible(&search_bar).await? {
        page.fill_within(&search_bar, code, timeouts.search_fill()).await?;
    }

    page.click(&Locator::id("btnBrowseSearch")).await?;
    wait_for_spinner(page).await?;
    Ok(result_row())
}

async fn advanced_search(page: &Page, filters: &[Filter], timeouts: &TimeoutConfig) -> BrowserResult<Locator> {
    page.click(&Locator::id("btnSearchAdvance")).await?;
    page.click(&Locator::id("btnSearchClearAll")).await?;

    // The last condition row cannot be removed; its button goes disabled
    let remove = Locator::id("btnRemoveSearchCond").first();
    while page.count(&remove).await? > 0 && page.is_enabled(&remove).await? {
        page.click(&remove).await?;
    }

    let filter_table = Locator::css("#browseAdvanceSearchPopup > .qAdvanceSearchContainer > table").first();
    let option_wait = Some(timeouts.option_list());

    for (index, filter) in filters.iter().enumerate() {
        let row = empty_filter_row(page, &filter_table).await?;
        let cells = row.clone().locator("td");
        let field_cell = cells.clone().nth(0);
        let operator_cell = cells.clone().nth(1);
        let value_cell = cells.nth(2);

        page.click(&field_cell.get_by_role("button")).await?;
        click_first_visible(page, &list_item(&filter.field)).await?;

        page.click(&operator_cell.get_by_role("button")).await?;
        page.click_with(&list_item(&filter.operator).last(), 1, option_wait)
            .await?;

        let textbox = value_cell.clone().get_by_role("textbox");
        if page.count(&textbox).await? == 1 {
            page.fill(&textbox, &filter.value).await?;
        } else {
            page.click(&value_cell.get_by_role("button").first()).await?;
            page.click_with(&list_item(&filter.value).first(), 1, option_wait)
                .await?;
        }

        if index + 1 < filters.len() {
            page.click_with(&row.locator("#btnAddSearchCond"), 1, option_wait)
                .await?;
        }
    }

    page.click(&Locator::id("btnSaveSearchCond")).await?;
    wait_for_spinner(page).await?;
    Ok(result_row())
}

/// Dropdown entry whose text is exactly `text`
fn list_item(text: &str) -> Locator {
    Locator::css(LIST_ITEM).filter_text(text, true)
}

/// The condition row whose value is still blank. New rows are not always
/// appended at the bottom, so every row is inspected; the last row is used
/// when none is blank.
async fn empty_filter_row(page: &Page, filter_table: &Locator) -> BrowserResult<Locator> {
    let rows = filter_table.clone().locator("tbody > tr");
    let count = page.count(&rows).await?;

    for i in 0..count {
        let row = rows.clone().nth(i);
        let value_cell = row.clone().locator("td").nth(2);
        let textbox = value_cell.clone().get_by_role("textbox");
        let prefill = if page.count(&textbox).await? == 1 {
            page.input_value(&textbox).await?
        } else {
            page.input_value(&value_cell.get_by_role("option").first()).await?
        };
        if prefill.is_empty() {
            return Ok(row);
        }
    }
    Ok(rows.last())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auxsync_browser::LocatorStep;

    #[test]
    fn test_query_display() {
        assert_eq!(SearchQuery::Quick("1NS000".into()).to_string(), "1NS000");
        let query = SearchQuery::Advanced(vec![
            Filter {
                field: "Customer".into(),
                operator: "equals".into(),
                value: "1BER009".into(),
            },
            Filter {
                field: "Ship-To Name".into(),
                operator: "equals".into(),
                value: "Joe".into(),
            },
        ]);
        assert_eq!(
            query.to_string(),
            "Customer equals 1BER009 and Ship-To Name equals Joe"
        );
    }

    #[test]
    fn test_result_row_targets_first_grid_row() {
        let row = result_row();
        let steps = row.steps();
        assert_eq!(steps.len(), 2);
        assert!(matches!(
            &steps[0],
            LocatorStep::Css { selector } if selector.contains("kGrid_BrowseDataGrid_active_cell")
        ));
        assert_eq!(steps[1], LocatorStep::First);
    }

    #[test]
    fn test_list_item_matches_exact_text() {
        let item = list_item("equals");
        assert_eq!(
            item.steps()[1],
            LocatorStep::FilterText {
                text: "equals".into(),
                exact: true
            }
        );
    }
}
