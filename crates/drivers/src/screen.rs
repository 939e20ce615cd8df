//! Maintenance screens
//!
//! [`RecordScreen`] is everything the driver flow needs from a browse view
//! and its maintenance form. [`QadScreen`] implements it, together with the
//! engine surfaces, against the QAD web UI through a Playwright page.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use auxsync_browser::{BrowserError, BrowserResult, Locator, Page, WaitState};
use auxsync_engine::{
    EngineError, EngineResult, FieldHandle, FieldId, FormSurface, RowHandle, TableId, TableSurface,
};

use crate::config::{AuxConfig, ServerConfig, TimeoutConfig};
use crate::entity::EntitySpec;
use crate::error::{DriverError, DriverResult};
use crate::search::{self, SearchQuery};
use crate::session::require_state_file;
use crate::widgets::{click_first_visible, confirm_dialog, toast_contains, wait_for_spinner, LIST_ITEM};

/// Browse view plus maintenance form of one entity
#[async_trait]
pub trait RecordScreen: FormSurface + TableSurface {
    /// Navigate to the browse view. Fails with `NotLoggedIn` when the
    /// server redirects to its login page.
    async fn open_browse(&self) -> DriverResult<()>;

    /// Search the browse view. Returns whether a record matched.
    async fn search(&self, query: &SearchQuery) -> DriverResult<bool>;

    /// Open the first search result in the maintenance form
    async fn open_result(&self) -> DriverResult<()>;

    /// Open an empty maintenance form
    async fn new_record(&self) -> DriverResult<()>;

    async fn wait_for_form(&self) -> DriverResult<()>;

    /// Save and wait for the confirmation toast
    async fn save(&self) -> DriverResult<()>;

    /// Delete the open record, confirm, and wait for the confirmation toast
    async fn delete(&self) -> DriverResult<()>;

    async fn back_to_browse(&self) -> DriverResult<()>;
}

pub(crate) trait IntoEngine<T> {
    fn engine(self) -> EngineResult<T>;
}

impl<T> IntoEngine<T> for BrowserResult<T> {
    fn engine(self) -> EngineResult<T> {
        self.map_err(|e| match e {
            BrowserError::Timeout(what) => EngineError::Timeout(what),
            other => EngineError::Surface(other.to_string()),
        })
    }
}

/// An entity's screens in the QAD web UI
pub struct QadScreen {
    page: Page,
    spec: &'static EntitySpec,
    server: ServerConfig,
    timeouts: TimeoutConfig,
}

impl QadScreen {
    pub fn new(page: Page, spec: &'static EntitySpec, config: &AuxConfig) -> Self {
        Self {
            page,
            spec,
            server: config.server.clone(),
            timeouts: config.timeouts.clone(),
        }
    }

    /// Launch a browser with the saved session. The session state file
    /// must exist.
    pub async fn connect(config: &AuxConfig, spec: &'static EntitySpec) -> DriverResult<Self> {
        let state_file = &config.session.state_file;
        require_state_file(state_file)?;
        let page = Page::launch(&config.browser_config(Some(state_file.clone()))).await?;
        Ok(Self::new(page, spec, config))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub async fn close(&self) -> DriverResult<()> {
        self.page.close().await?;
        Ok(())
    }

    /// Cell holding the panel's Kendo grid
    fn grid(table: &TableId) -> Locator {
        Locator::css(format!(
            "#{} > .panel-body > table > tbody > tr > td",
            table
        ))
        .first()
    }

    fn rows(table: &TableId) -> Locator {
        Self::grid(table)
            .locator(".k-grid > .k-grid-content > table")
            .locator("tbody tr")
    }

    async fn require_panel(&self, table: &TableId) -> EngineResult<Locator> {
        let panel = Locator::id(table.as_str());
        if !self.page.is_visible(&panel).await.engine()? {
            return Err(EngineError::TableNotFound(table.clone()));
        }
        Ok(panel)
    }
}

#[async_trait]
impl RecordScreen for QadScreen {
    async fn open_browse(&self) -> DriverResult<()> {
        let url = self.server.browse_url(self.spec.view_uri);
        debug!("Opening {} browse: {}", self.spec.name, url);
        self.page.goto(&url).await?;

        let redirected = self
            .page
            .wait_for_url(&self.server.login_pattern(), self.timeouts.login_redirect_probe())
            .await?;
        if redirected {
            return Err(DriverError::NotLoggedIn);
        }
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> DriverResult<bool> {
        let result = search::run(&self.page, query, &self.timeouts).await?;
        let found = self.page.is_visible(&result).await?;
        debug!("Search for {} matched: {}", query, found);
        Ok(found)
    }

    async fn open_result(&self) -> DriverResult<()> {
        self.page.double_click(&search::result_row()).await?;
        Ok(())
    }

    async fn new_record(&self) -> DriverResult<()> {
        info!("Creating new {}", self.spec.name);
        self.page.click(&Locator::id("ToolBtnNew")).await?;
        Ok(())
    }

    async fn wait_for_form(&self) -> DriverResult<()> {
        wait_for_spinner(&self.page).await?;
        Ok(())
    }

    async fn save(&self) -> DriverResult<()> {
        info!("Saving {}", self.spec.name);
        self.page.click(&Locator::id("ToolBtnSave")).await?;
        if !toast_contains(&self.page, "saved", self.timeouts.save_toast()).await? {
            return Err(DriverError::SaveFailed {
                entity: self.spec.name.to_string(),
                reason: "no save confirmation".into(),
            });
        }
        Ok(())
    }

    async fn delete(&self) -> DriverResult<()> {
        info!("Deleting {}", self.spec.name);
        self.page.click(&Locator::css("#ToolBtnDelete")).await?;
        confirm_dialog(&self.page).await?;
        if !toast_contains(&self.page, "deleted", self.timeouts.delete_toast()).await? {
            return Err(DriverError::DeleteFailed {
                entity: self.spec.name.to_string(),
                reason: "no delete confirmation".into(),
            });
        }
        Ok(())
    }

    async fn back_to_browse(&self) -> DriverResult<()> {
        self.page.click(&Locator::css("#btnViewFormPane")).await?;
        Ok(())
    }
}

/// A named input on the maintenance form
pub struct QadField {
    page: Page,
    id: FieldId,
    locator: Locator,
    option_wait: Duration,
}

impl QadField {
    async fn resolve(page: &Page, scope: Locator, id: &FieldId, option_wait: Duration) -> EngineResult<Self> {
        let locator = scope.with_name(id.as_str());
        if page.count(&locator).await.engine()? == 0 {
            return Err(EngineError::FieldResolution(id.clone()));
        }
        Ok(Self {
            page: page.clone(),
            id: id.clone(),
            locator: locator.first(),
            option_wait,
        })
    }
}

#[async_trait]
impl FieldHandle for QadField {
    async fn read_value(&self) -> EngineResult<String> {
        self.page.input_value(&self.locator).await.engine()
    }

    async fn write_value(&self, value: &str) -> EngineResult<()> {
        self.page.clear(&self.locator).await.engine()?;
        self.page.fill(&self.locator, value).await.engine()
    }

    async fn is_visible(&self) -> EngineResult<bool> {
        self.page.is_visible(&self.locator).await.engine()
    }

    async fn select_option(&self, text: &str) -> EngineResult<()> {
        // Dropdowns keep their value in a hidden input; the visible widget is
        // the input's parent
        let widget = self.locator.clone().parent();
        self.page.click(&widget).await.engine()?;

        let options = widget
            .get_by_role("listbox")
            .locator(LIST_ITEM)
            .filter_text(text, true);
        let not_found = || EngineError::OptionNotFound {
            field: self.id.clone(),
            option: text.to_string(),
        };

        match self
            .page
            .wait_for(&options.clone().first(), WaitState::Attached, Some(self.option_wait))
            .await
        {
            Ok(()) => {}
            Err(BrowserError::Timeout(_)) => return Err(not_found()),
            Err(e) => return Err(EngineError::Surface(e.to_string())),
        }

        if !click_first_visible(&self.page, &options).await.engine()? {
            return Err(not_found());
        }
        Ok(())
    }
}

#[async_trait]
impl FormSurface for QadScreen {
    type Field = QadField;

    async fn resolve_field(&self, id: &FieldId) -> EngineResult<QadField> {
        QadField::resolve(&self.page, Locator::default(), id, self.timeouts.option_list()).await
    }
}

/// A rendered grid row
pub struct QadRow {
    page: Page,
    locator: Locator,
}

#[async_trait]
impl RowHandle for QadRow {
    async fn read_cell(&self, field: &FieldId) -> EngineResult<String> {
        let cell = self
            .locator
            .clone()
            .locator(format!(".qFieldName-{}", field));
        if self.page.count(&cell).await.engine()? == 0 {
            return Ok(String::new());
        }
        let text = self.page.text_content(&cell.first()).await.engine()?;
        Ok(text.unwrap_or_default().trim().to_string())
    }
}

/// Fields of a newly added row, scoped to its panel
pub struct QadRowForm {
    page: Page,
    panel: Locator,
    option_wait: Duration,
}

#[async_trait]
impl FormSurface for QadRowForm {
    type Field = QadField;

    async fn resolve_field(&self, id: &FieldId) -> EngineResult<QadField> {
        QadField::resolve(&self.page, self.panel.clone(), id, self.option_wait).await
    }
}

#[async_trait]
impl TableSurface for QadScreen {
    type Row = QadRow;
    type RowForm = QadRowForm;

    async fn enumerate_rows(&self, table: &TableId) -> EngineResult<Vec<QadRow>> {
        self.require_panel(table).await?;
        let rows = Self::rows(table);
        let count = self.page.count(&rows).await.engine()?;
        debug!("Table {} has {} rows", table, count);
        Ok((0..count)
            .map(|i| QadRow {
                page: self.page.clone(),
                locator: rows.clone().nth(i),
            })
            .collect())
    }

    async fn delete_all_rows(&self, table: &TableId) -> EngineResult<usize> {
        let panel = self.require_panel(table).await?;
        let rows = Self::rows(table);
        let delete_button = panel.get_by_role("button").filter_text("Delete", false);

        let initial = self.page.count(&rows).await.engine()?;
        let mut removed = 0;
        for _ in 0..initial {
            let row = rows.clone().first();
            if self.page.count(&row).await.engine()? == 0 {
                break;
            }
            self.page
                .click(&row.locator("td").nth(1))
                .await
                .engine()?;
            self.page.click(&delete_button).await.engine()?;
            confirm_dialog(&self.page).await.engine()?;
            removed += 1;
        }

        let remaining = self.page.count(&rows).await.engine()?;
        if remaining > 0 {
            return Err(EngineError::Surface(format!(
                "{} rows remain in `{}` after deleting {}",
                remaining, table, removed
            )));
        }
        Ok(removed)
    }

    async fn add_row(&self, table: &TableId) -> EngineResult<QadRowForm> {
        let panel = self.require_panel(table).await?;
        let new_button = Self::grid(table)
            .locator(".k-grid > .k-grid-toolbar > #qGridToolbar")
            .get_by_text("New", false)
            .first();
        self.page.click(&new_button).await.engine()?;

        // Row inputs ignore typing until the grid finishes its edit setup
        tokio::time::sleep(self.timeouts.row_ready_delay()).await;

        Ok(QadRowForm {
            page: self.page.clone(),
            panel,
            option_wait: self.timeouts.option_list(),
        })
    }
}
