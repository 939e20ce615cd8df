//! Driver flow against an in-memory screen

use async_trait::async_trait;
use parking_lot::Mutex;

use auxsync_drivers::{
    DriverError, DriverResult, Entity, RecordDriver, RecordScreen, SearchQuery,
};
use auxsync_engine::memory::{MemoryFieldHandle, MemoryRow, MemoryRowForm};
use auxsync_engine::{
    DesiredState, EngineError, EngineResult, FieldId, FormSurface, MemoryForm, Row, TableId,
    TableSurface,
};

#[derive(Default)]
struct Behaviour {
    exists: bool,
    logged_out: bool,
    fail_save: bool,
    /// Server drops this field's value on save
    lose_on_save: Option<&'static str>,
    /// Server drops every banking row on save
    lose_rows_on_save: bool,
    /// Record cannot be found once saved
    vanish_on_save: bool,
    /// Delete is acknowledged but the record stays
    undeletable: bool,
}

struct FakeScreen {
    form: MemoryForm,
    behaviour: Mutex<Behaviour>,
    events: Mutex<Vec<String>>,
}

impl FakeScreen {
    fn new(form: MemoryForm, behaviour: Behaviour) -> Self {
        Self {
            form,
            behaviour: Mutex::new(behaviour),
            events: Mutex::new(Vec::new()),
        }
    }

    fn log(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn count(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }
}

#[async_trait]
impl FormSurface for FakeScreen {
    type Field = MemoryFieldHandle;

    async fn resolve_field(&self, id: &FieldId) -> EngineResult<MemoryFieldHandle> {
        self.form.resolve_field(id).await
    }
}

#[async_trait]
impl TableSurface for FakeScreen {
    type Row = MemoryRow;
    type RowForm = MemoryRowForm;

    async fn enumerate_rows(&self, table: &TableId) -> EngineResult<Vec<MemoryRow>> {
        self.form.enumerate_rows(table).await
    }

    async fn delete_all_rows(&self, table: &TableId) -> EngineResult<usize> {
        self.form.delete_all_rows(table).await
    }

    async fn add_row(&self, table: &TableId) -> EngineResult<MemoryRowForm> {
        self.form.add_row(table).await
    }
}

#[async_trait]
impl RecordScreen for FakeScreen {
    async fn open_browse(&self) -> DriverResult<()> {
        self.log("open_browse");
        if self.behaviour.lock().logged_out {
            return Err(DriverError::NotLoggedIn);
        }
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> DriverResult<bool> {
        self.log(format!("search {}", query));
        Ok(self.behaviour.lock().exists)
    }

    async fn open_result(&self) -> DriverResult<()> {
        self.log("open_result");
        Ok(())
    }

    async fn new_record(&self) -> DriverResult<()> {
        self.log("new_record");
        Ok(())
    }

    async fn wait_for_form(&self) -> DriverResult<()> {
        Ok(())
    }

    async fn save(&self) -> DriverResult<()> {
        self.log("save");
        let mut behaviour = self.behaviour.lock();
        if behaviour.fail_save {
            return Err(DriverError::SaveFailed {
                entity: "Supplier".into(),
                reason: "no save confirmation".into(),
            });
        }
        behaviour.exists = !behaviour.vanish_on_save;
        if let Some(field) = behaviour.lose_on_save {
            self.form.set_value(field, "");
        }
        if behaviour.lose_rows_on_save {
            self.form.set_table("BankingPanel", &[]);
        }
        Ok(())
    }

    async fn delete(&self) -> DriverResult<()> {
        self.log("delete");
        let mut behaviour = self.behaviour.lock();
        behaviour.exists = behaviour.undeletable;
        Ok(())
    }

    async fn back_to_browse(&self) -> DriverResult<()> {
        self.log("back_to_browse");
        Ok(())
    }
}

const SUPPLIER_YAML: &str = r#"
main:
  supplier_code: 1NS000
  address:
    business_relation_name: New supplier manufacturing
    city: Sydney
  accounting_profile:
    invoice_control_gl_profile_code: 00101-FOOAUS-A
tax:
  tax_zone: 10
banking:
  - bank_acc_format_code: XX
    bank_number_formatted: "55545556"
    currency_code: AUD
  - bank_acc_format_code: XX
    bank_number_formatted: "44463377"
    currency_code: AUD
"#;

fn supplier_state() -> DesiredState {
    DesiredState::from_yaml(SUPPLIER_YAML).unwrap()
}

fn blank_supplier_form() -> MemoryForm {
    MemoryForm::new()
        .with_text_field("supplierCode", "")
        .with_text_field("businessRelationName", "")
        .with_text_field("city", "")
        .with_text_field("invoiceControlGLProfileCode", "")
        .with_select_field("taxZone", "", ["10", "20"])
        .with_table("BankingPanel", &[])
}

fn supplier_driver(form: MemoryForm, behaviour: Behaviour) -> RecordDriver<FakeScreen> {
    RecordDriver::new(Entity::Supplier.spec(), FakeScreen::new(form, behaviour))
}

fn banking_row(number: &str) -> Row {
    Row::new()
        .with("bankAccFormatCode", "XX")
        .with("bankNumberFormatted", number)
        .with("currencyCode", "AUD")
}

#[tokio::test]
async fn creates_missing_record_and_verifies_it() {
    let form = blank_supplier_form();
    let driver = supplier_driver(form.clone(), Behaviour::default());

    let outcome = driver.ensure_present(&supplier_state()).await.unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.message, "Supplier has been updated");
    assert_eq!(form.value("supplierCode").as_deref(), Some("1NS000"));
    assert_eq!(
        form.value("invoiceControlGLProfileCode").as_deref(),
        Some("00101-FOOAUS-A")
    );
    assert_eq!(form.value("taxZone").as_deref(), Some("10"));
    assert_eq!(form.table_rows("BankingPanel").len(), 2);

    assert_eq!(
        driver.screen().events(),
        vec![
            "open_browse",
            "search 1NS000",
            "new_record",
            "save",
            "back_to_browse",
            "search 1NS000",
            "open_result",
        ]
    );
}

#[tokio::test]
async fn second_run_reports_up_to_date() {
    let form = blank_supplier_form();
    let driver = supplier_driver(form.clone(), Behaviour::default());

    driver.ensure_present(&supplier_state()).await.unwrap();
    let writes = form.writes();
    let outcome = driver.ensure_present(&supplier_state()).await.unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.message, "Supplier is up to date");
    assert_eq!(form.writes(), writes);
    assert_eq!(driver.screen().count("save"), 1);
}

#[tokio::test]
async fn reordered_banking_rows_are_not_rewritten() {
    let form = MemoryForm::new()
        .with_text_field("supplierCode", "1NS000")
        .with_text_field("businessRelationName", "New supplier manufacturing")
        .with_text_field("city", "Sydney")
        .with_text_field("invoiceControlGLProfileCode", "00101-FOOAUS-A")
        .with_select_field("taxZone", "10", ["10", "20"])
        .with_table(
            "BankingPanel",
            &[banking_row("44463377"), banking_row("55545556")],
        );
    let driver = supplier_driver(
        form.clone(),
        Behaviour {
            exists: true,
            ..Behaviour::default()
        },
    );

    let outcome = driver.ensure_present(&supplier_state()).await.unwrap();

    assert!(!outcome.changed);
    assert_eq!(form.row_deletions(), 0);
    assert!(driver.screen().events().contains(&"open_result".to_string()));
    assert_eq!(driver.screen().count("save"), 0);
}

#[tokio::test]
async fn one_differing_row_rewrites_whole_table() {
    let form = blank_supplier_form();
    form.set_table(
        "BankingPanel",
        &[banking_row("55545556"), banking_row("99999999")],
    );
    let driver = supplier_driver(form.clone(), Behaviour::default());

    driver.ensure_present(&supplier_state()).await.unwrap();

    assert_eq!(form.row_deletions(), 2);
    let numbers: Vec<String> = form
        .table_rows("BankingPanel")
        .iter()
        .map(|r| r.get("bankNumberFormatted").unwrap().to_ui_string())
        .collect();
    assert_eq!(numbers, vec!["55545556", "44463377"]);
}

#[tokio::test]
async fn lost_field_fails_verification() {
    let driver = supplier_driver(
        blank_supplier_form(),
        Behaviour {
            lose_on_save: Some("city"),
            ..Behaviour::default()
        },
    );

    let err = driver.ensure_present(&supplier_state()).await.unwrap_err();
    match err {
        DriverError::Engine(EngineError::VerificationMismatch(ids)) => {
            assert_eq!(ids, vec![FieldId::new("city")]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn lost_rows_fail_table_verification() {
    let driver = supplier_driver(
        blank_supplier_form(),
        Behaviour {
            lose_rows_on_save: true,
            ..Behaviour::default()
        },
    );

    let err = driver.ensure_present(&supplier_state()).await.unwrap_err();
    assert!(matches!(
        err,
        DriverError::Engine(EngineError::TableMismatch { live: 0, desired: 2, .. })
    ));
}

#[tokio::test]
async fn failed_save_is_reported() {
    let driver = supplier_driver(
        blank_supplier_form(),
        Behaviour {
            fail_save: true,
            ..Behaviour::default()
        },
    );

    let err = driver.ensure_present(&supplier_state()).await.unwrap_err();
    assert!(matches!(err, DriverError::SaveFailed { .. }));
    assert_eq!(driver.screen().count("back_to_browse"), 0);
}

#[tokio::test]
async fn record_missing_after_save() {
    let driver = supplier_driver(
        blank_supplier_form(),
        Behaviour {
            vanish_on_save: true,
            ..Behaviour::default()
        },
    );

    let err = driver.ensure_present(&supplier_state()).await.unwrap_err();
    assert!(matches!(err, DriverError::MissingAfterSave(name) if name == "Supplier"));
}

#[tokio::test]
async fn not_logged_in_stops_before_search() {
    let driver = supplier_driver(
        blank_supplier_form(),
        Behaviour {
            logged_out: true,
            ..Behaviour::default()
        },
    );

    let err = driver.ensure_present(&supplier_state()).await.unwrap_err();
    assert!(matches!(err, DriverError::NotLoggedIn));
    assert_eq!(driver.screen().events(), vec!["open_browse"]);
}

#[tokio::test]
async fn missing_search_key_touches_nothing() {
    let driver = supplier_driver(blank_supplier_form(), Behaviour::default());
    let state = DesiredState::from_yaml("main:\n  city: Sydney\n").unwrap();

    let err = driver.ensure_present(&state).await.unwrap_err();
    assert!(matches!(err, DriverError::MissingSearchKey(key) if key == "main.supplier_code"));
    assert!(driver.screen().events().is_empty());
}

#[tokio::test]
async fn absent_when_missing_is_a_no_op() {
    let driver = supplier_driver(blank_supplier_form(), Behaviour::default());
    let state = DesiredState::from_yaml("main:\n  supplier_code: 1NS000\n").unwrap();

    let outcome = driver.ensure_absent(&state).await.unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.message, "Supplier does not exist");
    assert_eq!(driver.screen().count("delete"), 0);
}

#[tokio::test]
async fn absent_deletes_existing_record() {
    let driver = supplier_driver(
        blank_supplier_form(),
        Behaviour {
            exists: true,
            ..Behaviour::default()
        },
    );
    let state = DesiredState::from_yaml("main:\n  supplier_code: 1NS000\n").unwrap();

    let outcome = driver.ensure_absent(&state).await.unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.message, "Supplier has been deleted");
    assert_eq!(
        driver.screen().events(),
        vec![
            "open_browse",
            "search 1NS000",
            "open_result",
            "delete",
            "back_to_browse",
            "search 1NS000",
        ]
    );

    // deleting again finds nothing
    let outcome = driver.ensure_absent(&state).await.unwrap();
    assert!(!outcome.changed);
}

#[tokio::test]
async fn delete_that_does_not_stick() {
    let driver = supplier_driver(
        blank_supplier_form(),
        Behaviour {
            exists: true,
            undeletable: true,
            ..Behaviour::default()
        },
    );
    let state = DesiredState::from_yaml("main:\n  supplier_code: 1NS000\n").unwrap();

    let err = driver.ensure_absent(&state).await.unwrap_err();
    assert!(matches!(err, DriverError::StillPresentAfterDelete(_)));
}

#[tokio::test]
async fn ship_to_address_uses_advanced_search() {
    let form = MemoryForm::new().accept_unknown_fields();
    let driver = RecordDriver::new(
        Entity::ShipToAddress.spec(),
        FakeScreen::new(form, Behaviour::default()),
    );
    let state = DesiredState::from_yaml(
        r#"
main:
  customer_code: 1BER009
  customer_ship_to_name: Joe Liquor Store
address:
  city: Sydney
"#,
    )
    .unwrap();

    let outcome = driver.ensure_present(&state).await.unwrap();
    assert_eq!(outcome.message, "Customer Ship-To Address has been updated");
    assert_eq!(
        driver.screen().events()[1],
        "search Customer equals 1BER009 and Ship-To Name equals Joe Liquor Store"
    );
}

#[tokio::test]
async fn business_relation_email_casing() {
    let form = MemoryForm::new()
        .with_text_field("businessRelationCode", "")
        .with_text_field("headOfficeEMail", "");
    let driver = RecordDriver::new(
        Entity::BusinessRelation.spec(),
        FakeScreen::new(form.clone(), Behaviour::default()),
    );
    let state = DesiredState::from_yaml(
        r#"
main:
  business_relation_code: 70-522
  addresses:
    head_office:
      head_office_email: sync@qad.fakedomain
"#,
    )
    .unwrap();

    driver.ensure_present(&state).await.unwrap();
    assert_eq!(
        form.value("headOfficeEMail").as_deref(),
        Some("sync@qad.fakedomain")
    );
}
