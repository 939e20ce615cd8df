//! Entity descriptions
//!
//! Every maintained record type is described by a static [`EntitySpec`]. The
//! driver flow is identical across entities; only the browse view, how a
//! record is found, the casing overrides and the table panels differ.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use auxsync_engine::{normalize, DesiredState, NormalizedState, Overrides, TableId};

use crate::error::{DriverError, DriverResult};
use crate::search::{Filter, SearchQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Entity {
    BusinessRelation,
    Customer,
    ShipToAddress,
    Supplier,
    Salesperson,
}

impl Entity {
    pub const ALL: [Entity; 5] = [
        Entity::BusinessRelation,
        Entity::Customer,
        Entity::ShipToAddress,
        Entity::Supplier,
        Entity::Salesperson,
    ];

    pub fn spec(self) -> &'static EntitySpec {
        match self {
            Entity::BusinessRelation => &BUSINESS_RELATION,
            Entity::Customer => &CUSTOMER,
            Entity::ShipToAddress => &SHIP_TO_ADDRESS,
            Entity::Supplier => &SUPPLIER,
            Entity::Salesperson => &SALESPERSON,
        }
    }

    /// Command-line name
    pub fn slug(self) -> &'static str {
        match self {
            Entity::BusinessRelation => "business-relation",
            Entity::Customer => "customer",
            Entity::ShipToAddress => "ship-to-address",
            Entity::Supplier => "supplier",
            Entity::Salesperson => "salesperson",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Entity {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Entity::ALL
            .into_iter()
            .find(|e| e.slug() == s)
            .ok_or_else(|| DriverError::Config(format!("unknown entity `{}`", s)))
    }
}

/// How a record is located in its browse view
#[derive(Debug, Clone, Copy)]
pub enum SearchSpec {
    /// Quick search box, using the value at an input path
    Quick { key: &'static str },
    /// Advanced search with one filter row per entry
    Advanced { filters: &'static [FilterSpec] },
}

#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    /// Field label in the filter dropdown
    pub field: &'static str,
    pub operator: &'static str,
    /// Input path supplying the filter value
    pub key: &'static str,
}

/// A repeating table and the panel rendering it
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Top-level input key holding the rows
    pub key: &'static str,
    /// DOM id of the panel
    pub panel: &'static str,
    pub columns: &'static [&'static str],
}

#[derive(Debug)]
pub struct EntitySpec {
    /// Display name used in messages
    pub name: &'static str,
    pub view_uri: &'static str,
    pub search: SearchSpec,
    /// Words whose casing the UI spells out verbatim
    pub overrides: &'static [&'static str],
    pub tables: &'static [TableSpec],
    /// Known scalar input paths
    pub fields: &'static [&'static str],
}

/// A validated record input, ready to drive the UI
#[derive(Debug, Clone)]
pub struct PreparedRecord {
    pub normalized: NormalizedState,
    pub query: SearchQuery,
    /// Normalized table key and the panel it is reconciled into
    pub tables: Vec<(auxsync_engine::FieldId, TableId)>,
}

impl EntitySpec {
    pub fn overrides(&self) -> Overrides {
        Overrides::new(self.overrides.iter().copied())
    }

    pub fn table(&self, key: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.key == key)
    }

    /// Normalize the input, resolve the search query and map every table to
    /// its panel. Nothing here touches the UI.
    pub fn prepare(&self, state: &DesiredState) -> DriverResult<PreparedRecord> {
        let normalized = normalize(state, &self.overrides())?;
        let query = self.search_query(&normalized)?;

        let tables = normalized
            .tables()
            .iter()
            .map(|table| {
                self.table(&table.path)
                    .map(|spec| (table.id.clone(), TableId::new(spec.panel)))
                    .ok_or_else(|| DriverError::UnknownTable {
                        entity: self.name.to_string(),
                        table: table.path.clone(),
                    })
            })
            .collect::<DriverResult<Vec<_>>>()?;

        Ok(PreparedRecord {
            normalized,
            query,
            tables,
        })
    }

    pub fn search_query(&self, normalized: &NormalizedState) -> DriverResult<SearchQuery> {
        let lookup = |key: &str| {
            normalized
                .value_at(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| DriverError::MissingSearchKey(key.to_string()))
        };

        match self.search {
            SearchSpec::Quick { key } => Ok(SearchQuery::Quick(lookup(key)?)),
            SearchSpec::Advanced { filters } => filters
                .iter()
                .map(|f| {
                    Ok(Filter {
                        field: f.field.to_string(),
                        operator: f.operator.to_string(),
                        value: lookup(f.key)?,
                    })
                })
                .collect::<DriverResult<Vec<_>>>()
                .map(SearchQuery::Advanced),
        }
    }

    /// Input paths outside the known catalogue. Advisory only.
    pub fn unknown_fields(&self, normalized: &NormalizedState) -> Vec<String> {
        let mut unknown: Vec<String> = normalized
            .fields()
            .iter()
            .filter(|f| !self.fields.contains(&f.path.as_str()))
            .map(|f| f.path.clone())
            .collect();

        for table in normalized.tables() {
            let Some(spec) = self.table(&table.path) else {
                continue;
            };
            let Some(rows) = normalized.table(&table.id) else {
                continue;
            };
            let known: Vec<String> = spec
                .columns
                .iter()
                .map(|c| auxsync_engine::field_id(c, &self.overrides()).to_string())
                .collect();
            if let Some(first) = rows.first() {
                for (cell, _) in first.iter() {
                    if !known.iter().any(|k| k == cell) {
                        unknown.push(format!("{}[].{}", table.path, cell));
                    }
                }
            }
        }
        unknown
    }
}

pub static BUSINESS_RELATION: EntitySpec = EntitySpec {
    name: "Business Relation",
    view_uri: "urn:view:meta:com.qad.erp.base.businessRelationV2s",
    search: SearchSpec::Quick {
        key: "main.business_relation_code",
    },
    overrides: &["GL", "EMail"],
    tables: &[],
    fields: &[
        "main.business_relation_code",
        "main.business_relation_name1",
        "main.business_relation_search_name",
        "main.addresses.head_office.head_office_street1",
        "main.addresses.head_office.head_office_street2",
        "main.addresses.head_office.head_office_street3",
        "main.addresses.head_office.head_office_zip_code",
        "main.addresses.head_office.head_office_city",
        "main.addresses.head_office.head_office_state_code",
        "main.addresses.head_office.head_office_telephone",
        "main.addresses.head_office.head_office_fax",
        "main.addresses.head_office.head_office_email",
        "main.addresses.head_office.head_office_web_site",
    ],
};

pub static CUSTOMER: EntitySpec = EntitySpec {
    name: "Customer",
    view_uri: "urn:view:meta:com.qad.erp.base.customerV2s",
    search: SearchSpec::Quick {
        key: "main.customer_code",
    },
    overrides: &["GL"],
    tables: &[],
    fields: &[
        "main.customer_code",
        "main.address.business_relation_name",
        "main.address.address_search_name",
        "main.address.city",
        "main.accounting_profile.invoice_control_gl_profile_code",
        "main.accounting_profile.credit_note_control_gl_profile_code",
        "main.accounting_profile.pre_payment_control_gl_profile_code",
        "main.accounting_profile.sales_account_gl_profile_code",
        "main.payment.credit_terms_code",
        "main.payment.invoice_status_code",
        "main.tax.tax_zone",
        "tax.tax_zone",
    ],
};

pub static SHIP_TO_ADDRESS: EntitySpec = EntitySpec {
    name: "Customer Ship-To Address",
    view_uri: "urn:view:meta:com.qad.erp.base.customershiptoV2s",
    search: SearchSpec::Advanced {
        filters: &[
            FilterSpec {
                field: "Customer",
                operator: "equals",
                key: "main.customer_code",
            },
            FilterSpec {
                field: "Ship-To Name",
                operator: "equals",
                key: "main.customer_ship_to_name",
            },
        ],
    },
    overrides: &["GL"],
    tables: &[],
    fields: &[
        "main.customer_code",
        "main.customer_ship_to_name",
        "address.address_search_name",
        "address.city",
        "address.country_code",
        "tax.tax_zone",
    ],
};

pub static SUPPLIER: EntitySpec = EntitySpec {
    name: "Supplier",
    view_uri: "urn:view:meta:com.qad.erp.base.supplierV2s",
    search: SearchSpec::Quick {
        key: "main.supplier_code",
    },
    overrides: &["GL"],
    tables: &[TableSpec {
        key: "banking",
        panel: "BankingPanel",
        columns: &[
            "bank_acc_format_code",
            "bank_number_formatted",
            "own_bank_number",
            "bank_business_relation_code",
            "bank_number_branch",
            "currency_code",
        ],
    }],
    fields: &[
        "main.supplier_code",
        "main.address.business_relation_name",
        "main.address.address_search_name",
        "main.address.city",
        "main.accounting_profile.invoice_control_gl_profile_code",
        "main.accounting_profile.credit_note_control_gl_profile_code",
        "main.accounting_profile.pre_payment_control_gl_profile_code",
        "main.accounting_profile.purchase_account_gl_profile_code",
        "main.payment.credit_terms_code",
        "main.payment.invoice_status_code",
        "tax.tax_zone",
    ],
};

pub static SALESPERSON: EntitySpec = EntitySpec {
    name: "Salesperson",
    view_uri: "urn:view:meta:com.qad.erp.sales.salespersons",
    search: SearchSpec::Quick {
        key: "main.salesperson_code",
    },
    overrides: &["GL"],
    tables: &[],
    fields: &[
        "main.salesperson_code",
        "main.business_relation_code",
        "main.sales_territory",
    ],
};
