//! Key normalization
//!
//! Record descriptions use `snake_case` names; the form addresses its
//! controls by `camelCase` identifiers. Acronyms that the form spells with
//! fixed casing (`GL`, `EMail`) are supplied as override words.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::state::{join_path, DesiredState, FieldId, Node, Row, Section};

/// Words that keep their exact casing when they appear after the first word
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    words: Vec<String>,
}

impl Overrides {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Case-insensitive lookup returning the override's exact spelling
    pub fn lookup(&self, word: &str) -> Option<&str> {
        self.words
            .iter()
            .find(|w| w.eq_ignore_ascii_case(word))
            .map(String::as_str)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl<S: Into<String>> FromIterator<S> for Overrides {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Convert one `snake_case` name into a field identifier.
///
/// The first word is lower-cased; every later word is title-cased unless it
/// matches an override word, which is substituted verbatim.
pub fn field_id(name: &str, overrides: &Overrides) -> FieldId {
    let mut words = name.split('_');
    let mut id = words.next().unwrap_or_default().to_lowercase();
    for word in words {
        match overrides.lookup(word) {
            Some(exact) => id.push_str(exact),
            None => id.push_str(&title_case(word)),
        }
    }
    FieldId::new(id)
}

/// Upper-case the first letter of every alphabetic run and lower-case the
/// rest, so `name1` becomes `Name1` and `web2site` becomes `Web2Site`.
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut in_run = false;
    for ch in word.chars() {
        if ch.is_alphabetic() {
            if in_run {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

/// A normalized field or table together with the path it came from
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldPath {
    pub path: String,
    pub id: FieldId,
}

/// A desired state whose keys are all field identifiers
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedState {
    root: Section,
    fields: Vec<FieldPath>,
    tables: Vec<FieldPath>,
}

impl NormalizedState {
    pub fn root(&self) -> &Section {
        &self.root
    }

    /// Scalar fields in fill order
    pub fn fields(&self) -> &[FieldPath] {
        &self.fields
    }

    pub fn tables(&self) -> &[FieldPath] {
        &self.tables
    }

    /// Rows of the table whose normalized key is `id`
    pub fn table(&self, id: &FieldId) -> Option<&[Row]> {
        self.root
            .tables()
            .into_iter()
            .find(|(name, _)| *name == id.as_str())
            .map(|(_, rows)| rows)
    }

    /// Look up a scalar by its input path, e.g. `main.customer_code`
    pub fn value_at(&self, path: &str) -> Option<String> {
        let id = &self.fields.iter().find(|f| f.path == path)?.id;
        self.root
            .scalar_fields()
            .into_iter()
            .find(|(field, _)| field == id)
            .map(|(_, value)| value.to_ui_string())
    }
}

/// Normalize every key of a desired state, preserving its shape.
///
/// Two scalar paths mapping to the same identifier would address the same
/// control, so any collision is reported as a schema error.
pub fn normalize(state: &DesiredState, overrides: &Overrides) -> EngineResult<NormalizedState> {
    let mut walker = Walker {
        overrides,
        fields: Vec::new(),
        tables: Vec::new(),
        seen: HashMap::new(),
    };
    let root = walker.section(state.root(), "")?;
    Ok(NormalizedState {
        root,
        fields: walker.fields,
        tables: walker.tables,
    })
}

struct Walker<'a> {
    overrides: &'a Overrides,
    fields: Vec<FieldPath>,
    tables: Vec<FieldPath>,
    seen: HashMap<FieldId, String>,
}

impl Walker<'_> {
    fn section(&mut self, section: &Section, path: &str) -> EngineResult<Section> {
        let mut out = Section::new();
        let mut local: HashMap<FieldId, &str> = HashMap::new();

        for (name, node) in section.iter() {
            let id = field_id(name, self.overrides);
            let child_path = join_path(path, name);
            if let Some(previous) = local.insert(id.clone(), name) {
                return Err(collision(&id, &join_path(path, previous), &child_path));
            }

            let normalized = match node {
                Node::Scalar(value) => {
                    if let Some(previous) = self.seen.insert(id.clone(), child_path.clone()) {
                        return Err(collision(&id, &previous, &child_path));
                    }
                    self.fields.push(FieldPath {
                        path: child_path,
                        id: id.clone(),
                    });
                    Node::Scalar(value.clone())
                }
                Node::Section(inner) => Node::Section(self.section(inner, &child_path)?),
                Node::Table(rows) => {
                    let rows = rows
                        .iter()
                        .map(|row| self.row(row, &child_path))
                        .collect::<EngineResult<Vec<_>>>()?;
                    self.tables.push(FieldPath {
                        path: child_path,
                        id: id.clone(),
                    });
                    Node::Table(rows)
                }
            };
            out.insert(id.as_str(), normalized)?;
        }
        Ok(out)
    }

    fn row(&self, row: &Row, path: &str) -> EngineResult<Row> {
        let mut out = Row::new();
        for (name, value) in row.iter() {
            let id = field_id(name, self.overrides);
            if out.get(id.as_str()).is_some() {
                return Err(EngineError::Schema(format!(
                    "table `{}` has two cells normalizing to `{}`",
                    path, id
                )));
            }
            out.set(id.as_str(), value.clone());
        }
        Ok(out)
    }
}

fn collision(id: &FieldId, first: &str, second: &str) -> EngineError {
    EngineError::Schema(format!(
        "`{}` and `{}` both normalize to field `{}`",
        first, second, id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Scalar;
    use test_case::test_case;

    #[test_case("business_relation_name1", &["GL"], "businessRelationName1" ; "digits stay attached")]
    #[test_case("invoice_control_gl_profile_code", &["GL"], "invoiceControlGLProfileCode" ; "acronym override")]
    #[test_case("head_office_email", &["GL", "EMail"], "headOfficeEMail" ; "mixed case override")]
    #[test_case("head_office_email", &[], "headOfficeEmail" ; "no overrides")]
    #[test_case("code", &["GL"], "code" ; "single word")]
    #[test_case("Code", &[], "code" ; "single word is lower cased")]
    #[test_case("GL_account", &["GL"], "glAccount" ; "first word ignores overrides")]
    #[test_case("tax_zone", &["GL"], "taxZone" ; "plain words")]
    #[test_case("web_SITE", &[], "webSite" ; "title case lowers the tail")]
    fn test_field_id(name: &str, overrides: &[&str], expected: &str) {
        let overrides = Overrides::new(overrides.iter().copied());
        assert_eq!(field_id(name, &overrides).as_str(), expected);
    }

    #[test]
    fn test_every_override_is_considered() {
        // an override later in the list must still win over title-casing
        let overrides = Overrides::new(["EMail", "GL"]);
        assert_eq!(field_id("email_gl", &overrides).as_str(), "emailGL");
        assert_eq!(field_id("x_email_gl", &overrides).as_str(), "xEMailGL");
    }

    #[test]
    fn test_normalize_preserves_shape() {
        let state = DesiredState::from_yaml(
            r#"
main:
  supplier_code: S1
  accounting_profile:
    invoice_control_gl_profile_code: GLP
banking:
  - bank_number_formatted: "1"
    currency_code: AUD
"#,
        )
        .unwrap();
        let normalized = normalize(&state, &Overrides::new(["GL"])).unwrap();

        let main = normalized.root().section("main").unwrap();
        let profile = main.section("accountingProfile").unwrap();
        assert_eq!(
            profile.scalar("invoiceControlGLProfileCode"),
            Some(&Scalar::Text("GLP".into()))
        );

        let rows = normalized.table(&FieldId::new("banking")).unwrap();
        assert_eq!(rows[0].get("bankNumberFormatted"), Some(&Scalar::Text("1".into())));
        assert_eq!(rows[0].get("currencyCode"), Some(&Scalar::Text("AUD".into())));

        let paths: Vec<_> = normalized.fields().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            ["main.supplier_code", "main.accounting_profile.invoice_control_gl_profile_code"]
        );
        assert_eq!(normalized.value_at("main.supplier_code").as_deref(), Some("S1"));
        assert_eq!(normalized.tables()[0].path, "banking");
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let state = DesiredState::from_yaml("main:\n  a_b: 1\n  c_gl_d: 2\n").unwrap();
        let overrides = Overrides::new(["GL"]);
        assert_eq!(
            normalize(&state, &overrides).unwrap(),
            normalize(&state, &overrides).unwrap()
        );
    }

    #[test]
    fn test_collision_in_same_section() {
        let state = DesiredState::from_yaml("main:\n  tax_zone: A\n  tax_Zone: B\n").unwrap();
        let err = normalize(&state, &Overrides::none()).unwrap_err();
        assert!(err.to_string().contains("taxZone"), "{}", err);
    }

    #[test]
    fn test_collision_across_sections() {
        let state = DesiredState::from_yaml("main:\n  city: A\naddress:\n  city: B\n").unwrap();
        let err = normalize(&state, &Overrides::none()).unwrap_err();
        assert!(matches!(err, EngineError::Schema(_)));
    }

    #[test]
    fn test_collision_inside_row() {
        let state = DesiredState::from_yaml("t:\n  - a_b: 1\n    a_B: 2\n").unwrap();
        assert!(normalize(&state, &Overrides::none()).is_err());
    }
}
