//! Report profile: the static registries that drive search and rendering.
//!
//! A profile bundles the [`CriterionRegistry`], the ordered [`ColumnRegistry`]
//! and the [`LeaseTermTable`]. Profiles are TOML documents; the default one is
//! embedded in the binary via [`include_str!`]. Load once at startup with
//! [`ReportProfile::load_default`] or [`ReportProfile::from_path`], wrap in an
//! `Arc`, and share it: nothing in a profile is mutable after validation.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use config::{Config, File, FileFormat};
use serde::Deserialize;

use crate::error::ProfileError;
use crate::store::Operator;
use crate::types::LanguageTag;

const DEFAULT_PROFILE_SRC: &str = include_str!("../profiles/default.toml");

// ---------------------------------------------------------------------------
// Raw (serde) types, mirroring the TOML structure
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(default = "default_language")]
    default_language: String,
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default = "default_link_template")]
    link_template: String,
    #[serde(default = "default_currency_symbol")]
    currency_symbol: String,
    #[serde(default)]
    criteria: Vec<RawCriterion>,
    #[serde(default)]
    columns: Vec<RawColumn>,
    #[serde(default)]
    lease_terms: Vec<RawLeaseTerm>,
}

fn default_language() -> String { "en".to_string() }
fn default_link_template() -> String { "/records/{entity}/{id}".to_string() }
fn default_currency_symbol() -> String { "$".to_string() }
fn default_true() -> bool { true }

#[derive(Debug, Deserialize)]
struct RawCriterion {
    operator: String,
    field: String,
    entity: String,
    #[serde(default)]
    conversion: Option<String>,
    #[serde(default)]
    lookup_entity: Option<String>,
    #[serde(default)]
    lookup_name_field: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    attribute: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(default = "default_true")]
    html_encode: bool,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    selection: bool,
    #[serde(default)]
    special: Option<String>,
    #[serde(default)]
    link_entity: Option<String>,
    #[serde(default)]
    link_id_attribute: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLeaseTerm {
    code: i64,
    months: u32,
    #[serde(default)]
    labels: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// How a raw search term is transformed before comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    None,
    CurrencyToNumber,
    LeaseTerm,
    /// Resolve a display name to the id of an `entity` record whose
    /// `name_field` equals the term.
    LookupByDisplayName { entity: String, name_field: String },
}

impl ConversionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConversionKind::None => "none",
            ConversionKind::CurrencyToNumber => "currency_to_number",
            ConversionKind::LeaseTerm => "lease_term",
            ConversionKind::LookupByDisplayName { .. } => "lookup_by_display_name",
        }
    }

    /// Whether `operator` is meaningful for values produced by this conversion.
    pub fn accepts(&self, operator: Operator) -> bool {
        match self {
            ConversionKind::None => true,
            ConversionKind::CurrencyToNumber => {
                operator.is_equality_class() || operator.is_ordering()
            }
            ConversionKind::LeaseTerm | ConversionKind::LookupByDisplayName { .. } => {
                operator.is_equality_class()
            }
        }
    }
}

impl std::fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One declarative rule mapping a search term onto a query condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriterionDefinition {
    pub operator: Operator,
    pub target_field: String,
    pub target_entity: String,
    pub conversion: ConversionKind,
}

impl SearchCriterionDefinition {
    pub fn new(
        operator: Operator,
        target_field: impl Into<String>,
        target_entity: impl Into<String>,
        conversion: ConversionKind,
    ) -> Self {
        Self {
            operator,
            target_field: target_field.into(),
            target_entity: target_entity.into(),
            conversion,
        }
    }
}

/// Ordered, validated list of criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriterionRegistry {
    criteria: Vec<SearchCriterionDefinition>,
}

impl CriterionRegistry {
    /// Validate operator/conversion compatibility for every criterion.
    pub fn new(criteria: Vec<SearchCriterionDefinition>) -> Result<Self, ProfileError> {
        for (index, c) in criteria.iter().enumerate() {
            if !c.conversion.accepts(c.operator) {
                return Err(ProfileError::IncompatibleOperator {
                    index,
                    field: c.target_field.clone(),
                    operator: c.operator.to_string(),
                    conversion: c.conversion.to_string(),
                });
            }
        }
        Ok(Self { criteria })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchCriterionDefinition> {
        self.criteria.iter()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// Custom cell formatting for special columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialFormat {
    /// Stored lease-term code → localised descriptor.
    LeaseTerm,
    /// Number → localised amount with the profile's currency symbol.
    Currency,
    /// Date → localised short date.
    Date,
}

impl SpecialFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lease_term" | "lease-term" => Some(SpecialFormat::LeaseTerm),
            "currency" | "money" => Some(SpecialFormat::Currency),
            "date" => Some(SpecialFormat::Date),
            _ => None,
        }
    }
}

/// Link target of a hyperlink column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    /// Record type the link points at.
    pub entity: String,
    /// Attribute on the rendered record holding the target id.
    pub id_attribute: String,
}

/// The single rendering strategy picked for a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRendering {
    Selection,
    Hyperlink(Hyperlink),
    Special(SpecialFormat),
    Plain,
}

/// How one record field renders as a grid column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub attribute_name: String,
    pub must_html_encode: bool,
    pub visible_in_grid: bool,
    pub rendering: ColumnRendering,
    label: String,
    localized_labels: HashMap<LanguageTag, String>,
}

impl ColumnDefinition {
    fn with_rendering(attribute: &str, label: &str, rendering: ColumnRendering) -> Self {
        Self {
            attribute_name: attribute.to_string(),
            must_html_encode: true,
            visible_in_grid: true,
            rendering,
            label: label.to_string(),
            localized_labels: HashMap::new(),
        }
    }

    pub fn plain(attribute: &str, label: &str) -> Self {
        Self::with_rendering(attribute, label, ColumnRendering::Plain)
    }

    pub fn selection(attribute: &str, label: &str) -> Self {
        let mut column = Self::with_rendering(attribute, label, ColumnRendering::Selection);
        column.must_html_encode = false;
        column
    }

    pub fn hyperlink(attribute: &str, label: &str, entity: &str, id_attribute: &str) -> Self {
        Self::with_rendering(
            attribute,
            label,
            ColumnRendering::Hyperlink(Hyperlink {
                entity: entity.to_string(),
                id_attribute: id_attribute.to_string(),
            }),
        )
    }

    pub fn special(attribute: &str, label: &str, format: SpecialFormat) -> Self {
        Self::with_rendering(attribute, label, ColumnRendering::Special(format))
    }

    pub fn localized(mut self, lang: &str, label: &str) -> Self {
        self.localized_labels
            .insert(LanguageTag::new(lang), label.to_string());
        self
    }

    pub fn html_encode(mut self, encode: bool) -> Self {
        self.must_html_encode = encode;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible_in_grid = false;
        self
    }

    /// Label used when no translation exists for the requested language.
    pub fn default_label(&self) -> &str {
        &self.label
    }

    /// Translation registered for exactly this tag.
    pub fn localized_label(&self, lang: &LanguageTag) -> Option<&str> {
        self.localized_labels.get(lang).map(String::as_str)
    }

    pub fn is_selection_column(&self) -> bool {
        matches!(self.rendering, ColumnRendering::Selection)
    }

    pub fn is_special_column(&self) -> bool {
        matches!(self.rendering, ColumnRendering::Special(_))
    }

    pub fn hyperlink_target(&self) -> Option<&Hyperlink> {
        match &self.rendering {
            ColumnRendering::Hyperlink(h) => Some(h),
            _ => None,
        }
    }
}

/// Ordered, validated list of columns. Order is the rendered column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDefinition>,
}

impl ColumnRegistry {
    pub fn new(columns: Vec<ColumnDefinition>) -> Result<Self, ProfileError> {
        if columns.is_empty() {
            return Err(ProfileError::NoColumns);
        }
        let mut seen = HashSet::new();
        for c in &columns {
            if !seen.insert(c.attribute_name.as_str()) {
                return Err(ProfileError::DuplicateColumn(c.attribute_name.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDefinition> {
        self.columns.iter()
    }

    /// Columns with `visible_in_grid`, in order.
    pub fn visible(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.visible_in_grid)
    }

    /// Record fields a store must populate to render every column.
    pub fn projection(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if name != "id" && !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        };
        for c in &self.columns {
            match &c.rendering {
                ColumnRendering::Selection => {}
                ColumnRendering::Hyperlink(h) => {
                    push(&c.attribute_name);
                    push(&h.id_attribute);
                }
                _ => push(&c.attribute_name),
            }
        }
        fields
    }
}

// ---------------------------------------------------------------------------
// Lease terms
// ---------------------------------------------------------------------------

/// One lease-term option: its stored code, length and display labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseTerm {
    pub code: i64,
    pub months: u32,
    labels: HashMap<LanguageTag, String>,
}

impl LeaseTerm {
    pub fn new(code: i64, months: u32) -> Self {
        Self {
            code,
            months,
            labels: HashMap::new(),
        }
    }

    pub fn label(mut self, lang: &str, text: &str) -> Self {
        self.labels.insert(LanguageTag::new(lang), text.to_string());
        self
    }

    /// Label for `lang`: exact tag, then primary subtag, then `None`.
    pub fn label_for(&self, lang: &LanguageTag) -> Option<&str> {
        self.labels
            .get(lang)
            .or_else(|| self.labels.get(&LanguageTag::new(lang.primary())))
            .map(String::as_str)
    }
}

/// Bidirectional months ↔ code table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaseTermTable {
    terms: Vec<LeaseTerm>,
}

impl LeaseTermTable {
    pub fn new(terms: Vec<LeaseTerm>) -> Result<Self, ProfileError> {
        let mut codes = HashSet::new();
        let mut months = HashSet::new();
        for t in &terms {
            if !codes.insert(t.code) {
                return Err(ProfileError::DuplicateLeaseTerm(format!("code {}", t.code)));
            }
            if !months.insert(t.months) {
                return Err(ProfileError::DuplicateLeaseTerm(format!("{} months", t.months)));
            }
        }
        Ok(Self { terms })
    }

    pub fn by_months(&self, months: u32) -> Option<&LeaseTerm> {
        self.terms.iter().find(|t| t.months == months)
    }

    pub fn by_code(&self, code: i64) -> Option<&LeaseTerm> {
        self.terms.iter().find(|t| t.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Validated, immutable report configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportProfile {
    pub criteria: CriterionRegistry,
    pub columns: ColumnRegistry,
    pub lease_terms: LeaseTermTable,
    pub default_language: LanguageTag,
    /// Languages with translated labels. Informational; any tag is accepted.
    pub languages: Vec<LanguageTag>,
    /// Hyperlink URL template with `{entity}` and `{id}` placeholders.
    pub link_template: String,
    pub currency_symbol: String,
}

impl ReportProfile {
    /// Build a profile from already-validated parts, with default settings.
    pub fn new(
        criteria: CriterionRegistry,
        columns: ColumnRegistry,
        lease_terms: LeaseTermTable,
    ) -> Self {
        Self {
            criteria,
            columns,
            lease_terms,
            default_language: LanguageTag::new(&default_language()),
            languages: vec![LanguageTag::new("en"), LanguageTag::new("fr")],
            link_template: default_link_template(),
            currency_symbol: default_currency_symbol(),
        }
    }

    pub fn with_link_template(mut self, template: &str) -> Self {
        self.link_template = template.to_string();
        self
    }

    pub fn with_default_language(mut self, lang: &str) -> Self {
        self.default_language = LanguageTag::new(lang);
        self
    }

    /// Load and parse the embedded default profile.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed. It ships with the crate and
    /// is covered by tests, so this should never happen in practice.
    pub fn load_default() -> Self {
        Self::from_toml_str(DEFAULT_PROFILE_SRC).expect("embedded default profile must be valid")
    }

    /// Read and validate a profile file.
    pub fn from_path(path: &Path) -> Result<Self, ProfileError> {
        let src = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    /// Parse and validate a profile from a TOML string.
    pub fn from_toml_str(src: &str) -> Result<Self, ProfileError> {
        let raw: RawProfile = Config::builder()
            .add_source(File::from_str(src, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        let criteria = raw
            .criteria
            .into_iter()
            .enumerate()
            .map(|(index, c)| criterion_from_raw(index, c))
            .collect::<Result<Vec<_>, _>>()?;

        let columns = raw
            .columns
            .into_iter()
            .map(column_from_raw)
            .collect::<Result<Vec<_>, _>>()?;

        let lease_terms = raw
            .lease_terms
            .into_iter()
            .map(|t| LeaseTerm {
                code: t.code,
                months: t.months,
                labels: t
                    .labels
                    .into_iter()
                    .map(|(k, v)| (LanguageTag::new(&k), v))
                    .collect(),
            })
            .collect();

        let mut languages: Vec<LanguageTag> =
            raw.languages.iter().map(|l| LanguageTag::new(l)).collect();
        let default_language = LanguageTag::new(&raw.default_language);
        if !languages.contains(&default_language) {
            languages.insert(0, default_language.clone());
        }

        Ok(Self {
            criteria: CriterionRegistry::new(criteria)?,
            columns: ColumnRegistry::new(columns)?,
            lease_terms: LeaseTermTable::new(lease_terms)?,
            default_language,
            languages,
            link_template: raw.link_template,
            currency_symbol: raw.currency_symbol,
        })
    }
}

fn criterion_from_raw(index: usize, raw: RawCriterion) -> Result<SearchCriterionDefinition, ProfileError> {
    let operator = Operator::parse(&raw.operator).ok_or_else(|| ProfileError::UnknownOperator {
        index,
        name: raw.operator.clone(),
    })?;

    let conversion = match raw.conversion.as_deref().map(str::trim) {
        None | Some("") | Some("none") => ConversionKind::None,
        Some("currency_to_number") | Some("currency") => ConversionKind::CurrencyToNumber,
        Some("lease_term") => ConversionKind::LeaseTerm,
        Some("lookup_by_display_name") | Some("lookup") => match (raw.lookup_entity, raw.lookup_name_field) {
            (Some(entity), Some(name_field)) => ConversionKind::LookupByDisplayName { entity, name_field },
            _ => return Err(ProfileError::IncompleteLookup { index }),
        },
        Some(other) => {
            return Err(ProfileError::UnknownConversion {
                index,
                name: other.to_string(),
            })
        }
    };

    Ok(SearchCriterionDefinition::new(operator, raw.field, raw.entity, conversion))
}

/// Resolve the column's rendering strategy: selection, then hyperlink, then
/// special, then plain.
fn column_from_raw(raw: RawColumn) -> Result<ColumnDefinition, ProfileError> {
    let hyperlink = match (raw.link_entity, raw.link_id_attribute) {
        (Some(entity), Some(id_attribute)) => Some(Hyperlink { entity, id_attribute }),
        (None, None) => None,
        _ => {
            return Err(ProfileError::IncompleteHyperlink {
                attribute: raw.attribute,
            })
        }
    };

    let special = match raw.special.as_deref() {
        Some(name) => Some(SpecialFormat::parse(name).ok_or_else(|| {
            ProfileError::UnknownSpecialFormat {
                attribute: raw.attribute.clone(),
                name: name.to_string(),
            }
        })?),
        None => None,
    };

    let flags = [raw.selection, hyperlink.is_some(), special.is_some()];
    if flags.iter().filter(|set| **set).count() > 1 {
        tracing::warn!(
            attribute = %raw.attribute,
            "column sets more than one of selection/hyperlink/special; using the first by priority"
        );
    }

    let rendering = if raw.selection {
        ColumnRendering::Selection
    } else if let Some(h) = hyperlink {
        ColumnRendering::Hyperlink(h)
    } else if let Some(f) = special {
        ColumnRendering::Special(f)
    } else {
        ColumnRendering::Plain
    };

    let label = raw.label.unwrap_or_else(|| raw.attribute.clone());
    Ok(ColumnDefinition {
        attribute_name: raw.attribute,
        must_html_encode: raw.html_encode,
        visible_in_grid: raw.visible,
        rendering,
        label,
        localized_labels: raw
            .labels
            .into_iter()
            .map(|(k, v)| (LanguageTag::new(&k), v))
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
