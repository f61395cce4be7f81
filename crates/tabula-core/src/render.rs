//! HTML table rendering.
//!
//! [`HtmlTableRenderer::render`] turns a [`RecordSet`] into the two-part
//! [`RenderedReport`]. Each visible column picks exactly one strategy, fixed at
//! profile load time: selection checkbox, hyperlink, special format, or plain
//! text. Row order is the record-set order.
//!
//! Reference values are shown by the referenced record's display name. Names
//! are fetched from the store once per distinct reference per render call; a
//! missing name becomes a localized placeholder cell, a store failure aborts
//! the render.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::convert::ValueConverter;
use crate::error::{ReportError, StoreError};
use crate::locale::{keys, LocalizationResolver};
use crate::profile::{ColumnDefinition, ColumnRendering, Hyperlink, ReportProfile, SpecialFormat};
use crate::store::RecordStore;
use crate::types::{FieldValue, LanguageTag, Record, RecordSet, RenderedReport};

/// Markup for a cell whose attribute is absent on the record.
pub const EMPTY_CELL: &str = "<td class=\"empty\">&nbsp;</td>";

static CHAR_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]{0,31}|#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6});")
        .expect("character reference pattern compiles")
});

/// Escape text for HTML content and attribute values.
///
/// `&` is left alone when it already starts a character reference, so
/// escaping escaped text is a no-op.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + raw.len() / 8);
    for (i, ch) in raw.char_indices() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '&' if CHAR_REF_RE.is_match(&raw[i..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            c => out.push(c),
        }
    }
    out
}

/// Client bootstrap payload embedded in the auxiliary markup.
#[derive(Serialize)]
struct Bootstrap<'a> {
    count: usize,
    lang: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    truncated: bool,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders record sets for one profile.
pub struct HtmlTableRenderer<'a> {
    profile: &'a ReportProfile,
    store: &'a dyn RecordStore,
}

impl<'a> HtmlTableRenderer<'a> {
    pub fn new(profile: &'a ReportProfile, store: &'a dyn RecordStore) -> Self {
        Self { profile, store }
    }

    /// Render `records` for `lang`.
    ///
    /// Only a store failure while resolving reference names is an error.
    #[tracing::instrument(skip_all, fields(lang = %lang, records = records.len()))]
    pub fn render(&self, records: &RecordSet, lang: &LanguageTag) -> Result<RenderedReport, ReportError> {
        let mut pass = RenderPass {
            profile: self.profile,
            store: self.store,
            resolver: LocalizationResolver::new(lang, &self.profile.default_language),
            converter: ValueConverter::new(&self.profile.lease_terms, &self.profile.currency_symbol),
            lang,
            names: HashMap::new(),
            buf: String::new(),
        };

        pass.buf.push_str("<table class=\"tabula-report\">");
        pass.header();
        pass.buf.push_str("<tbody>");
        for record in records {
            pass.row(record)?;
        }
        pass.buf.push_str("</tbody></table>");

        let auxiliary_markup = auxiliary(&pass.resolver, records, lang);
        Ok(RenderedReport {
            table_markup: pass.buf,
            auxiliary_markup,
        })
    }
}

/// Per-call state: the output buffer and the reference-name cache.
struct RenderPass<'r> {
    profile: &'r ReportProfile,
    store: &'r dyn RecordStore,
    resolver: LocalizationResolver,
    converter: ValueConverter<'r>,
    lang: &'r LanguageTag,
    names: HashMap<(String, String), Option<String>>,
    buf: String,
}

/// Display text of one attribute value.
enum Shown {
    Text(String),
    Unresolved,
}

impl RenderPass<'_> {
    fn header(&mut self) {
        let profile = self.profile;
        self.buf.push_str("<thead><tr>");
        for column in profile.columns.visible() {
            if column.is_selection_column() {
                let label = match self.resolver.column_label(column) {
                    "" => self.resolver.phrase(keys::SELECT_ALL),
                    label => label,
                };
                let _ = write!(
                    self.buf,
                    "<th class=\"select\"><input type=\"checkbox\" class=\"select-all\" aria-label=\"{}\"></th>",
                    escape_html(label)
                );
            } else {
                let _ = write!(
                    self.buf,
                    "<th data-attribute=\"{}\">{}</th>",
                    escape_html(&column.attribute_name),
                    escape_html(self.resolver.column_label(column))
                );
            }
        }
        self.buf.push_str("</tr></thead>");
    }

    fn row(&mut self, record: &Record) -> Result<(), StoreError> {
        let profile = self.profile;
        let _ = write!(
            self.buf,
            "<tr data-entity=\"{}\" data-id=\"{}\">",
            escape_html(&record.entity),
            escape_html(&record.id)
        );
        for column in profile.columns.visible() {
            match &column.rendering {
                ColumnRendering::Selection => self.selection_cell(record),
                ColumnRendering::Hyperlink(link) => self.hyperlink_cell(column, link, record)?,
                ColumnRendering::Special(format) => self.special_cell(column, *format, record)?,
                ColumnRendering::Plain => self.plain_cell(column, record)?,
            }
        }
        self.buf.push_str("</tr>");
        Ok(())
    }

    fn selection_cell(&mut self, record: &Record) {
        let _ = write!(
            self.buf,
            "<td class=\"select\"><input type=\"checkbox\" name=\"select\" value=\"{}\"></td>",
            escape_html(&record.id)
        );
    }

    fn hyperlink_cell(
        &mut self,
        column: &ColumnDefinition,
        link: &Hyperlink,
        record: &Record,
    ) -> Result<(), StoreError> {
        let Some(value) = record.get(&column.attribute_name) else {
            self.buf.push_str(EMPTY_CELL);
            return Ok(());
        };
        let text = match self.show(&value)? {
            Shown::Text(text) if text.is_empty() => {
                self.buf.push_str(EMPTY_CELL);
                return Ok(());
            }
            Shown::Text(text) => encode(column, &text),
            Shown::Unresolved => {
                self.unresolved_cell();
                return Ok(());
            }
        };

        let target_id = record.get(&link.id_attribute).and_then(|v| match v {
            FieldValue::Reference { id, .. } => Some(id),
            FieldValue::Text(t) if t.is_empty() => None,
            other => Some(other.to_string()),
        });
        match target_id {
            Some(id) => {
                let href = self
                    .profile
                    .link_template
                    .replace("{entity}", &urlencoding::encode(&link.entity))
                    .replace("{id}", &urlencoding::encode(&id));
                let _ = write!(self.buf, "<td><a href=\"{}\">{}</a></td>", escape_html(&href), text);
            }
            None => {
                tracing::debug!(attribute = %link.id_attribute, record = %record.id, "link id absent, rendering unlinked");
                let _ = write!(self.buf, "<td>{text}</td>");
            }
        }
        Ok(())
    }

    fn special_cell(
        &mut self,
        column: &ColumnDefinition,
        format: SpecialFormat,
        record: &Record,
    ) -> Result<(), StoreError> {
        let Some(value) = record.get(&column.attribute_name) else {
            self.buf.push_str(EMPTY_CELL);
            return Ok(());
        };
        match self.converter.to_display(&value, format, self.lang) {
            Ok(text) if text.is_empty() => self.buf.push_str(EMPTY_CELL),
            Ok(text) => {
                let _ = write!(self.buf, "<td class=\"special\">{}</td>", encode(column, &text));
            }
            Err(err) => {
                tracing::debug!(attribute = %column.attribute_name, %err, "special format failed, rendering plain");
                self.value_cell(column, &value)?;
            }
        }
        Ok(())
    }

    fn plain_cell(&mut self, column: &ColumnDefinition, record: &Record) -> Result<(), StoreError> {
        match record.get(&column.attribute_name) {
            Some(value) => self.value_cell(column, &value),
            None => {
                self.buf.push_str(EMPTY_CELL);
                Ok(())
            }
        }
    }

    fn value_cell(&mut self, column: &ColumnDefinition, value: &FieldValue) -> Result<(), StoreError> {
        match self.show(value)? {
            Shown::Text(text) if text.is_empty() => self.buf.push_str(EMPTY_CELL),
            Shown::Text(text) => {
                let _ = write!(self.buf, "<td>{}</td>", encode(column, &text));
            }
            Shown::Unresolved => self.unresolved_cell(),
        }
        Ok(())
    }

    fn unresolved_cell(&mut self) {
        let _ = write!(
            self.buf,
            "<td class=\"unresolved\">{}</td>",
            escape_html(self.resolver.phrase(keys::UNRESOLVED_REFERENCE))
        );
    }

    fn show(&mut self, value: &FieldValue) -> Result<Shown, StoreError> {
        Ok(match value {
            FieldValue::Reference { entity, id } => match self.display_name(entity, id)? {
                Some(name) => Shown::Text(name),
                None => Shown::Unresolved,
            },
            FieldValue::Bool(b) => Shown::Text(self.resolver.boolean(*b).to_string()),
            other => Shown::Text(other.to_string()),
        })
    }

    fn display_name(&mut self, entity: &str, id: &str) -> Result<Option<String>, StoreError> {
        let key = (entity.to_string(), id.to_string());
        if let Some(cached) = self.names.get(&key) {
            return Ok(cached.clone());
        }
        let name = self.store.resolve_display_name(entity, id)?;
        if name.is_none() {
            tracing::debug!(entity, id, "unresolved reference");
        }
        self.names.insert(key, name.clone());
        Ok(name)
    }
}

fn encode(column: &ColumnDefinition, text: &str) -> String {
    if column.must_html_encode {
        escape_html(text)
    } else {
        text.to_string()
    }
}

fn auxiliary(resolver: &LocalizationResolver, records: &RecordSet, lang: &LanguageTag) -> String {
    let mut summary = resolver.result_count(records.len());
    if records.truncated {
        let _ = write!(summary, " ({})", resolver.truncation_notice(records.len()));
    }

    let bootstrap = Bootstrap {
        count: records.len(),
        lang: lang.as_str(),
        truncated: records.truncated,
    };
    // Serializing a struct of plain fields cannot fail.
    let json = serde_json::to_string(&bootstrap)
        .unwrap_or_default()
        .replace('<', "\\u003c");

    format!(
        "<div class=\"tabula-summary\" lang=\"{lang}\" data-count=\"{count}\">{summary}</div>\
         <script>window.tabula && window.tabula.init({json});</script>",
        lang = escape_html(lang.as_str()),
        count = records.len(),
        summary = escape_html(&summary),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
