//! Search layer: turns one search term into per-entity queries.
//!
//! Every criterion in the profile contributes at most one condition. The term
//! is converted per criterion; a criterion whose conversion fails is skipped.
//! Conditions on the same entity type are OR-combined into one query; queries
//! for different entity types run independently and their rows are unioned by
//! `(entity, id)` in query order.

use std::collections::HashSet;
use std::str::FromStr;

use crate::convert::ValueConverter;
use crate::error::{ConversionError, ReportError};
use crate::profile::{ReportProfile, SearchCriterionDefinition};
use crate::store::{Combine, Condition, ConditionValue, EntityQuery, Operator, RecordStore};
use crate::types::{FieldValue, LanguageTag, RecordSet};

/// Separator between the search value and the language tag.
pub const COMPOUND_DELIMITER: char = '|';

// ---------------------------------------------------------------------------
// Compound term
// ---------------------------------------------------------------------------

/// A `term|lang` input split into its two segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundTerm {
    /// Trimmed search value. May be empty.
    pub term: String,
    pub lang: LanguageTag,
}

impl CompoundTerm {
    /// Split `raw` on [`COMPOUND_DELIMITER`].
    ///
    /// Exactly one delimiter is required and the language segment must be
    /// non-empty. An empty term segment is accepted.
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        let malformed = |reason| ReportError::MalformedSearchTerm {
            raw: raw.to_string(),
            reason,
        };
        let mut parts = raw.split(COMPOUND_DELIMITER);
        let (Some(term), Some(lang), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed("expected exactly one '|' between term and language"));
        };
        let lang = lang.trim();
        if lang.is_empty() {
            return Err(malformed("language segment is empty"));
        }
        Ok(Self {
            term: term.trim().to_string(),
            lang: LanguageTag::new(lang),
        })
    }
}

impl FromStr for CompoundTerm {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Builds and executes queries for one profile against one store.
pub struct SearchEngine<'a> {
    profile: &'a ReportProfile,
    store: &'a dyn RecordStore,
    max_records: Option<usize>,
}

impl<'a> SearchEngine<'a> {
    pub fn new(profile: &'a ReportProfile, store: &'a dyn RecordStore) -> Self {
        Self {
            profile,
            store,
            max_records: None,
        }
    }

    /// Cap the unioned result; a capped set is flagged as truncated.
    pub fn with_max_records(mut self, max_records: Option<usize>) -> Self {
        self.max_records = max_records;
        self
    }

    /// Search for a parsed compound term.
    pub fn search_compound(&self, compound: &CompoundTerm) -> Result<RecordSet, ReportError> {
        self.search(&compound.term, &compound.lang)
    }

    /// Run the search. An empty term returns an empty set without touching
    /// the store.
    #[tracing::instrument(skip(self, lang), fields(lang = %lang))]
    pub fn search(&self, term: &str, lang: &LanguageTag) -> Result<RecordSet, ReportError> {
        let term = term.trim();
        if term.is_empty() {
            tracing::debug!("empty term, no query issued");
            return Ok(RecordSet::empty());
        }

        let queries = self.build_queries(term, lang)?;
        if queries.is_empty() {
            return Err(ReportError::NoMatchableCriteria {
                term: term.to_string(),
            });
        }
        self.execute(&queries)
    }

    /// Derive one query per target entity type, in first-criterion order.
    ///
    /// Lookup conversions query the store here; their failures are fatal.
    pub fn build_queries(&self, term: &str, lang: &LanguageTag) -> Result<Vec<EntityQuery>, ReportError> {
        let converter = ValueConverter::new(&self.profile.lease_terms, &self.profile.currency_symbol);
        let projection = self.profile.columns.projection();
        let mut queries: Vec<EntityQuery> = Vec::new();

        for criterion in self.profile.criteria.iter() {
            let condition = match self.condition_for(criterion, term, lang, &converter) {
                Ok(condition) => condition,
                Err(ConversionError::Store(err)) => return Err(ReportError::StoreUnavailable(err)),
                Err(err) => {
                    tracing::debug!(
                        entity = %criterion.target_entity,
                        field = %criterion.target_field,
                        %err,
                        "criterion skipped"
                    );
                    continue;
                }
            };

            match queries.iter_mut().find(|q| q.entity == criterion.target_entity) {
                Some(query) => query.conditions.push(condition),
                None => queries.push(
                    EntityQuery::new(criterion.target_entity.clone(), Combine::Or)
                        .condition(condition)
                        .columns(projection.clone()),
                ),
            }
        }
        Ok(queries)
    }

    fn condition_for(
        &self,
        criterion: &SearchCriterionDefinition,
        term: &str,
        lang: &LanguageTag,
        converter: &ValueConverter<'_>,
    ) -> Result<Condition, ConversionError> {
        let convert = |raw: &str| converter.to_query_value(raw, &criterion.conversion, lang, self.store);
        let operator = criterion.operator;

        let value = if operator.is_set() {
            let items: Vec<&str> = term
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .collect();
            let items = if items.is_empty() { vec![term] } else { items };
            ConditionValue::Many(items.into_iter().map(convert).collect::<Result<_, _>>()?)
        } else if operator.is_pattern() {
            ConditionValue::Single(FieldValue::Text(pattern_for(operator, term)))
        } else {
            ConditionValue::Single(convert(term)?)
        };

        Ok(Condition::new(criterion.target_field.clone(), operator, value))
    }

    fn execute(&self, queries: &[EntityQuery]) -> Result<RecordSet, ReportError> {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut records = Vec::new();

        for query in queries {
            let rows = self.store.query(query)?;
            tracing::info!(
                entity = %query.entity,
                conditions = query.conditions.len(),
                rows = rows.len(),
                "entity query executed"
            );
            for row in rows {
                if seen.insert((row.entity.clone(), row.id.clone())) {
                    records.push(row);
                }
            }
        }

        let mut set = RecordSet::new(records);
        if let Some(max) = self.max_records {
            set.cap(max);
        }
        Ok(set)
    }
}

/// `Like` terms without a wildcard match anywhere in the field. `%` is the
/// only wildcard a user can type; `_` and `\` are escaped to match literally.
fn pattern_for(operator: Operator, term: &str) -> String {
    match operator {
        Operator::Like | Operator::NotLike => {
            let mut pattern = String::with_capacity(term.len() + 2);
            for ch in term.chars() {
                if matches!(ch, '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(ch);
            }
            if term.contains('%') {
                pattern
            } else {
                format!("%{pattern}%")
            }
        }
        _ => term.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
