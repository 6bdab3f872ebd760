/*
 * value.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! Value descriptors.
//!
//! Each `val[N]` attribute, together with its `match[N]`, `notMatch[N]`,
//! `replace[N]`, `format[N]`, `map[N]`, `aggregate[N]`, `required[N]`,
//! `action[N]`, `as[N]` and `lang[N]` modifiers, describes one value slot of
//! an element. Resolving a descriptor runs its path through the pipeline
//!
//! ```text
//! path -> filter -> format -> map -> aggregate
//! ```
//!
//! and leaves the surviving values on the descriptor for insertion.

use crate::context::EvalContext;
use crate::error::{PathError, TemplateResult, ValueError};
use crate::format::FormatDescriptor;
use crate::path::{PathExpr, expand_predicate};
use crate::printf::Printf;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use oaipmh_graph::Term;
use oaipmh_xml::XmlElement;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use std::cmp::Ordering;

/// Characters escaped by `format="U:"`: everything except RFC 3986
/// unreserved characters.
pub(crate) const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Per-slot attribute names, without the slot suffix.
const SLOT_ATTRIBUTES: [&str; 11] = [
    "val", "match", "notMatch", "replace", "format", "map", "aggregate", "required", "action",
    "as", "lang",
];

/// A resolved value with its language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangValue {
    pub value: String,
    pub lang: Option<String>,
}

impl LangValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: None,
        }
    }

    pub fn with_lang(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: Some(lang.into()),
        }
    }
}

impl From<Term> for LangValue {
    fn from(term: Term) -> Self {
        match term {
            Term::Literal { value, lang } => Self { value, lang },
            Term::Iri(iri) => Self::new(iri),
            Term::Blank(label) => Self::new(label),
        }
    }
}

/// How a value is written into its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Append,
    Overwrite,
}

/// Where a value is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertMode {
    /// As the element's text content.
    Text,
    /// Parsed as an XML fragment and inserted as child nodes.
    Xml,
    /// Into the named attribute.
    Attribute(String),
}

/// When the value's language is written to the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangPolicy {
    /// Never.
    Skip,
    /// Only if the element has no language yet.
    IfEmpty,
    /// Always.
    Overwrite,
}

/// Value reformatting (`format[N]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSpec {
    /// `D:<pattern>`: parse a date/time and reformat it with a strftime
    /// pattern.
    Date(String),
    /// `U:`: percent-encode.
    UrlEncode,
    /// `<conversion>:<flags>`: printf-style formatting.
    Printf(Printf),
}

impl FormatSpec {
    pub fn parse(text: &str) -> Result<Self, ValueError> {
        let invalid = |message: &str| ValueError::InvalidFormat {
            format: text.to_string(),
            message: message.to_string(),
        };

        if let Some(pattern) = text.strip_prefix("D:") {
            if pattern.is_empty() {
                return Err(invalid("missing date pattern"));
            }
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(invalid("invalid date pattern"));
            }
            return Ok(FormatSpec::Date(pattern.to_string()));
        }
        if text == "U:" {
            return Ok(FormatSpec::UrlEncode);
        }

        let (conversion, flags) = text
            .split_once(':')
            .ok_or_else(|| invalid("expected <conversion>:<flags>"))?;
        let mut chars = conversion.chars();
        match (chars.next(), chars.next()) {
            (Some(conversion), None) => Printf::new(conversion, flags)
                .map(FormatSpec::Printf)
                .ok_or_else(|| invalid("unknown conversion or malformed flags")),
            _ => Err(invalid("expected a single conversion character")),
        }
    }

    /// Reformat a value. `None` drops it.
    pub fn apply(&self, value: &str) -> Option<String> {
        match self {
            FormatSpec::Date(pattern) => {
                parse_datetime(value).map(|dt| dt.format(pattern).to_string())
            }
            FormatSpec::UrlEncode => Some(utf8_percent_encode(value, URL_COMPONENT).to_string()),
            FormatSpec::Printf(printf) => printf.apply(value),
        }
    }
}

/// Value mapping (`map[N]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapSpec {
    /// A static table of the format.
    Table(String),
    /// Fetch the value as a URL and take the objects of this predicate.
    Remote(String),
}

impl MapSpec {
    pub fn parse(text: &str, format: &FormatDescriptor) -> Result<Self, ValueError> {
        let text = text.trim();
        if let Some(predicate) = text.strip_prefix('/') {
            return Ok(MapSpec::Remote(expand_predicate(predicate, &format.prefixes)?));
        }
        if !format.value_maps.contains_key(text) {
            return Err(ValueError::UnknownValueMap {
                name: text.to_string(),
            });
        }
        Ok(MapSpec::Table(text.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateKind {
    #[default]
    None,
    Min,
    Max,
}

/// Value aggregation (`aggregate[N]`): `none`, `min`, `max`, optionally
/// with a preferred language (`max,en`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateSpec {
    pub kind: AggregateKind,
    pub lang: Option<String>,
}

impl AggregateSpec {
    pub fn parse(text: &str) -> Result<Self, ValueError> {
        let (kind, lang) = match text.split_once(',') {
            Some((kind, lang)) => (kind.trim(), Some(lang.trim().to_lowercase())),
            None => (text.trim(), None),
        };
        let kind = match kind {
            "none" => AggregateKind::None,
            "min" => AggregateKind::Min,
            "max" => AggregateKind::Max,
            _ => {
                return Err(ValueError::InvalidAttribute {
                    attribute: "aggregate".to_string(),
                    value: text.to_string(),
                    expected: "none, min or max, optionally followed by ,<lang>".to_string(),
                });
            }
        };
        Ok(Self {
            kind,
            lang: lang.filter(|l| !l.is_empty()),
        })
    }

    pub fn is_active(&self) -> bool {
        self.kind != AggregateKind::None
    }

    /// Reduce to the single smallest or largest value, preferring values in
    /// the configured language when there are any.
    pub fn apply(&self, values: Vec<LangValue>) -> Vec<LangValue> {
        if !self.is_active() {
            return values;
        }
        let preferred: Vec<LangValue> = match &self.lang {
            Some(lang) => values
                .iter()
                .filter(|v| v.lang.as_deref() == Some(lang.as_str()))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        let pool = if preferred.is_empty() {
            values
        } else {
            preferred
        };

        let kind = self.kind;
        pool.into_iter()
            .reduce(|best, candidate| {
                let ord = compare_values(&candidate.value, &best.value);
                let better = match kind {
                    AggregateKind::Min => ord == Ordering::Less,
                    _ => ord == Ordering::Greater,
                };
                if better { candidate } else { best }
            })
            .into_iter()
            .collect()
    }
}

/// Numeric comparison when both sides are numbers, lexical otherwise.
pub(crate) fn compare_values(a: &str, b: &str) -> Ordering {
    if let (Ok(x), Ok(y)) = (a.trim().parse::<f64>(), b.trim().parse::<f64>())
        && let Some(ord) = x.partial_cmp(&y)
    {
        return ord;
    }
    a.cmp(b)
}

/// Date/time forms accepted by `format="D:..."`.
fn parse_datetime(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// The value slots of an element (`""`, `"0"`, `"1"`, ...) in processing
/// order: the bare `val` first, then ascending numeric suffix.
pub fn value_slots(element: &XmlElement) -> Vec<String> {
    let mut slots: Vec<String> = element
        .attributes
        .iter()
        .filter_map(|attr| attr.name.strip_prefix("val"))
        .filter(|suffix| suffix.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect();
    slots.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    slots
}

/// Whether `name` is a value-slot attribute (`val`, `format2`, `lang`, ...).
pub fn is_slot_attribute(name: &str) -> bool {
    SLOT_ATTRIBUTES.iter().any(|base| {
        name.strip_prefix(base)
            .is_some_and(|suffix| suffix.chars().all(|c| c.is_ascii_digit()))
    })
}

/// Drop slot attributes that no descriptor consumed, such as a `format`
/// without a `val`. Returns how many were removed.
pub fn strip_slot_attributes(element: &mut XmlElement) -> usize {
    let before = element.attributes.len();
    element.attributes.retain(|attr| !is_slot_attribute(&attr.name));
    before - element.attributes.len()
}

/// One value slot of an element.
#[derive(Debug, Clone)]
pub struct ValueDescriptor {
    /// Slot suffix (`""` for `val`, `"1"` for `val1`, ...).
    pub slot: String,
    pub path: PathExpr,
    pub matches: Option<Regex>,
    pub not_matches: Option<Regex>,
    pub replace: Option<String>,
    pub format: Option<FormatSpec>,
    pub map: Option<MapSpec>,
    pub aggregate: AggregateSpec,
    pub required: bool,
    pub action: Action,
    pub mode: InsertMode,
    pub lang: LangPolicy,
    /// Values left by the last [`resolve`](Self::resolve).
    pub values: Vec<LangValue>,
}

impl ValueDescriptor {
    /// Build the descriptor for `slot`, removing all of its attributes from
    /// the element. The attributes are removed even if parsing fails.
    pub fn from_element(
        element: &mut XmlElement,
        slot: &str,
        format: &FormatDescriptor,
    ) -> Result<Self, ValueError> {
        let [val, matches, not_matches, replace, fmt, map, aggregate, required, action, mode, lang] =
            SLOT_ATTRIBUTES.map(|base| element.remove_attribute(&format!("{}{}", base, slot)));
        let attribute = |base: &str| format!("{}{}", base, slot);
        let invalid = |base: &str, value: &str, expected: &str| ValueError::InvalidAttribute {
            attribute: attribute(base),
            value: value.to_string(),
            expected: expected.to_string(),
        };
        let regex = |base: &str, pattern: Option<String>| -> Result<Option<Regex>, ValueError> {
            pattern
                .map(|p| {
                    Regex::new(&p).map_err(|e| ValueError::InvalidRegex {
                        attribute: attribute(base),
                        message: e.to_string(),
                    })
                })
                .transpose()
        };

        let path = PathExpr::parse(val.as_deref().ok_or(PathError::Empty)?, &format.prefixes)?;
        let matches = regex("match", matches)?;
        let not_matches = regex("notMatch", not_matches)?;
        if replace.is_some() && matches.is_none() {
            return Err(ValueError::MissingDependency {
                attribute: attribute("replace"),
                requires: attribute("match"),
            });
        }

        let required = match required.as_deref() {
            None | Some("optional") => false,
            Some("required") => true,
            Some(other) => return Err(invalid("required", other, "required or optional")),
        };
        let action = match action.as_deref() {
            None | Some("overwrite") => Action::Overwrite,
            Some("append") => Action::Append,
            Some(other) => return Err(invalid("action", other, "append or overwrite")),
        };
        let mode = match mode.as_deref() {
            None | Some("text") => InsertMode::Text,
            Some("xml") => InsertMode::Xml,
            Some(other) => match other.strip_prefix('@') {
                Some(name) if !name.is_empty() => InsertMode::Attribute(name.to_string()),
                _ => return Err(invalid("as", other, "text, xml or @attribute")),
            },
        };
        let lang = match lang.as_deref() {
            None | Some("if empty") => LangPolicy::IfEmpty,
            Some("skip") => LangPolicy::Skip,
            Some("overwrite") => LangPolicy::Overwrite,
            Some(other) => return Err(invalid("lang", other, "skip, if empty or overwrite")),
        };

        Ok(Self {
            slot: slot.to_string(),
            path,
            matches,
            not_matches,
            replace,
            format: fmt.as_deref().map(FormatSpec::parse).transpose()?,
            map: map.as_deref().map(|m| MapSpec::parse(m, format)).transpose()?,
            aggregate: aggregate
                .as_deref()
                .map(AggregateSpec::parse)
                .transpose()?
                .unwrap_or_default(),
            required,
            action,
            mode,
            lang,
            values: Vec::new(),
        })
    }

    /// Evaluate the path at the current node and run the pipeline.
    pub fn resolve(&mut self, ctx: &mut EvalContext) -> TemplateResult<()> {
        let terms = self.path.resolve(ctx)?;
        self.values = self.apply(terms, ctx);
        Ok(())
    }

    /// Run the filter, format, map and aggregate stages over `terms`.
    pub fn apply(&self, terms: Vec<Term>, ctx: &EvalContext) -> Vec<LangValue> {
        let values: Vec<LangValue> = terms
            .into_iter()
            .map(LangValue::from)
            .filter_map(|v| self.filter(v))
            .filter_map(|v| self.reformat(v))
            .collect();
        let values = self.map_values(values, ctx);
        self.aggregate.apply(values)
    }

    /// Number of insertions this descriptor contributes.
    pub fn count(&self) -> usize {
        if self.aggregate.is_active() {
            self.values.len().min(1)
        } else {
            self.values.len()
        }
    }

    /// A required descriptor must have at least one value.
    pub fn is_valid(&self) -> bool {
        !self.values.is_empty() || !self.required
    }

    fn filter(&self, mut value: LangValue) -> Option<LangValue> {
        if let Some(re) = &self.not_matches
            && re.is_match(&value.value)
        {
            return None;
        }
        if let Some(re) = &self.matches {
            if !re.is_match(&value.value) {
                return None;
            }
            if let Some(replacement) = &self.replace {
                value.value = re.replace_all(&value.value, replacement.as_str()).into_owned();
            }
        }
        Some(value)
    }

    fn reformat(&self, value: LangValue) -> Option<LangValue> {
        match &self.format {
            None => Some(value),
            Some(spec) => spec.apply(&value.value).map(|formatted| LangValue {
                value: formatted,
                lang: value.lang,
            }),
        }
    }

    fn map_values(&self, values: Vec<LangValue>, ctx: &EvalContext) -> Vec<LangValue> {
        let Some(spec) = &self.map else {
            return values;
        };
        let tables = &ctx.format.value_maps;
        values
            .into_iter()
            .flat_map(|value| {
                let mapped = ctx.vocabulary.resolve(&value.value, spec, tables);
                match spec {
                    // static tables translate the value but keep its language
                    MapSpec::Table(_) => mapped
                        .into_iter()
                        .map(|m| LangValue {
                            value: m.value,
                            lang: value.lang.clone(),
                        })
                        .collect::<Vec<_>>(),
                    MapSpec::Remote(_) => mapped,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EX, Fixture};
    use pretty_assertions::assert_eq;

    fn descriptor(xml: &str, fixture: &Fixture) -> (ValueDescriptor, XmlElement) {
        let mut element = oaipmh_xml::parse(xml).unwrap();
        let d = ValueDescriptor::from_element(&mut element, "", &fixture.format).unwrap();
        (d, element)
    }

    fn values(d: &ValueDescriptor) -> Vec<&str> {
        d.values.iter().map(|v| v.value.as_str()).collect()
    }

    #[test]
    fn test_slots_order() {
        let element =
            oaipmh_xml::parse(r#"<e val10="/ex:a" val1="/ex:b" val="/ex:c" value="x" val2="/ex:d"/>"#)
                .unwrap();
        assert_eq!(value_slots(&element), vec!["", "1", "2", "10"]);
    }

    #[test]
    fn test_from_element_strips_slot_attributes() {
        let fixture = Fixture::new(&[]);
        let mut element = oaipmh_xml::parse(
            r#"<e val1="/ex:title" required1="required" as1="@title" lang="de" id="x"/>"#,
        )
        .unwrap();
        let d = ValueDescriptor::from_element(&mut element, "1", &fixture.format).unwrap();
        assert!(d.required);
        assert_eq!(d.mode, InsertMode::Attribute("title".to_string()));
        // other slots' attributes stay until the orphan sweep
        assert_eq!(element.get_attribute("lang"), Some("de"));
        assert_eq!(element.get_attribute("id"), Some("x"));
        assert!(!element.has_attribute("val1"));
        assert!(!element.has_attribute("required1"));

        assert_eq!(strip_slot_attributes(&mut element), 1);
        assert!(!element.has_attribute("lang"));
        assert_eq!(element.get_attribute("id"), Some("x"));
    }

    #[test]
    fn test_slot_attribute_names() {
        for name in ["val", "val3", "notMatch", "format12", "as", "lang0", "required"] {
            assert!(is_slot_attribute(name), "{}", name);
        }
        for name in ["id", "xml:lang", "value", "format_x", "as1a", "href", "foreach"] {
            assert!(!is_slot_attribute(name), "{}", name);
        }
    }

    #[test]
    fn test_from_element_strips_on_error() {
        let fixture = Fixture::new(&[]);
        let mut element =
            oaipmh_xml::parse(r#"<e val="/ex:title" replace="x" format="D:"/>"#).unwrap();
        let err = ValueDescriptor::from_element(&mut element, "", &fixture.format).unwrap_err();
        assert!(matches!(err, ValueError::MissingDependency { .. }));
        assert!(element.attributes.is_empty());
    }

    #[test]
    fn test_invalid_modifiers() {
        let fixture = Fixture::new(&[]);
        for xml in [
            r#"<e val="/ex:a" required="yes"/>"#,
            r#"<e val="/ex:a" action="prepend"/>"#,
            r#"<e val="/ex:a" as="@"/>"#,
            r#"<e val="/ex:a" lang="always"/>"#,
            r#"<e val="/ex:a" aggregate="avg"/>"#,
            r#"<e val="/ex:a" format="D:%Q"/>"#,
            r#"<e val="/ex:a" format="q:"/>"#,
            r#"<e val="/ex:a" map="nosuchtable"/>"#,
            r#"<e val="/ex:a" match="("/>"#,
            r#"<e val="/zz:a"/>"#,
        ] {
            let mut element = oaipmh_xml::parse(xml).unwrap();
            assert!(
                ValueDescriptor::from_element(&mut element, "", &fixture.format).is_err(),
                "expected error for {}",
                xml
            );
        }
    }

    #[test]
    fn test_filter_and_replace() {
        let fixture = Fixture::new(&[
            ("r", "id", Term::literal("https://hdl.handle.net/21.11115/0000-000C")),
            ("r", "id", Term::literal("https://id.example.org/123")),
            ("r", "id", Term::literal("https://id.example.org/internal/9")),
        ]);
        let mut ctx = fixture.ctx();
        let (mut d, _) = descriptor(
            r#"<e val="/ex:id" match="^https://id[.]example[.]org/(.*)$" notMatch="internal" replace="ID-$1"/>"#,
            &fixture,
        );
        d.resolve(&mut ctx).unwrap();
        assert_eq!(values(&d), vec!["ID-123"]);
    }

    #[test]
    fn test_date_format() {
        let fixture = Fixture::new(&[
            ("r", "date", Term::literal("2021-03-04T10:20:30+01:00")),
            ("r", "date", Term::literal("2020-12-31")),
            ("r", "date", Term::literal("not a date")),
        ]);
        let mut ctx = fixture.ctx();
        let (mut d, _) = descriptor(r#"<e val="/ex:date" format="D:%Y-%m-%d"/>"#, &fixture);
        d.resolve(&mut ctx).unwrap();
        assert_eq!(values(&d), vec!["2020-12-31", "2021-03-04"]);
    }

    #[test]
    fn test_url_and_printf_format() {
        let fixture = Fixture::new(&[
            ("r", "name", Term::literal("a b/c")),
            ("r", "size", Term::literal("42")),
            ("r", "size", Term::literal("n/a")),
        ]);
        let mut ctx = fixture.ctx();

        let (mut d, _) = descriptor(r#"<e val="/ex:name" format="U:"/>"#, &fixture);
        d.resolve(&mut ctx).unwrap();
        assert_eq!(values(&d), vec!["a%20b%2Fc"]);

        let (mut d, _) = descriptor(r#"<e val="/ex:size" format="d:05"/>"#, &fixture);
        d.resolve(&mut ctx).unwrap();
        assert_eq!(values(&d), vec!["00042"]);
    }

    #[test]
    fn test_static_map_keeps_language() {
        let fixture = Fixture::new(&[
            ("r", "language", Term::lang_literal("de", "en")),
            ("r", "language", Term::literal("xx")),
        ]);
        let mut ctx = fixture.ctx();
        let (mut d, _) = descriptor(r#"<e val="/ex:language" map="languages"/>"#, &fixture);
        d.resolve(&mut ctx).unwrap();
        assert_eq!(d.values, vec![LangValue::with_lang("deu", "en")]);
    }

    #[test]
    fn test_aggregate_language_preference() {
        let fixture = Fixture::new(&[
            ("r", "title", Term::lang_literal("A", "en")),
            ("r", "title", Term::lang_literal("B", "de")),
            ("r", "title", Term::lang_literal("C", "en")),
        ]);
        let mut ctx = fixture.ctx();

        let (mut d, _) = descriptor(r#"<e val="/ex:title" aggregate="max,en"/>"#, &fixture);
        d.resolve(&mut ctx).unwrap();
        assert_eq!(d.values, vec![LangValue::with_lang("C", "en")]);

        let (mut d, _) = descriptor(r#"<e val="/ex:title" aggregate="min,de"/>"#, &fixture);
        d.resolve(&mut ctx).unwrap();
        assert_eq!(d.values, vec![LangValue::with_lang("B", "de")]);

        // no value in the preferred language: aggregate over all
        let (mut d, _) = descriptor(r#"<e val="/ex:title" aggregate="min,fr"/>"#, &fixture);
        d.resolve(&mut ctx).unwrap();
        assert_eq!(d.values, vec![LangValue::with_lang("A", "en")]);
        assert_eq!(d.count(), 1);
    }

    #[test]
    fn test_aggregate_compares_numbers_numerically() {
        let spec = AggregateSpec::parse("max").unwrap();
        let result = spec.apply(vec![LangValue::new("9"), LangValue::new("10"), LangValue::new("2")]);
        assert_eq!(result, vec![LangValue::new("10")]);
    }

    #[test]
    fn test_count_and_validity() {
        let fixture = Fixture::new(&[
            ("r", "title", Term::literal("A")),
            ("r", "title", Term::literal("B")),
        ]);
        let mut ctx = fixture.ctx();

        let (mut d, _) = descriptor(r#"<e val="/ex:title"/>"#, &fixture);
        d.resolve(&mut ctx).unwrap();
        assert_eq!(d.count(), 2);
        assert!(d.is_valid());

        let (mut d, _) = descriptor(r#"<e val="/ex:missing" required="required"/>"#, &fixture);
        d.resolve(&mut ctx).unwrap();
        assert_eq!(d.count(), 0);
        assert!(!d.is_valid());

        let (mut d, _) = descriptor(r#"<e val="/ex:missing"/>"#, &fixture);
        d.resolve(&mut ctx).unwrap();
        assert!(d.is_valid());
    }

    #[test]
    fn test_literal_path() {
        let fixture = Fixture::new(&[]);
        let mut ctx = fixture.ctx();
        let (mut d, _) = descriptor(&format!(r#"<e val="={}x"/>"#, EX), &fixture);
        d.resolve(&mut ctx).unwrap();
        assert_eq!(values(&d), vec!["https://example.org/x"]);
    }
}
