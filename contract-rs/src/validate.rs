//! Validation engine.
//!
//! Walks an input against a definition and accumulates every mismatch as an
//! [`Issue`]. Validation never fails and never stops at the first problem.
//!
//! Paths use wire keys (declared renames, then the namespace key case) so
//! pointers address the failing value in the payload the client sent.
//! Unknown keys are reported verbatim. The returned params use domain names.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::coerce::{is_uuid, parse_date, parse_datetime, parse_time};
use crate::ir::{
    ArrayItems, EnumValues, ObjectShape, ParamDefinition, ScalarKind, StringFormat, TypeKind,
};
use crate::issue::{number_value, pointer, Issue, IssueCode, IssueCollection, PathSegment};
use crate::pipeline::keys::MAX_DEPTH;
use crate::pipeline::KeyCase;
use crate::registry::{Scope, ScopedRegistry, TypeRegistry};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"));

static URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:[^\s]+$").expect("static regex"));

/// Result of validating one input.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// Best-effort params with domain names and defaults filled in
    pub params: Value,
    pub issues: IssueCollection,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate `input` against `def` as seen from `scope`, with keys as declared.
pub fn validate(
    registry: &TypeRegistry,
    scope: &Scope,
    input: &Value,
    def: &ParamDefinition,
) -> ValidationOutcome {
    Validator::new(registry.scoped(scope), KeyCase::Preserve).validate(input, def)
}

/// Validates payloads against definitions resolved through a registry view.
pub struct Validator<'a> {
    view: ScopedRegistry<'a>,
    key_case: KeyCase,
}

impl<'a> Validator<'a> {
    pub fn new(view: ScopedRegistry<'a>, key_case: KeyCase) -> Self {
        Self { view, key_case }
    }

    /// Validate `input`; always returns, possibly with an empty issue list.
    pub fn validate(&self, input: &Value, def: &ParamDefinition) -> ValidationOutcome {
        let mut path = Vec::new();
        let mut issues = Vec::new();
        let params = self.node(input, def, &mut path, &mut issues, 0);

        if issues.is_empty() {
            trace!("Validation passed");
        } else {
            let pointers: Vec<_> = issues.iter().map(|i| i.pointer.as_str()).collect();
            debug!(
                issue_count = issues.len(),
                pointers = ?pointers,
                "Validation failed"
            );
        }

        ValidationOutcome {
            params,
            issues: IssueCollection::from(issues),
        }
    }

    fn node(
        &self,
        input: &Value,
        def: &ParamDefinition,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<Issue>,
        depth: usize,
    ) -> Value {
        if depth > MAX_DEPTH {
            issues.push(
                Issue::new(IssueCode::ValueInvalid, path.clone()).with_detail("is nested too deeply"),
            );
            return Value::Null;
        }

        if input.is_null() {
            let accepts_null = def.nullable
                || matches!(&def.kind, TypeKind::Literal { value } if value.is_null());
            if accepts_null {
                return Value::Null;
            }
            // References and untagged unions defer to their targets and variants.
            if !matches!(
                def.kind,
                TypeKind::Reference { .. } | TypeKind::Union { discriminator: None, .. }
            ) {
                issues.push(
                    Issue::invalid(path.clone(), def.kind.name()).with_detail("must not be null"),
                );
                return Value::Null;
            }
        }

        match &def.kind {
            TypeKind::Reference { to } => match self.view.resolve(to) {
                Ok(target) => self.node(input, &target.definition, path, issues, depth + 1),
                Err(err) => {
                    warn!(
                        error = %err,
                        pointer = %pointer(path.as_slice()),
                        "Unresolved reference during validation"
                    );
                    issues.push(Issue::invalid(path.clone(), to));
                    input.clone()
                }
            },
            TypeKind::Object { shape } => self.object(input, shape, path, issues, depth),
            TypeKind::Array { items } => self.array(input, def, items, path, issues, depth),
            TypeKind::Union {
                discriminator: Some(key),
                variants,
            } => {
                let Some(map) = input.as_object() else {
                    issues.push(Issue::invalid(path.clone(), "object"));
                    return input.clone();
                };

                let wire_key = self.key_case.apply(key);
                path.push(PathSegment::Key(wire_key.clone()));
                let tag = match map.get(&wire_key) {
                    None => {
                        issues.push(Issue::required(path.clone()));
                        path.pop();
                        return input.clone();
                    }
                    Some(tag) => tag,
                };
                let Some(variant) = variants
                    .iter()
                    .find(|v| v.tag.is_some() && v.tag.as_deref() == tag.as_str())
                else {
                    let allowed: Vec<String> = variants.iter().filter_map(|v| v.tag.clone()).collect();
                    issues.push(Issue::enum_invalid(path.clone(), &allowed));
                    path.pop();
                    return input.clone();
                };
                let tag_path = path.clone();
                path.pop();

                let mut variant_issues = Vec::new();
                let mut params =
                    self.node(input, &variant.definition, path, &mut variant_issues, depth + 1);
                issues.extend(variant_issues.into_iter().filter(|issue| {
                    !(issue.code == IssueCode::FieldUnknown && issue.path == tag_path)
                }));
                if let Value::Object(params) = &mut params {
                    params.entry(key.clone()).or_insert_with(|| tag.clone());
                }
                params
            }
            TypeKind::Union {
                discriminator: None,
                variants,
            } => {
                for variant in variants {
                    let mut trial = Vec::new();
                    let params = self.node(input, &variant.definition, path, &mut trial, depth + 1);
                    if trial.is_empty() {
                        return params;
                    }
                }
                let expected: Vec<&str> = variants.iter().map(|v| v.definition.kind.name()).collect();
                issues.push(
                    Issue::new(IssueCode::ValueInvalid, path.clone())
                        .with_detail("does not match any allowed type")
                        .with_meta("expected", "union")
                        .with_meta("variants", expected),
                );
                input.clone()
            }
            TypeKind::Literal { value } => {
                if input != value {
                    issues.push(
                        Issue::new(IssueCode::ValueInvalid, path.clone())
                            .with_detail(format!("must equal {value}"))
                            .with_meta("expected", value.clone()),
                    );
                }
                input.clone()
            }
            kind => match kind.scalar() {
                Some(scalar) => self.scalar(input, def, scalar, path, issues),
                None => input.clone(),
            },
        }
    }

    fn object(
        &self,
        input: &Value,
        shape: &ObjectShape,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<Issue>,
        depth: usize,
    ) -> Value {
        let Some(map) = input.as_object() else {
            issues.push(Issue::invalid(path.clone(), "object"));
            return input.clone();
        };

        let mut params = Map::new();
        let mut known = BTreeSet::new();

        for field in &shape.fields {
            let wire = self.key_case.wire_name(field);
            path.push(PathSegment::Key(wire.clone()));
            match map.get(&wire) {
                Some(value) => {
                    trace!(field = %field.name, wire = %wire, "Validating field");
                    let validated = self.node(value, &field.definition, path, issues, depth + 1);
                    params.insert(field.name.clone(), validated);
                }
                None => {
                    if let Some(default) = &field.definition.default {
                        params.insert(field.name.clone(), default.clone());
                    } else if !field.definition.optional {
                        issues.push(Issue::required(path.clone()));
                    }
                }
            }
            path.pop();
            known.insert(wire);
        }

        for key in map.keys() {
            if !known.contains(key) {
                path.push(PathSegment::Key(key.clone()));
                issues.push(Issue::unknown_field(path.clone()));
                path.pop();
            }
        }

        Value::Object(params)
    }

    fn array(
        &self,
        input: &Value,
        def: &ParamDefinition,
        items: &ArrayItems,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<Issue>,
        depth: usize,
    ) -> Value {
        let Some(elements) = input.as_array() else {
            issues.push(Issue::invalid(path.clone(), "array"));
            return input.clone();
        };

        let count = elements.len() as f64;
        if let Some(min) = def.min.filter(|min| count < *min) {
            issues.push(
                Issue::new(IssueCode::ValueInvalid, path.clone())
                    .with_detail(format!("must contain at least {} items", number_value(min)))
                    .with_meta("minimum", number_value(min))
                    .with_meta("constraint", "min_items"),
            );
        }
        if let Some(max) = def.max.filter(|max| count > *max) {
            issues.push(
                Issue::new(IssueCode::ValueInvalid, path.clone())
                    .with_detail(format!("must contain at most {} items", number_value(max)))
                    .with_meta("maximum", number_value(max))
                    .with_meta("constraint", "max_items"),
            );
        }

        let params = elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                path.push(PathSegment::Index(index));
                let validated = match items {
                    ArrayItems::Of(of) => self.node(element, of, path, issues, depth + 1),
                    ArrayItems::Shape(shape) => self.object(element, shape, path, issues, depth + 1),
                };
                path.pop();
                validated
            })
            .collect();

        Value::Array(params)
    }

    fn scalar(
        &self,
        input: &Value,
        def: &ParamDefinition,
        kind: ScalarKind,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<Issue>,
    ) -> Value {
        let type_ok = match kind {
            ScalarKind::String => input.is_string(),
            ScalarKind::Integer => input.is_i64() || input.is_u64(),
            ScalarKind::Float | ScalarKind::Decimal => input.is_number(),
            ScalarKind::Boolean => input.is_boolean(),
            ScalarKind::Date => input.as_str().is_some_and(parse_date),
            ScalarKind::Datetime => input.as_str().is_some_and(parse_datetime),
            ScalarKind::Time => input.as_str().is_some_and(parse_time),
            ScalarKind::Uuid => input.as_str().is_some_and(is_uuid),
            ScalarKind::Unknown => true,
        };
        if !type_ok {
            issues.push(Issue::invalid(path.clone(), kind.as_str()));
            return input.clone();
        }

        if kind.is_numeric() {
            if let Some(n) = input.as_f64() {
                if let Some(min) = def.min.filter(|min| n < *min) {
                    issues.push(Issue::number_too_small(path.clone(), min));
                }
                if let Some(max) = def.max.filter(|max| n > *max) {
                    issues.push(Issue::number_too_large(path.clone(), max));
                }
            }
        }

        if let Some(s) = input.as_str() {
            if kind == ScalarKind::String {
                let length = s.chars().count() as f64;
                if let Some(min) = def.min.filter(|min| length < *min) {
                    issues.push(Issue::string_too_short(path.clone(), min));
                }
                if let Some(max) = def.max.filter(|max| length > *max) {
                    issues.push(Issue::string_too_long(path.clone(), max));
                }
            }
            if let Some(format) = &def.format {
                if !format_matches(format, s) {
                    let issue = Issue::format_invalid(path.clone(), format.name());
                    issues.push(match format {
                        StringFormat::Pattern(pattern) => issue.with_meta("pattern", pattern.clone()),
                        _ => issue,
                    });
                }
            }
        }

        if let Some(values) = &def.enum_values {
            let allowed = match values {
                EnumValues::Inline(values) => Some(values.as_slice()),
                EnumValues::Named(name) => match self.view.enum_values(name) {
                    Ok(values) => Some(values),
                    Err(err) => {
                        warn!(error = %err, "Enum values unavailable, skipping check");
                        None
                    }
                },
            };
            if let Some(allowed) = allowed {
                let candidate = match input.as_str() {
                    Some(s) => s.to_string(),
                    None => input.to_string(),
                };
                if !allowed.contains(&candidate) {
                    issues.push(Issue::enum_invalid(path.clone(), allowed));
                }
            }
        }

        input.clone()
    }
}

/// Whether `s` satisfies `format`.
pub fn format_matches(format: &StringFormat, s: &str) -> bool {
    match format {
        StringFormat::Email => EMAIL.is_match(s),
        StringFormat::Uri => URI.is_match(s),
        StringFormat::Uuid => is_uuid(s),
        StringFormat::Date => parse_date(s),
        StringFormat::Datetime => parse_datetime(s),
        StringFormat::Ipv4 => s.parse::<std::net::Ipv4Addr>().is_ok(),
        StringFormat::Ipv6 => s.parse::<std::net::Ipv6Addr>().is_ok(),
        StringFormat::Pattern(pattern) => pattern_matches(pattern, s),
    }
}

/// Compiled `pattern` formats, `None` for patterns that do not compile.
static PATTERNS: Lazy<RwLock<HashMap<String, Option<Regex>>>> = Lazy::new(Default::default);

/// Invalid patterns are skipped with a single warning.
fn pattern_matches(pattern: &str, s: &str) -> bool {
    let cached = PATTERNS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(pattern)
        .map(|compiled| compiled.as_ref().map_or(true, |re| re.is_match(s)));
    if let Some(matched) = cached {
        return matched;
    }

    let compiled = Regex::new(pattern)
        .map_err(|err| warn!(pattern = %pattern, error = %err, "Invalid pattern, skipping check"))
        .ok();
    let matched = compiled.as_ref().map_or(true, |re| re.is_match(s));
    PATTERNS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(pattern.to_string(), compiled);
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, TypeDef, UnionVariant};
    use serde_json::json;

    fn invoice() -> ParamDefinition {
        ParamDefinition::object(vec![
            Field::new("number", ParamDefinition::string()),
            Field::new("notes", ParamDefinition::string().nullable().optional()),
            Field::new("status", ParamDefinition::enumeration(["draft", "sent", "paid"])),
        ])
    }

    fn check(input: Value, def: &ParamDefinition) -> ValidationOutcome {
        validate(&TypeRegistry::new(), &Scope::Global, &input, def)
    }

    fn pointers(outcome: &ValidationOutcome) -> Vec<String> {
        outcome.issues.iter().map(|i| i.pointer.clone()).collect()
    }

    // =========================================================================
    // Object tests
    // =========================================================================

    #[test]
    fn test_valid_input() {
        let input = json!({ "number": "INV-1", "notes": null, "status": "draft" });
        let outcome = check(input.clone(), &invoice());
        assert!(outcome.is_valid());
        assert_eq!(outcome.params, input);
    }

    #[test]
    fn test_enum_invalid_scenario() {
        let outcome = check(json!({ "number": "INV-1", "status": "bogus" }), &invoice());
        assert_eq!(outcome.issues.len(), 1);
        let issue = &outcome.issues.issues[0];
        assert_eq!(issue.code, IssueCode::EnumInvalid);
        assert_eq!(issue.pointer, "/status");
        assert_eq!(outcome.params["number"], json!("INV-1"));
    }

    #[test]
    fn test_missing_required() {
        let outcome = check(json!({ "status": "sent" }), &invoice());
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues.issues[0].code, IssueCode::Required);
        assert_eq!(outcome.issues.issues[0].pointer, "/number");
    }

    #[test]
    fn test_unknown_field() {
        let outcome = check(
            json!({ "number": "1", "status": "paid", "a/b": 1 }),
            &invoice(),
        );
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues.issues[0].code, IssueCode::FieldUnknown);
        assert_eq!(outcome.issues.issues[0].pointer, "/a~1b");
    }

    #[test]
    fn test_optional_and_nullable_are_independent() {
        let def = ParamDefinition::object(vec![
            Field::new("required_nullable", ParamDefinition::string().nullable()),
            Field::new("optional_strict", ParamDefinition::string().optional()),
        ]);

        assert!(check(json!({ "required_nullable": null }), &def).is_valid());

        let missing = check(json!({}), &def);
        assert_eq!(pointers(&missing), vec!["/required_nullable"]);

        let null_optional = check(
            json!({ "required_nullable": "x", "optional_strict": null }),
            &def,
        );
        assert_eq!(null_optional.issues.issues[0].code, IssueCode::ValueInvalid);
        assert_eq!(null_optional.issues.issues[0].pointer, "/optional_strict");
    }

    #[test]
    fn test_accumulates_all_issues() {
        let def = ParamDefinition::object(vec![
            Field::new("quantity", ParamDefinition::integer().with_min(1.0)),
            Field::new("code", ParamDefinition::string().with_max(3.0)),
            Field::new("email", ParamDefinition::string().with_format(StringFormat::Email)),
        ]);

        let outcome = check(
            json!({ "quantity": 0, "code": "ABCD", "email": "nope" }),
            &def,
        );
        let codes: Vec<_> = outcome.issues.iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            vec![
                IssueCode::NumberTooSmall,
                IssueCode::StringTooLong,
                IssueCode::StringFormatInvalid
            ]
        );
        assert_eq!(outcome.issues.issues[0].meta["minimum"], json!(1));
    }

    #[test]
    fn test_defaults_filled() {
        let def = ParamDefinition::object(vec![Field::new(
            "per_page",
            ParamDefinition::integer().with_default(25),
        )]);
        let outcome = check(json!({}), &def);
        assert!(outcome.is_valid());
        assert_eq!(outcome.params, json!({ "per_page": 25 }));
    }

    #[test]
    fn test_wire_keys_in_paths_and_domain_keys_in_params() {
        let def = ParamDefinition::object(vec![
            Field::new("due_date", ParamDefinition::date()),
            Field::new("line_items", ParamDefinition::array_of(ParamDefinition::integer())),
        ]);
        let registry = TypeRegistry::new();
        let validator = Validator::new(registry.scoped(&Scope::Global), KeyCase::Camel);

        let outcome = validator.validate(
            &json!({ "dueDate": "2024-01-01", "lineItems": [1, "x"] }),
            &def,
        );
        assert_eq!(pointers(&outcome), vec!["/lineItems/1"]);
        assert_eq!(outcome.params["due_date"], json!("2024-01-01"));
    }

    // =========================================================================
    // Array tests
    // =========================================================================

    #[test]
    fn test_array_index_paths() {
        let def = ParamDefinition::object(vec![Field::new(
            "items",
            ParamDefinition::array_of_shape(vec![Field::new("name", ParamDefinition::string())]),
        )]);
        let outcome = check(json!({ "items": [{ "name": "a" }, {}] }), &def);
        assert_eq!(pointers(&outcome), vec!["/items/1/name"]);
    }

    #[test]
    fn test_array_bounds() {
        let def = ParamDefinition::array_of(ParamDefinition::string()).with_min(1.0);
        let outcome = check(json!([]), &def);
        assert_eq!(outcome.issues.issues[0].meta["constraint"], json!("min_items"));
        assert_eq!(outcome.issues.issues[0].pointer, "");
    }

    // =========================================================================
    // Union tests
    // =========================================================================

    fn operations() -> ParamDefinition {
        ParamDefinition::tagged_union(
            "operation",
            vec![
                UnionVariant::tagged(
                    "create",
                    ParamDefinition::object(vec![
                        Field::new("operation", ParamDefinition::literal("create")),
                        Field::new("name", ParamDefinition::string()),
                    ]),
                ),
                UnionVariant::tagged(
                    "delete",
                    ParamDefinition::object(vec![
                        Field::new("operation", ParamDefinition::literal("delete")),
                        Field::new("id", ParamDefinition::integer()),
                    ]),
                ),
            ],
        )
    }

    #[test]
    fn test_tagged_union_selects_variant() {
        assert!(check(json!({ "operation": "delete", "id": 3 }), &operations()).is_valid());

        let outcome = check(
            json!({ "operation": "delete", "id": 3, "name": "x" }),
            &operations(),
        );
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues.issues[0].code, IssueCode::FieldUnknown);
        assert_eq!(outcome.issues.issues[0].pointer, "/name");
    }

    #[test]
    fn test_tagged_union_missing_and_unknown_tag() {
        let missing = check(json!({ "id": 3 }), &operations());
        assert_eq!(missing.issues.issues[0].code, IssueCode::Required);
        assert_eq!(missing.issues.issues[0].pointer, "/operation");

        let unknown = check(json!({ "operation": "merge" }), &operations());
        assert_eq!(unknown.issues.issues[0].code, IssueCode::EnumInvalid);
        assert_eq!(
            unknown.issues.issues[0].meta["allowed"],
            json!(["create", "delete"])
        );
    }

    #[test]
    fn test_tag_field_not_required_in_variant_shape() {
        let def = ParamDefinition::tagged_union(
            "kind",
            vec![UnionVariant::tagged(
                "card",
                ParamDefinition::object(vec![Field::new("last_four", ParamDefinition::string())]),
            )],
        );
        let outcome = check(json!({ "kind": "card", "last_four": "4242" }), &def);
        assert!(outcome.is_valid());
        assert_eq!(outcome.params["kind"], json!("card"));
    }

    #[test]
    fn test_untagged_union() {
        let def = ParamDefinition::union(vec![ParamDefinition::integer(), ParamDefinition::string()]);
        assert!(check(json!(5), &def).is_valid());
        assert!(check(json!("five"), &def).is_valid());

        let outcome = check(json!(true), &def);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues.issues[0].code, IssueCode::ValueInvalid);
    }

    #[test]
    fn test_untagged_union_null_follows_variants() {
        let nullable_variant = ParamDefinition::union(vec![
            ParamDefinition::string().nullable(),
            ParamDefinition::integer(),
        ]);
        let outcome = check(Value::Null, &nullable_variant);
        assert!(outcome.is_valid());
        assert_eq!(outcome.params, Value::Null);

        let literal_null = ParamDefinition::union(vec![
            ParamDefinition::string(),
            ParamDefinition::literal(Value::Null),
        ]);
        assert!(check(Value::Null, &literal_null).is_valid());

        let closed = ParamDefinition::union(vec![ParamDefinition::string(), ParamDefinition::integer()]);
        let outcome = check(Value::Null, &closed);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues.issues[0].code, IssueCode::ValueInvalid);
    }

    #[test]
    fn test_null_still_rejected_for_plain_fields() {
        let outcome = check(json!({ "number": null, "status": "draft" }), &invoice());
        assert_eq!(pointers(&outcome), vec!["/number"]);
    }

    // =========================================================================
    // Reference tests
    // =========================================================================

    #[test]
    fn test_recursive_reference() {
        let mut registry = TypeRegistry::new();
        registry.reserve("Node", &Scope::Global);
        registry
            .define(
                TypeDef::new(
                    "Node",
                    ParamDefinition::object(vec![
                        Field::new("label", ParamDefinition::string()),
                        Field::new(
                            "children",
                            ParamDefinition::array_of(ParamDefinition::reference("Node")).optional(),
                        ),
                    ]),
                ),
                &Scope::Global,
            )
            .unwrap();

        let outcome = validate(
            &registry,
            &Scope::Global,
            &json!({ "label": "root", "children": [{ "label": "a", "children": [{ "label": 1 }] }] }),
            &ParamDefinition::reference("Node"),
        );
        assert_eq!(pointers(&outcome), vec!["/children/0/children/0/label"]);
    }

    #[test]
    fn test_named_enum() {
        let mut registry = TypeRegistry::new();
        registry
            .register(
                TypeDef::new("Currency", ParamDefinition::enumeration(["EUR", "USD"])),
                &Scope::Global,
            )
            .unwrap();
        let def = ParamDefinition::named_enum("Currency");

        assert!(validate(&registry, &Scope::Global, &json!("EUR"), &def).is_valid());
        assert!(!validate(&registry, &Scope::Global, &json!("GBP"), &def).is_valid());
    }

    #[test]
    fn test_format_matches() {
        assert!(format_matches(&StringFormat::Email, "a@b.co"));
        assert!(!format_matches(&StringFormat::Email, "a@b"));
        assert!(format_matches(&StringFormat::Uri, "https://example.com/x"));
        assert!(format_matches(&StringFormat::Ipv4, "10.0.0.1"));
        assert!(!format_matches(&StringFormat::Ipv6, "10.0.0.1"));
        assert!(format_matches(&StringFormat::Pattern("^INV-\\d+$".into()), "INV-12"));
    }

    // =========================================================================
    // Temporal tests
    // =========================================================================

    /// Accepts exactly what `z.string().datetime({ offset: true })` and
    /// `z.string().time()` accept on the generated client.
    #[test]
    fn test_temporal_strings_agree_with_generated_zod_checks() {
        let datetime = ParamDefinition::datetime();
        for accepted in [
            "2024-01-01T10:00:00Z",
            "2024-01-01T10:00:00.123Z",
            "2024-01-01T10:00:00+02:00",
            "2024-01-01T10:00:00+0200",
            "2024-01-01T10:00:00-05",
        ] {
            assert!(check(json!(accepted), &datetime).is_valid(), "{accepted}");
            assert!(format_matches(&StringFormat::Datetime, accepted), "{accepted}");
        }
        for rejected in [
            "2024-01-01T10:00:00",
            "2024-01-01",
            "2024-01-01 10:00:00Z",
            "10:00:00Z",
        ] {
            assert!(!check(json!(rejected), &datetime).is_valid(), "{rejected}");
            assert!(!format_matches(&StringFormat::Datetime, rejected), "{rejected}");
        }

        let time = ParamDefinition::time();
        for accepted in ["10:30:00", "23:59:59.5"] {
            assert!(check(json!(accepted), &time).is_valid(), "{accepted}");
        }
        for rejected in ["10:30", "24:00:00", "10:30:00Z"] {
            assert!(!check(json!(rejected), &time).is_valid(), "{rejected}");
        }
    }

    // =========================================================================
    // Pattern cache tests
    // =========================================================================

    #[test]
    fn test_pattern_compiled_once() {
        let pattern = "^PO-[0-9]{4}$";
        assert!(format_matches(&StringFormat::Pattern(pattern.into()), "PO-1234"));
        assert!(!format_matches(&StringFormat::Pattern(pattern.into()), "PO-12"));

        let cache = PATTERNS.read().unwrap();
        assert!(matches!(cache.get(pattern), Some(Some(_))));
    }

    #[test]
    fn test_invalid_pattern_cached_and_skipped() {
        let pattern = "^(unclosed-[a-z";
        assert!(format_matches(&StringFormat::Pattern(pattern.into()), "anything"));
        assert!(matches!(PATTERNS.read().unwrap().get(pattern), Some(None)));
        assert!(format_matches(&StringFormat::Pattern(pattern.into()), "still anything"));
    }
}
