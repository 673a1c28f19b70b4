//! Property-based tests for contract-rs.
//!
//! Properties tested:
//! - Coercion accepts exactly the integer strings and rejects the rest
//! - JSON Pointer escaping round-trips arbitrary keys
//! - Issue pointers address the failing key in the original payload
//! - Registering the same definition twice is a no-op
//! - TypeScript and Zod agree on optional and nullable modifiers
//! - Generation output depends only on registry contents

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use contract_rs::coerce::coerce_scalar;
use contract_rs::generator::{generate_namespace, GeneratorConfig};
use contract_rs::ir::{Field, ParamDefinition, ScalarKind, TypeDef};
use contract_rs::issue::{escape_token, parse_pointer, pointer, IssueCode, PathSegment};
use contract_rs::registry::{Scope, TypeRegistry};
use contract_rs::validate::validate;
use contract_rs::{ErrorPolicy, TypeScriptGenerator, ZodGenerator};

// =============================================================================
// Strategies
// =============================================================================

/// Generate a snake_case field name.
fn arb_field_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,6}(_[a-z][a-z0-9]{0,4}){0,2}"
}

/// Generate a PascalCase type name.
fn arb_type_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,8}"
}

/// Generate a scalar definition with random modifiers.
fn arb_scalar() -> impl Strategy<Value = ParamDefinition> {
    (
        prop_oneof![
            Just(ParamDefinition::string()),
            Just(ParamDefinition::integer()),
            Just(ParamDefinition::boolean()),
            Just(ParamDefinition::uuid()),
        ],
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(def, nullable, optional)| def.with_nullable(nullable).with_optional(optional))
}

/// Generate an object definition with distinct field names.
fn arb_object() -> impl Strategy<Value = Vec<(String, ParamDefinition)>> {
    proptest::collection::btree_map(arb_field_name(), arb_scalar(), 1..6)
        .prop_map(|fields| fields.into_iter().collect())
}

fn object_def(fields: &[(String, ParamDefinition)]) -> ParamDefinition {
    ParamDefinition::object(
        fields
            .iter()
            .map(|(name, def)| Field::new(name, def.clone()))
            .collect(),
    )
}

// =============================================================================
// Coercion
// =============================================================================

proptest! {
    /// Integer strings coerce to the same integer.
    #[test]
    fn prop_integer_strings_coerce(n in any::<i64>()) {
        let coerced = coerce_scalar(ScalarKind::Integer, &Value::String(n.to_string()));
        prop_assert_eq!(coerced, Some(json!(n)));
    }

    /// Strings with a fractional part never become integers.
    #[test]
    fn prop_fractional_strings_do_not_coerce_to_integer(
        whole in -10_000i64..10_000,
        frac in 1u32..1000,
    ) {
        let raw = format!("{whole}.{frac}");
        prop_assert_eq!(coerce_scalar(ScalarKind::Integer, &Value::String(raw)), None);
    }

    /// Float coercion parses what Rust parses.
    #[test]
    fn prop_float_strings_coerce(x in -1.0e9f64..1.0e9) {
        let coerced = coerce_scalar(ScalarKind::Float, &Value::String(x.to_string()));
        let value = coerced.and_then(|v| v.as_f64());
        prop_assert!(value.is_some());
        prop_assert!((value.unwrap() - x).abs() <= f64::EPSILON * x.abs().max(1.0));
    }

    /// Null never coerces, whatever the target kind.
    #[test]
    fn prop_null_never_coerces(kind in prop_oneof![
        Just(ScalarKind::String),
        Just(ScalarKind::Integer),
        Just(ScalarKind::Float),
        Just(ScalarKind::Boolean),
        Just(ScalarKind::Date),
        Just(ScalarKind::Uuid),
    ]) {
        prop_assert_eq!(coerce_scalar(kind, &Value::Null), None);
    }
}

// =============================================================================
// Pointers
// =============================================================================

proptest! {
    /// Escaped tokens never contain a raw `/` and parse back to the key.
    #[test]
    fn prop_pointer_round_trip(keys in proptest::collection::vec("[a-z~/._-]{0,8}", 0..5)) {
        let path: Vec<PathSegment> = keys.iter().map(|k| PathSegment::from(k.as_str())).collect();
        for key in &keys {
            prop_assert!(!escape_token(key).contains('/'));
        }
        prop_assert_eq!(parse_pointer(&pointer(&path)), keys);
    }

    /// An unknown key is reported at the pointer that addresses it.
    #[test]
    fn prop_unknown_key_pointer(key in "[a-z~/]{1,8}") {
        prop_assume!(key != "number");
        let mut registry = TypeRegistry::new();
        let scope = Scope::api("billing");
        let def = ParamDefinition::object(vec![
            Field::new("number", ParamDefinition::string().optional()),
        ]);
        registry.register(TypeDef::new("Invoice", def.clone()), &scope).unwrap();

        let mut payload = Map::new();
        payload.insert(key.clone(), json!(1));
        let outcome = validate(&registry, &scope, &Value::Object(payload), &def);

        prop_assert_eq!(outcome.issues.len(), 1);
        let issue = &outcome.issues.issues[0];
        prop_assert_eq!(issue.code, IssueCode::FieldUnknown);
        prop_assert_eq!(parse_pointer(&issue.pointer), vec![key]);
    }
}

// =============================================================================
// Registration
// =============================================================================

proptest! {
    /// Registering the same definition again leaves the registry unchanged.
    #[test]
    fn prop_registration_idempotent(name in arb_type_name(), fields in arb_object()) {
        let mut registry = TypeRegistry::new().with_policy(ErrorPolicy::Raise);
        let scope = Scope::api("billing");
        let def = TypeDef::new(&name, object_def(&fields));

        registry.register(def.clone(), &scope).unwrap();
        let before = registry.resolve(&name, &scope).unwrap().clone();
        registry.register(def, &scope).unwrap();

        prop_assert_eq!(registry.len(), 1);
        prop_assert_eq!(registry.resolve(&name, &scope).unwrap(), &before);
    }
}

// =============================================================================
// Generation
// =============================================================================

proptest! {
    /// A field is optional in TypeScript iff Zod marks it `.optional()`,
    /// and nullable in TypeScript iff Zod marks it `.nullable()`.
    #[test]
    fn prop_typescript_and_zod_agree(fields in arb_object()) {
        let mut registry = TypeRegistry::new();
        let scope = Scope::api("billing");
        registry.register(TypeDef::new("Record", object_def(&fields)), &scope).unwrap();
        let config = GeneratorConfig::default();

        let ts = generate_namespace(&TypeScriptGenerator::new(), &registry, &scope, &config).unwrap();
        let zod = generate_namespace(&ZodGenerator::new(), &registry, &scope, &config).unwrap();

        for (name, def) in &fields {
            let ts_line = ts
                .lines()
                .find(|line| line.trim_start().starts_with(&format!("{name}:"))
                    || line.trim_start().starts_with(&format!("{name}?:")))
                .unwrap();
            let zod_line = zod
                .lines()
                .find(|line| line.trim_start().starts_with(&format!("{name}:")))
                .unwrap();

            prop_assert_eq!(ts_line.contains(&format!("{name}?:")), def.optional);
            prop_assert_eq!(zod_line.contains(".optional()"), def.optional);
            prop_assert_eq!(ts_line.contains("| null"), def.nullable);
            prop_assert_eq!(zod_line.contains(".nullable()"), def.nullable);
        }
    }

    /// Registration order does not change generated output.
    #[test]
    fn prop_generation_is_order_independent(
        types in proptest::collection::btree_map(arb_type_name(), arb_object(), 1..5),
    ) {
        let scope = Scope::api("billing");
        let mut forward = TypeRegistry::new();
        let mut backward = TypeRegistry::new();
        for (name, fields) in &types {
            forward.register(TypeDef::new(name, object_def(fields)), &scope).unwrap();
        }
        for (name, fields) in types.iter().rev() {
            backward.register(TypeDef::new(name, object_def(fields)), &scope).unwrap();
        }

        let config = GeneratorConfig::default();
        prop_assert_eq!(
            generate_namespace(&ZodGenerator::new(), &forward, &scope, &config).unwrap(),
            generate_namespace(&ZodGenerator::new(), &backward, &scope, &config).unwrap()
        );
        prop_assert_eq!(
            generate_namespace(&TypeScriptGenerator::new(), &forward, &scope, &config).unwrap(),
            generate_namespace(&TypeScriptGenerator::new(), &backward, &scope, &config).unwrap()
        );
    }
}
