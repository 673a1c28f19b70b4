//! Derived types of a resource.
//!
//! Write payloads are views over the attribute and association declarations
//! filtered by write context; they are never authored separately.

use tracing::{debug, trace};

use super::association::{AssociationDefinition, AssociationTarget};
use super::attribute::WriteContext;
use super::{singularize, type_name, ResourceCatalog, ResourceDefinition};
use crate::error::{ConfigResult, ConfigurationError};
use crate::ir::{Field, ParamDefinition, TypeDef, UnionVariant};
use crate::registry::{Scope, TypeRegistry};

/// Discriminator key of nested operation unions.
pub const NESTED_OPERATION_KEY: &str = "_op";

/// Shared pagination envelope, registered once in global scope.
pub const PAGINATION_META: &str = "PaginationMeta";

const SORT_DIRECTION: &str = "SortDirection";

/// Register every type derived from `resource` into `scope`.
///
/// Configuration errors (unresolvable associations, nested writes into a
/// resource that does not accept them) go through the registry's policy;
/// under `log` or `silent` the offending association is skipped.
pub fn register_resource(
    registry: &mut TypeRegistry,
    scope: &Scope,
    catalog: &ResourceCatalog,
    resource: &ResourceDefinition,
) -> ConfigResult<()> {
    let builder = Builder {
        catalog,
        resource,
        scope,
    };

    builder.register_read_type(registry)?;
    builder.register_payloads(registry)?;
    if resource.accepts_nested_writes {
        builder.register_nested_operation(registry)?;
    }
    builder.register_filter(registry)?;
    builder.register_sort(registry)?;
    builder.register_envelopes(registry)?;

    debug!(resource = %resource.name, scope = %scope, "Registered resource types");
    Ok(())
}

struct Builder<'a> {
    catalog: &'a ResourceCatalog,
    resource: &'a ResourceDefinition,
    scope: &'a Scope,
}

impl Builder<'_> {
    // =========================================================================
    // Read type
    // =========================================================================

    fn register_read_type(&self, registry: &mut TypeRegistry) -> ConfigResult<()> {
        let mut fields: Vec<Field> = self
            .resource
            .attributes
            .iter()
            .map(|attr| Field::new(&attr.name, attr.read_definition()))
            .collect();

        for association in &self.resource.associations {
            if let Some(def) = self.read_association(registry, association)? {
                fields.push(Field::new(&association.name, def));
            }
        }

        if self.resource.variants.is_empty() {
            let mut def = ParamDefinition::object(fields);
            def.metadata.description = self.resource.description.clone();
            return registry.register(TypeDef::new(&self.resource.name, def), self.scope);
        }

        // Single-table resource: one named type per variant, base fields first.
        let key = &self.resource.discriminator;
        let mut variants = Vec::new();
        for variant in &self.resource.variants {
            let mut variant_fields = vec![Field::new(key, ParamDefinition::literal(variant.tag.as_str()))];
            variant_fields.extend(fields.iter().filter(|f| f.name != *key).cloned());
            variant_fields.extend(
                variant
                    .attributes
                    .iter()
                    .map(|attr| Field::new(&attr.name, attr.read_definition())),
            );
            registry.register(
                TypeDef::new(&variant.name, ParamDefinition::object(variant_fields)),
                self.scope,
            )?;
            variants.push(UnionVariant::tagged(
                &variant.tag,
                ParamDefinition::reference(&variant.name),
            ));
        }

        let mut def = ParamDefinition::tagged_union(key, variants);
        def.metadata.description = self.resource.description.clone();
        registry.register(TypeDef::new(&self.resource.name, def), self.scope)
    }

    fn read_association(
        &self,
        registry: &mut TypeRegistry,
        association: &AssociationDefinition,
    ) -> ConfigResult<Option<ParamDefinition>> {
        let target = match &association.target {
            AssociationTarget::Polymorphic { .. } => {
                match self.polymorphic_union(registry, association)? {
                    Some(def) => def,
                    None => return Ok(None),
                }
            }
            AssociationTarget::Sti { tags, .. } if !tags.is_empty() => {
                let Some(resource) = self.catalog.resolve_target(association) else {
                    return self.unresolvable(registry, association);
                };
                let mut variants = Vec::new();
                for tag in tags {
                    let Some(variant) = resource.variant_for(tag) else {
                        return self.unresolvable(registry, association);
                    };
                    variants.push(UnionVariant::tagged(
                        tag,
                        ParamDefinition::reference(&variant.name),
                    ));
                }
                ParamDefinition::tagged_union(&resource.discriminator, variants)
            }
            _ => match self.catalog.resolve_target(association) {
                Some(resource) => ParamDefinition::reference(&resource.name),
                None => return self.unresolvable(registry, association),
            },
        };

        let mut def = if association.cardinality.is_many() {
            ParamDefinition::array_of(target)
        } else {
            target.with_nullable(association.nullable)
        };
        def.optional = association.optional;
        def.metadata.description = association.description.clone();
        Ok(Some(def))
    }

    /// Tagged union over one named variant type per polymorphic target.
    ///
    /// Each variant type carries the discriminator literal plus the
    /// target's attributes.
    fn polymorphic_union(
        &self,
        registry: &mut TypeRegistry,
        association: &AssociationDefinition,
    ) -> ConfigResult<Option<ParamDefinition>> {
        let Some(targets) = self.catalog.resolve_polymorphic(association) else {
            return self.unresolvable(registry, association);
        };

        let key = &association.discriminator;
        let mut variants = Vec::new();
        for (tag, target) in targets {
            let name = format!("{}{}", type_name(&association.name), target.name);
            let mut fields = vec![Field::new(key, ParamDefinition::literal(tag))];
            fields.extend(
                target
                    .attributes
                    .iter()
                    .filter(|attr| attr.name != *key)
                    .map(|attr| Field::new(&attr.name, attr.read_definition())),
            );
            registry.register(TypeDef::new(&name, ParamDefinition::object(fields)), self.scope)?;
            variants.push(UnionVariant::tagged(tag, ParamDefinition::reference(name)));
        }
        Ok(Some(ParamDefinition::tagged_union(key, variants)))
    }

    fn unresolvable<T>(
        &self,
        registry: &TypeRegistry,
        association: &AssociationDefinition,
    ) -> ConfigResult<Option<T>> {
        registry
            .policy()
            .apply(ConfigurationError::UnresolvableAssociation {
                resource: self.resource.name.clone(),
                association: association.name.clone(),
            })
            .map(|()| None)
    }

    // =========================================================================
    // Write payloads
    // =========================================================================

    fn register_payloads(&self, registry: &mut TypeRegistry) -> ConfigResult<()> {
        for (context, name) in [
            (WriteContext::Create, self.resource.create_payload_name()),
            (WriteContext::Update, self.resource.update_payload_name()),
        ] {
            let fields = self.write_fields(registry, context)?;
            registry.register(TypeDef::new(name, ParamDefinition::object(fields)), self.scope)?;
        }
        Ok(())
    }

    /// Fields supplied in a `context` write, in declaration order.
    fn write_fields(
        &self,
        registry: &TypeRegistry,
        context: WriteContext,
    ) -> ConfigResult<Vec<Field>> {
        let mut fields: Vec<Field> = self
            .resource
            .attributes
            .iter()
            .filter(|attr| attr.writable_for(context))
            .map(|attr| Field::new(&attr.name, attr.write_definition(context)))
            .collect();

        for association in &self.resource.associations {
            if !association.writable_for(context) {
                continue;
            }
            trace!(association = %association.name, context = context.as_str(), "Deriving write field");
            fields.extend(self.write_association(registry, association, context)?);
        }
        Ok(fields)
    }

    fn write_association(
        &self,
        registry: &TypeRegistry,
        association: &AssociationDefinition,
        context: WriteContext,
    ) -> ConfigResult<Vec<Field>> {
        let optional = context == WriteContext::Update || association.optional;

        if let AssociationTarget::Polymorphic { resources } = &association.target {
            if association.nested {
                return self.nested_unsupported(registry, association, "polymorphic");
            }
            let Some(targets) = self.catalog.resolve_polymorphic(association) else {
                return self.unresolvable(registry, association).map(|_: Option<()>| Vec::new());
            };
            let id = targets
                .first()
                .map(|(_, target)| id_definition(target))
                .unwrap_or_else(ParamDefinition::integer);
            return Ok(vec![
                Field::new(
                    format!("{}_id", association.name),
                    id.with_nullable(association.nullable).with_optional(optional),
                ),
                Field::new(
                    format!("{}_{}", association.name, association.discriminator),
                    ParamDefinition::enumeration(resources.keys().cloned())
                        .with_nullable(association.nullable)
                        .with_optional(optional),
                ),
            ]);
        }

        let Some(target) = self.catalog.resolve_target(association) else {
            return self.unresolvable(registry, association).map(|_: Option<()>| Vec::new());
        };

        if !association.nested {
            let id = id_definition(target);
            let field = if association.cardinality.is_many() {
                Field::new(
                    format!("{}_ids", singularize(&association.name)),
                    ParamDefinition::array_of(id).with_optional(optional),
                )
            } else {
                Field::new(
                    format!("{}_id", association.name),
                    id.with_nullable(association.nullable).with_optional(optional),
                )
            };
            return Ok(vec![field]);
        }

        if !target.accepts_nested_writes {
            return self.nested_unsupported(registry, association, &target.name);
        }

        let def = if association.cardinality.is_many() {
            ParamDefinition::array_of(ParamDefinition::reference(target.nested_operation_name()))
        } else {
            let payload = match context {
                WriteContext::Create => target.create_payload_name(),
                WriteContext::Update => target.update_payload_name(),
            };
            ParamDefinition::reference(payload).with_nullable(association.nullable)
        };
        Ok(vec![Field::new(&association.name, def.with_optional(optional))])
    }

    fn nested_unsupported(
        &self,
        registry: &TypeRegistry,
        association: &AssociationDefinition,
        target: &str,
    ) -> ConfigResult<Vec<Field>> {
        registry
            .policy()
            .apply(ConfigurationError::NestedWritesUnsupported {
                resource: self.resource.name.clone(),
                association: association.name.clone(),
                target: target.to_string(),
            })
            .map(|()| Vec::new())
    }

    // =========================================================================
    // Nested operations
    // =========================================================================

    /// `create` carries the create fields without an id, `update` the
    /// optional update fields plus a required id, `delete` only the id.
    fn register_nested_operation(&self, registry: &mut TypeRegistry) -> ConfigResult<()> {
        let op = |tag: &str| Field::new(NESTED_OPERATION_KEY, ParamDefinition::literal(tag));
        let id = || Field::new("id", id_definition(self.resource));
        let without_id = |fields: Vec<Field>| fields.into_iter().filter(|f| f.name != "id");

        let mut create = vec![op("create")];
        create.extend(without_id(self.write_fields(registry, WriteContext::Create)?));

        let mut update = vec![op("update"), id()];
        update.extend(without_id(self.write_fields(registry, WriteContext::Update)?));

        let delete = vec![op("delete"), id()];

        let def = ParamDefinition::tagged_union(
            NESTED_OPERATION_KEY,
            vec![
                UnionVariant::tagged("create", ParamDefinition::object(create)),
                UnionVariant::tagged("update", ParamDefinition::object(update)),
                UnionVariant::tagged("delete", ParamDefinition::object(delete)),
            ],
        );
        registry.register(
            TypeDef::new(self.resource.nested_operation_name(), def),
            self.scope,
        )
    }

    // =========================================================================
    // Filter and sort
    // =========================================================================

    /// Self-referencing filter, registered in two phases.
    fn register_filter(&self, registry: &mut TypeRegistry) -> ConfigResult<()> {
        let filterable: Vec<_> = self
            .resource
            .attributes
            .iter()
            .filter(|attr| attr.filterable)
            .collect();
        if filterable.is_empty() {
            return Ok(());
        }

        let name = self.resource.filter_name();
        registry.reserve(&name, self.scope);

        let mut fields: Vec<Field> = filterable
            .iter()
            .map(|attr| Field::new(&attr.name, attr.filter_definition()))
            .collect();
        let this = || ParamDefinition::reference(&name);
        fields.push(Field::new("and", ParamDefinition::array_of(this()).optional()));
        fields.push(Field::new("or", ParamDefinition::array_of(this()).optional()));
        fields.push(Field::new("not", this().optional()));

        registry.define(TypeDef::new(&name, ParamDefinition::object(fields)), self.scope)
    }

    fn register_sort(&self, registry: &mut TypeRegistry) -> ConfigResult<()> {
        let mut sortable: Vec<&str> = self
            .resource
            .attributes
            .iter()
            .filter(|attr| attr.sortable)
            .map(|attr| attr.name.as_str())
            .collect();
        if sortable.is_empty() {
            return Ok(());
        }
        sortable.sort_unstable();

        registry.register(
            TypeDef::new(SORT_DIRECTION, ParamDefinition::enumeration(["asc", "desc"])),
            &Scope::Global,
        )?;
        registry.register(
            TypeDef::new(self.resource.sort_field_name(), ParamDefinition::enumeration(sortable)),
            self.scope,
        )?;
        registry.register(
            TypeDef::new(
                self.resource.sort_name(),
                ParamDefinition::object(vec![
                    Field::new("field", ParamDefinition::reference(self.resource.sort_field_name())),
                    Field::new("direction", ParamDefinition::reference(SORT_DIRECTION).optional()),
                ]),
            ),
            self.scope,
        )
    }

    // =========================================================================
    // Envelopes
    // =========================================================================

    fn register_envelopes(&self, registry: &mut TypeRegistry) -> ConfigResult<()> {
        registry.register(pagination_meta(), &Scope::Global)?;

        let root = self.resource.root_key();
        let record = || ParamDefinition::reference(&self.resource.name);

        registry.register(
            TypeDef::new(
                self.resource.response_name(),
                ParamDefinition::object(vec![Field::new(&root.singular, record())]),
            ),
            self.scope,
        )?;
        registry.register(
            TypeDef::new(
                self.resource.collection_response_name(),
                ParamDefinition::object(vec![
                    Field::new(&root.plural, ParamDefinition::array_of(record())),
                    Field::new("meta", ParamDefinition::reference(PAGINATION_META)),
                ]),
            ),
            self.scope,
        )
    }
}

/// Definition of a resource's `id`: its declared attribute, else integer.
fn id_definition(resource: &ResourceDefinition) -> ParamDefinition {
    resource
        .find_attribute("id")
        .map(|attr| attr.read_definition().with_nullable(false))
        .unwrap_or_else(ParamDefinition::integer)
}

fn pagination_meta() -> TypeDef {
    let page = || ParamDefinition::integer().with_min(1.0);
    TypeDef::new(
        PAGINATION_META,
        ParamDefinition::object(vec![
            Field::new("current_page", page()),
            Field::new("next_page", page().nullable()),
            Field::new("prev_page", page().nullable()),
            Field::new("total_pages", ParamDefinition::integer().with_min(0.0)),
            Field::new("total_count", ParamDefinition::integer().with_min(0.0)),
        ]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorPolicy;
    use crate::issue::IssueCode;
    use crate::resource::{AttributeDefinition, ResourceVariant};
    use crate::validate::validate;
    use serde_json::json;

    fn line_item() -> ResourceDefinition {
        ResourceDefinition::new("LineItem")
            .accepts_nested_writes()
            .attribute(AttributeDefinition::new("id", ParamDefinition::integer()))
            .attribute(AttributeDefinition::new("description", ParamDefinition::string()).writable(true))
            .attribute(
                AttributeDefinition::new("quantity", ParamDefinition::integer().with_min(1.0))
                    .writable(true)
                    .sortable(),
            )
    }

    fn invoice() -> ResourceDefinition {
        ResourceDefinition::new("Invoice")
            .attribute(AttributeDefinition::new("id", ParamDefinition::integer()).filterable())
            .attribute(
                AttributeDefinition::new("number", ParamDefinition::string())
                    .writable(true)
                    .filterable()
                    .sortable(),
            )
            .attribute(
                AttributeDefinition::new("status", ParamDefinition::string())
                    .enum_values(["draft", "sent", "paid"])
                    .writable(true)
                    .default_value("draft")
                    .filterable(),
            )
            .attribute(
                AttributeDefinition::new("voided_at", ParamDefinition::datetime())
                    .nullable()
                    .writable_on([WriteContext::Update]),
            )
            .association(AssociationDefinition::has_many("line_items").writable(true).nested())
            .association(AssociationDefinition::belongs_to("customer").writable(true))
    }

    fn customer() -> ResourceDefinition {
        ResourceDefinition::new("Customer")
            .attribute(AttributeDefinition::new("id", ParamDefinition::uuid()))
            .attribute(AttributeDefinition::new("name", ParamDefinition::string()))
    }

    fn registered() -> (TypeRegistry, Scope) {
        let catalog: ResourceCatalog = [invoice(), line_item(), customer()].into_iter().collect();
        let mut registry = TypeRegistry::new().with_policy(ErrorPolicy::Raise);
        let scope = Scope::api("billing");
        catalog.register_all(&mut registry, &scope).unwrap();
        (registry, scope)
    }

    fn shape_names(registry: &TypeRegistry, scope: &Scope, name: &str) -> Vec<String> {
        registry
            .resolve(name, scope)
            .unwrap()
            .definition
            .shape()
            .unwrap()
            .field_names()
            .map(String::from)
            .collect()
    }

    // =========================================================================
    // Read and write types
    // =========================================================================

    #[test]
    fn test_read_type() {
        let (registry, scope) = registered();
        assert_eq!(
            shape_names(&registry, &scope, "Invoice"),
            vec!["id", "number", "status", "voided_at", "line_items", "customer"]
        );
    }

    #[test]
    fn test_update_only_attribute_absent_from_create() {
        let (registry, scope) = registered();

        let create = shape_names(&registry, &scope, "InvoiceCreatePayload");
        assert_eq!(create, vec!["number", "status", "line_items", "customer_id"]);

        let update = registry.resolve("InvoiceUpdatePayload", &scope).unwrap();
        let shape = update.definition.shape().unwrap();
        let voided = shape.field("voided_at").unwrap();
        assert!(voided.definition.optional);
        assert!(voided.definition.nullable);
        assert!(shape.fields.iter().all(|f| f.definition.optional));
    }

    #[test]
    fn test_belongs_to_id_uses_target_id_type() {
        let (registry, scope) = registered();
        let create = registry.resolve("InvoiceCreatePayload", &scope).unwrap();
        let customer_id = create.definition.shape().unwrap().field("customer_id").unwrap();
        assert_eq!(customer_id.definition, ParamDefinition::uuid());
    }

    // =========================================================================
    // Nested operations
    // =========================================================================

    #[test]
    fn test_nested_delete_accepts_only_id() {
        let (registry, scope) = registered();
        let def = ParamDefinition::reference("LineItemNestedOperation");

        let outcome = validate(&registry, &scope, &json!({ "_op": "delete", "id": 7 }), &def);
        assert!(outcome.is_valid(), "{}", outcome.issues);
        assert_eq!(outcome.params, json!({ "_op": "delete", "id": 7 }));

        let outcome = validate(
            &registry,
            &scope,
            &json!({ "_op": "delete", "id": 7, "description": "Widget" }),
            &def,
        );
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues.issues[0].code, IssueCode::FieldUnknown);
        assert_eq!(outcome.issues.issues[0].pointer, "/description");
    }

    #[test]
    fn test_nested_create_has_no_id() {
        let (registry, scope) = registered();
        let def = ParamDefinition::reference("LineItemNestedOperation");

        let outcome = validate(
            &registry,
            &scope,
            &json!({ "_op": "create", "description": "Widget", "quantity": 2 }),
            &def,
        );
        assert!(outcome.is_valid(), "{}", outcome.issues);

        let outcome = validate(
            &registry,
            &scope,
            &json!({ "_op": "create", "id": 1, "description": "Widget", "quantity": 2 }),
            &def,
        );
        assert_eq!(outcome.issues.issues[0].code, IssueCode::FieldUnknown);
    }

    #[test]
    fn test_nested_update_requires_id() {
        let (registry, scope) = registered();
        let def = ParamDefinition::reference("LineItemNestedOperation");

        let outcome = validate(&registry, &scope, &json!({ "_op": "update", "quantity": 3 }), &def);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues.issues[0].code, IssueCode::Required);
        assert_eq!(outcome.issues.issues[0].pointer, "/id");
    }

    #[test]
    fn test_nested_writes_into_closed_resource() {
        let catalog: ResourceCatalog = [
            ResourceDefinition::new("Invoice").association(
                AssociationDefinition::has_many("payments").writable(true).nested(),
            ),
            ResourceDefinition::new("Payment"),
        ]
        .into_iter()
        .collect();

        let mut registry = TypeRegistry::new().with_policy(ErrorPolicy::Raise);
        let err = catalog
            .register_all(&mut registry, &Scope::api("billing"))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::NestedWritesUnsupported {
                resource: "Invoice".into(),
                association: "payments".into(),
                target: "Payment".into(),
            }
        );

        let mut registry = TypeRegistry::new().with_policy(ErrorPolicy::Silent);
        catalog.register_all(&mut registry, &Scope::api("billing")).unwrap();
        let create = registry
            .resolve("InvoiceCreatePayload", &Scope::api("billing"))
            .unwrap();
        assert!(create.definition.shape().unwrap().is_empty());
    }

    #[test]
    fn test_unresolvable_association() {
        let catalog: ResourceCatalog = [ResourceDefinition::new("Invoice")
            .association(AssociationDefinition::has_many("shipments"))]
        .into_iter()
        .collect();

        let mut registry = TypeRegistry::new().with_policy(ErrorPolicy::Raise);
        let err = catalog
            .register_all(&mut registry, &Scope::api("billing"))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnresolvableAssociation { .. }));

        let mut registry = TypeRegistry::new().with_policy(ErrorPolicy::Log);
        catalog.register_all(&mut registry, &Scope::api("billing")).unwrap();
        assert!(registry.exists("Invoice", &Scope::api("billing")));
    }

    // =========================================================================
    // Filter, sort and envelopes
    // =========================================================================

    #[test]
    fn test_recursive_filter() {
        let (registry, scope) = registered();
        assert_eq!(
            shape_names(&registry, &scope, "InvoiceFilter"),
            vec!["id", "number", "status", "and", "or", "not"]
        );
        assert!(registry.recursive_names(&scope).contains("InvoiceFilter"));

        let outcome = validate(
            &registry,
            &scope,
            &json!({ "or": [{ "status": "paid" }, { "not": { "number": "INV-1" } }] }),
            &ParamDefinition::reference("InvoiceFilter"),
        );
        assert!(outcome.is_valid(), "{}", outcome.issues);
    }

    #[test]
    fn test_sort_field_enum_is_sorted() {
        let (registry, scope) = registered();
        let sort = registry.resolve("LineItemSortField", &scope).unwrap();
        assert_eq!(sort.definition.inline_enum().unwrap(), ["quantity"]);
        assert!(registry.exists("SortDirection", &Scope::Global));
    }

    #[test]
    fn test_envelopes() {
        let (registry, scope) = registered();
        assert_eq!(shape_names(&registry, &scope, "InvoiceResponse"), vec!["invoice"]);
        assert_eq!(
            shape_names(&registry, &scope, "LineItemCollectionResponse"),
            vec!["line_items", "meta"]
        );
        assert!(registry.get(PAGINATION_META, &Scope::Global).is_some());
    }

    #[test]
    fn test_registration_is_idempotent() {
        let (mut registry, scope) = registered();
        let before = registry.len();
        let catalog: ResourceCatalog = [invoice(), line_item(), customer()].into_iter().collect();
        catalog.register_all(&mut registry, &scope).unwrap();
        assert_eq!(registry.len(), before);
    }

    // =========================================================================
    // Variants
    // =========================================================================

    #[test]
    fn test_single_table_variants() {
        let catalog: ResourceCatalog = [
            ResourceDefinition::new("Payment")
                .attribute(AttributeDefinition::new("amount", ParamDefinition::decimal()))
                .variant(
                    ResourceVariant::new("card", "CardPayment")
                        .attribute(AttributeDefinition::new("last_four", ParamDefinition::string())),
                )
                .variant(ResourceVariant::new("wire", "WirePayment")),
            ResourceDefinition::new("Invoice").association(
                AssociationDefinition::has_many("card_payments").sti("Payment", ["card"]),
            ),
        ]
        .into_iter()
        .collect();

        let mut registry = TypeRegistry::new().with_policy(ErrorPolicy::Raise);
        let scope = Scope::api("billing");
        catalog.register_all(&mut registry, &scope).unwrap();

        assert_eq!(
            shape_names(&registry, &scope, "CardPayment"),
            vec!["type", "amount", "last_four"]
        );

        let def = ParamDefinition::reference("Payment");
        let outcome = validate(&registry, &scope, &json!({ "type": "wire", "amount": 5 }), &def);
        assert!(outcome.is_valid(), "{}", outcome.issues);

        let invoice = ParamDefinition::reference("Invoice");
        let outcome = validate(
            &registry,
            &scope,
            &json!({ "card_payments": [{ "type": "wire", "amount": 5 }] }),
            &invoice,
        );
        assert_eq!(outcome.issues.issues[0].code, IssueCode::EnumInvalid);
        assert_eq!(outcome.issues.issues[0].pointer, "/card_payments/0/type");
    }

    #[test]
    fn test_polymorphic_association() {
        let catalog: ResourceCatalog = [
            ResourceDefinition::new("Comment").association(
                AssociationDefinition::belongs_to("subject")
                    .polymorphic([("invoice", "Invoice"), ("customer", "Customer")])
                    .writable(true),
            ),
            ResourceDefinition::new("Invoice")
                .attribute(AttributeDefinition::new("number", ParamDefinition::string())),
            customer(),
        ]
        .into_iter()
        .collect();

        let mut registry = TypeRegistry::new().with_policy(ErrorPolicy::Raise);
        let scope = Scope::api("billing");
        catalog.register_all(&mut registry, &scope).unwrap();

        assert_eq!(
            shape_names(&registry, &scope, "SubjectInvoice"),
            vec!["type", "number"]
        );
        assert_eq!(
            shape_names(&registry, &scope, "CommentCreatePayload"),
            vec!["subject_id", "subject_type"]
        );

        let outcome = validate(
            &registry,
            &scope,
            &json!({ "subject": { "type": "invoice", "number": "INV-1" } }),
            &ParamDefinition::reference("Comment"),
        );
        assert!(outcome.is_valid(), "{}", outcome.issues);
    }
}
