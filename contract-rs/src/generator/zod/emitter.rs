//! Zod code emitter.
//!
//! # Features
//!
//! - `z.object(...).strict()` for objects, `z.enum()` for enums
//! - `z.discriminatedUnion()` for tagged unions, `z.union()` otherwise
//! - `.min()`, `.max()`, `.email()`, `.regex()` and the other checks
//! - `.nullable()`, `.optional()`, `.default()`, `.describe()`
//! - `z.infer<typeof Schema>` type aliases
//! - Recursive types annotated with an explicit type and deferred with `z.lazy`

use crate::error::GeneratorError;
use crate::generator::traits::{
    CodeGenerator, GeneratedCode, GenerationContext, GeneratorFeature,
};
use crate::generator::typescript::TypeScriptGenerator;
use crate::generator::{header, js_string, jsdoc};
use crate::ir::TypeDef;
use crate::registry::{OrderedKind, OrderedType};

use super::type_mapper::{schema_name, ZodTypeMapper};

/// Zod schema code generator.
#[derive(Debug, Clone, Default)]
pub struct ZodGenerator {
    /// Renders the explicit types of recursive schemas
    typescript: TypeScriptGenerator,
}

impl ZodGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema expression of one named type, without the declaration.
    pub fn generate_schema_string(&self, def: &TypeDef, ctx: &GenerationContext<'_>) -> String {
        let mut schema = ZodTypeMapper::new(*ctx, &def.name).map_type(&def.definition, 0);
        if ctx.config.generate_docs {
            if let Some(desc) = &def.definition.metadata.description {
                schema.push_str(&format!(".describe({})", js_string(desc)));
            }
        }
        schema
    }

    fn generate_defined(
        &self,
        def: &TypeDef,
        recursive: bool,
        ctx: &GenerationContext<'_>,
    ) -> String {
        let export = ctx.config.export_prefix();
        let name = &def.name;
        let schema = schema_name(name);
        let body = self.generate_schema_string(def, ctx);

        let mut out = String::new();
        if ctx.config.generate_docs {
            out.push_str(&jsdoc(&def.definition.metadata, ""));
        }

        if recursive {
            // Inference cannot see through z.lazy; the type is spelled out.
            out.push_str(&self.typescript.declaration(def, ctx));
            out.push_str(&format!(
                "{export}const {schema}: z.ZodType<{name}> = {body};\n"
            ));
        } else {
            out.push_str(&format!("{export}const {schema} = {body};\n"));
            if ctx.config.generate_types {
                out.push_str(&format!(
                    "{export}type {name} = z.infer<typeof {schema}>;\n"
                ));
            }
        }
        out
    }
}

impl CodeGenerator for ZodGenerator {
    fn id(&self) -> &'static str {
        "zod"
    }

    fn name(&self) -> &'static str {
        "Zod Schema Generator"
    }

    fn file_extension(&self) -> &'static str {
        "ts"
    }

    fn generate(
        &self,
        ty: &OrderedType<'_>,
        ctx: &GenerationContext<'_>,
    ) -> Result<GeneratedCode, GeneratorError> {
        let (code, dependencies) = match &ty.kind {
            OrderedKind::Alias(target) => {
                let export = ctx.config.export_prefix();
                let mut code = format!(
                    "{export}const {} = {};\n",
                    schema_name(&ty.name),
                    ZodTypeMapper::new(*ctx, &ty.name).map_reference(target)
                );
                if ctx.config.generate_types {
                    code.push_str(&format!("{export}type {} = {target};\n", ty.name));
                }
                (code, vec![target.clone()])
            }
            OrderedKind::Defined(def) => (
                self.generate_defined(def, ty.recursive, ctx),
                def.dependencies().into_iter().collect(),
            ),
        };

        Ok(GeneratedCode::new(code, &ty.name)
            .with_schema_name(schema_name(&ty.name))
            .with_dependencies(dependencies))
    }

    fn generate_preamble(
        &self,
        _types: &[OrderedType<'_>],
        ctx: &GenerationContext<'_>,
    ) -> Result<String, GeneratorError> {
        Ok(format!(
            "{}import {{ z }} from 'zod';\n\n",
            header(self, ctx.view.scope, ctx.config)
        ))
    }

    fn supports_feature(&self, feature: GeneratorFeature) -> bool {
        match feature {
            GeneratorFeature::CircularReferences => true,
            GeneratorFeature::DiscriminatedUnions => true,
            GeneratorFeature::Lazy => true,
            GeneratorFeature::StrictMode => true,
            GeneratorFeature::RuntimeValidation => true,
            GeneratorFeature::DefaultValues => true,
            GeneratorFeature::Descriptions => true,
            GeneratorFeature::Deprecation => true,
            GeneratorFeature::Examples => false,
        }
    }
}
