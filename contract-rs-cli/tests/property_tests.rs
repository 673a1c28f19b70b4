//! Property-based tests for configuration merging and output naming.

use std::path::PathBuf;

use contract_rs::generator::generator_for;
use contract_rs::KeyCase;
use contract_rs_cli::config::{CliArgs, Config, ConfigManager};
use contract_rs_cli::generator::output_file_name;
use proptest::prelude::*;

fn arb_key_case() -> impl Strategy<Value = KeyCase> {
    prop_oneof![
        Just(KeyCase::Preserve),
        Just(KeyCase::Camel),
        Just(KeyCase::Snake),
        Just(KeyCase::Kebab),
    ]
}

fn arb_dir() -> impl Strategy<Value = PathBuf> {
    "[a-z]{1,8}(/[a-z]{1,8}){0,2}".prop_map(PathBuf::from)
}

fn arb_target() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("ts"), Just("typescript"), Just("zod"), Just("openapi")]
}

proptest! {
    /// Flags that are set always win; flags that are unset never change the file value.
    #[test]
    fn prop_cli_args_take_precedence(
        input in proptest::option::of(arb_dir()),
        output in proptest::option::of(arb_dir()),
        key_case in proptest::option::of(arb_key_case()),
        generate_docs in proptest::option::of(any::<bool>()),
    ) {
        let base = Config::default();
        let merged = ConfigManager::merge_cli_args(
            base.clone(),
            &CliArgs {
                input: input.clone(),
                output: output.clone(),
                key_case,
                generate_docs,
                ..Default::default()
            },
        );

        prop_assert_eq!(merged.input.dir, input.unwrap_or(base.input.dir));
        prop_assert_eq!(merged.output.dir, output.unwrap_or(base.output.dir));
        prop_assert_eq!(merged.naming.key_case, key_case.unwrap_or(base.naming.key_case));
        prop_assert_eq!(
            merged.output.generate_docs,
            generate_docs.unwrap_or(base.output.generate_docs)
        );
        prop_assert_eq!(merged.generators, base.generators);
    }

    /// Every known target validates and names its file after the namespace.
    #[test]
    fn prop_known_targets_validate(target in arb_target(), namespace in "[a-z][a-z_]{0,10}") {
        let config = ConfigManager::merge_cli_args(
            Config::default(),
            &CliArgs {
                target: Some(target.to_string()),
                ..Default::default()
            },
        );
        prop_assert!(config.validate().is_ok());

        let generator = generator_for(target).unwrap();
        let name = output_file_name(&namespace, generator.as_ref());
        let name = name.to_string_lossy();
        let prefix = format!("{namespace}.");
        prop_assert!(name.starts_with(&prefix));
        prop_assert!(name.ends_with(generator.file_extension()));
    }

    /// Targets no generator answers to are rejected.
    #[test]
    fn prop_unknown_targets_rejected(target in "[a-z]{1,10}") {
        prop_assume!(generator_for(&target).is_none());
        let config = ConfigManager::merge_cli_args(
            Config::default(),
            &CliArgs {
                target: Some(target),
                ..Default::default()
            },
        );
        prop_assert!(config.validate().is_err());
    }
}
