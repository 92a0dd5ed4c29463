use std::path::Path;

use modelguard_engine::{ValidateOptions, Validator};
use modelguard_rules::{RuleFile, RuleRegistry};
use modelguard_schema::{CatalogConfig, SchemaCatalog};
use serde_json::Value;

use crate::cmd::CheckArgs;
use crate::exit::{
    io_error, rule_error, schema_error, validation_error, CliError, CliResult, DATA_INVALID,
    SUCCESS, USAGE,
};
use crate::output::{print_check, CheckOutput, OutputFormat};

pub fn run(args: CheckArgs, format: OutputFormat) -> CliResult<i32> {
    if args.schemas.is_none() && args.rules.is_none() {
        return Err(CliError::new(
            USAGE,
            "check needs --schemas or --rules (or both)",
        ));
    }

    let config = CatalogConfig {
        strict_mode: args.strict,
        ..CatalogConfig::default()
    };
    let catalog = match &args.schemas {
        Some(dir) => SchemaCatalog::from_directory_with_config(dir, config)
            .map_err(|err| schema_error("failed loading schemas", err))?,
        None => SchemaCatalog::with_config(config),
    };

    let mut rules: RuleRegistry = RuleRegistry::new();
    if let Some(path) = &args.rules {
        RuleFile::from_path(path)
            .map_err(|err| rule_error("failed loading rules", err))?
            .apply(&mut rules);
    }

    if !catalog.has_class(&args.class) && !rules.has_rules(&args.class) {
        return Err(CliError::new(
            USAGE,
            format!("unknown class {}: no schema and no rules", args.class),
        ));
    }

    let model = read_json(&args.model)?;
    let original = args.original.as_deref().map(read_json).transpose()?;
    let options = ValidateOptions {
        original: original.as_ref(),
        scope: args.scope.as_deref(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|err| io_error("failed starting runtime", err))?;
    let validator = Validator::new(&rules, &catalog);
    let errors = runtime
        .block_on(validator.validate_with(&args.class, &model, &(), options))
        .map_err(|err| validation_error("validation failed", err))?;

    let output = CheckOutput::new(&args.class, args.scope.as_deref(), &errors);
    tracing::info!(
        class = %args.class,
        valid = output.valid,
        messages = output.messages.len(),
        "model checked"
    );
    print_check(&output, format);

    if output.valid {
        Ok(SUCCESS)
    } else {
        Ok(DATA_INVALID)
    }
}

fn read_json(path: &Path) -> CliResult<Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    serde_json::from_str(&content).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("invalid JSON in {}: {err}", path.display()),
        )
    })
}
