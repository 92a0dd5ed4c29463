use modelguard_rules::{RuleFile, RuleRegistry};

use crate::cmd::RequiredArgs;
use crate::exit::{rule_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_required, OutputFormat, RequiredOutput};

pub fn run(args: RequiredArgs, format: OutputFormat) -> CliResult<i32> {
    let file = RuleFile::from_path(&args.rules)
        .map_err(|err| rule_error("failed loading rules", err))?;
    let mut registry: RuleRegistry = RuleRegistry::new();
    file.apply(&mut registry);

    if !registry.has_rules(&args.class) {
        let known = registry.classes().join(", ");
        return Err(CliError::new(
            USAGE,
            format!("no rules for class {} (known: {known})", args.class),
        ));
    }

    let output = RequiredOutput {
        schema_id: "https://schemas.3leaps.dev/modelguard/cli/v1/required-fields.schema.json",
        class: &args.class,
        fields: registry.required_fields_for(&args.class),
    };
    print_required(&output, format);
    Ok(SUCCESS)
}
