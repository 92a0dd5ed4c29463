use serde::Serialize;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Debug, Serialize)]
struct VersionOutput {
    schema_id: &'static str,
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<BuildInfo>,
}

#[derive(Debug, Serialize)]
struct BuildInfo {
    target: &'static str,
    os: &'static str,
    arch: &'static str,
    git_hash: &'static str,
    rule_kinds: [&'static str; 3],
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    let output = VersionOutput {
        schema_id: "https://schemas.3leaps.dev/modelguard/cli/v1/version.schema.json",
        name: "modelguard",
        version: env!("CARGO_PKG_VERSION"),
        build: args.extended.then(|| BuildInfo {
            target: option_env!("MODELGUARD_BUILD_TARGET").unwrap_or("unknown"),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            rule_kinds: ["required", "min", "max"],
        }),
    };

    match (format, &output.build) {
        (OutputFormat::Json, _) => println!(
            "{}",
            serde_json::to_string(&output).unwrap_or_else(|_| "{}".to_string())
        ),
        (_, None) => println!("{} {}", output.name, output.version),
        (_, Some(build)) => {
            println!("name: {}", output.name);
            println!("version: {}", output.version);
            println!("build_target: {}", build.target);
            println!("target: {}/{}", build.os, build.arch);
            println!("git_hash: {}", build.git_hash);
            println!("rule_kinds: {}", build.rule_kinds.join(", "));
        }
    }

    Ok(SUCCESS)
}
