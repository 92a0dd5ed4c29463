use std::collections::BTreeMap;
use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use modelguard_engine::ModelErrors;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageOutput {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CheckOutput<'a> {
    pub schema_id: &'static str,
    pub class: &'a str,
    pub valid: bool,
    pub scope: Option<&'a str>,
    pub messages: Vec<MessageOutput>,
    pub errors: &'a ModelErrors,
}

impl<'a> CheckOutput<'a> {
    pub fn new(class: &'a str, scope: Option<&'a str>, errors: &'a ModelErrors) -> Self {
        Self {
            schema_id: "https://schemas.3leaps.dev/modelguard/cli/v1/check-result.schema.json",
            class,
            valid: errors.is_valid(),
            scope,
            messages: errors
                .messages()
                .into_iter()
                .map(|(path, message)| MessageOutput { path, message })
                .collect(),
            errors,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RequiredOutput<'a> {
    pub schema_id: &'static str,
    pub class: &'a str,
    pub fields: BTreeMap<String, bool>,
}

pub fn print_check(out: &CheckOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            if out.valid {
                println!("{}: valid", out.class);
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PATH", "MESSAGE"]);
            for entry in &out.messages {
                table.add_row(vec![entry.path.as_str(), entry.message.as_str()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "class={} valid={} messages={}",
                out.class,
                out.valid,
                out.messages.len()
            );
            for entry in &out.messages {
                println!("  {}: {}", entry.path, entry.message);
            }
        }
    }
}

pub fn print_required(out: &RequiredOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "REQUIRED"]);
            for (field, required) in &out.fields {
                table.add_row(vec![field.clone(), required.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (field, required) in &out.fields {
                let marker = if *required { "required" } else { "optional" };
                println!("{}.{field}: {marker}", out.class);
            }
        }
    }
}

fn print_json(out: &impl Serialize) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}
