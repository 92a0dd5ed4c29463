#![cfg(feature = "cli")]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const PERSON_SCHEMA: &str = r#"{
    "class": "Person",
    "fields": {
        "FirstName": "string",
        "LastName": "string",
        "Age": { "$nullable": "integer" },
        "Address": { "$model": "Address" },
        "Items": { "$array": "Item" }
    }
}"#;

const ADDRESS_SCHEMA: &str = r#"{
    "fields": {
        "Street": "string",
        "Zip": { "type": "string", "pattern": "^[0-9]{5}$" }
    }
}"#;

const ITEM_SCHEMA: &str = r#"{ "class": "Item", "fields": { "Name": "string" } }"#;

const RULES: &str = r#"{
    "Person": {
        "FirstName": [{ "rule": "required" }, { "rule": "max", "bound": 20 }],
        "LastName": { "rule": "required" },
        "Items": { "rule": "min", "bound": 1, "message": "must have at least one entry when empty" }
    },
    "Address": { "Street": { "rule": "required" } },
    "Item": { "Name": { "rule": "required" } }
}"#;

struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "modelguard-cli-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(dir.join("schemas")).expect("temp dir should be creatable");

        let fixture = Self { dir };
        fixture.write("schemas/person.model.json", PERSON_SCHEMA);
        fixture.write("schemas/Address.model.json", ADDRESS_SCHEMA);
        fixture.write("schemas/item.model.json", ITEM_SCHEMA);
        fixture.write("rules.json", RULES);
        fixture
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.join(name);
        std::fs::write(&path, content).expect("fixture file should be writable");
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn modelguard<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    Command::new(env!("CARGO_BIN_EXE_modelguard"))
        .env_remove("MODELGUARD_SCHEMAS")
        .env_remove("MODELGUARD_RULES")
        .env_remove("MODELGUARD_LOG_LEVEL")
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("modelguard should run")
}

fn check(fixture: &Fixture, model: &Path, extra: &[&str]) -> Output {
    let mut args = vec![
        "check".to_string(),
        model.display().to_string(),
        "--class".to_string(),
        "Person".to_string(),
        "--schemas".to_string(),
        fixture.path("schemas").display().to_string(),
        "--rules".to_string(),
        fixture.path("rules.json").display().to_string(),
    ];
    args.extend(extra.iter().map(|arg| arg.to_string()));
    modelguard(args)
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn valid_model_exits_zero() {
    let fixture = Fixture::new("valid");
    let model = fixture.write(
        "model.json",
        r#"{"FirstName": "Ada", "LastName": "Lovelace", "Age": null,
            "Address": {"Street": "Main", "Zip": "12345"},
            "Items": [{"Name": "pen"}]}"#,
    );

    let output = check(&fixture, &model, &[]);
    assert_eq!(output.status.code(), Some(0));

    let json = stdout_json(&output);
    assert_eq!(json["valid"], true);
    assert_eq!(json["class"], "Person");
    assert!(json["schema_id"]
        .as_str()
        .unwrap()
        .ends_with("check-result.schema.json"));
    assert_eq!(json["messages"], serde_json::json!([]));
}

#[test]
fn invalid_model_exits_60_with_mirrored_graph() {
    let fixture = Fixture::new("invalid");
    let model = fixture.write(
        "model.json",
        r#"{"FirstName": "", "LastName": "Test",
            "Address": {"Zip": "abc"},
            "Items": []}"#,
    );

    let output = check(&fixture, &model, &[]);
    assert_eq!(output.status.code(), Some(60));

    let json = stdout_json(&output);
    assert_eq!(json["valid"], false);
    let fields = &json["errors"]["fields"];
    assert_eq!(fields["FirstName"], serde_json::json!(["FirstName is required"]));
    assert_eq!(fields["LastName"], serde_json::json!([]));
    assert_eq!(
        fields["Address"]["fields"]["Street"],
        serde_json::json!(["Street is required"])
    );
    assert_eq!(fields["Address"]["fields"]["Zip"].as_array().unwrap().len(), 1);
    assert_eq!(
        fields["Items"],
        serde_json::json!({
            "errors": ["must have at least one entry when empty"],
            "items": []
        })
    );
}

#[test]
fn scope_limits_reported_paths() {
    let fixture = Fixture::new("scope");
    let model = fixture.write(
        "model.json",
        r#"{"FirstName": "", "Address": {"Street": ""}, "Items": [{"Name": ""}]}"#,
    );

    let output = check(&fixture, &model, &["--scope", ".Address.Street"]);
    assert_eq!(output.status.code(), Some(60));

    let json = stdout_json(&output);
    assert_eq!(
        json["messages"],
        serde_json::json!([{ "path": ".Address.Street", "message": "Street is required" }])
    );
    assert_eq!(json["scope"], ".Address.Street");
}

#[test]
fn original_snapshot_is_accepted() {
    let fixture = Fixture::new("original");
    let model = fixture.write(
        "model.json",
        r#"{"FirstName": "Ada", "LastName": "L", "Items": [{"Name": "a"}]}"#,
    );
    let original = fixture.write("original.json", r#"{"FirstName": "Ada"}"#);

    let output = check(
        &fixture,
        &model,
        &["--original", original.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn rules_only_check_without_schemas() {
    let fixture = Fixture::new("rules-only");
    let model = fixture.write("model.json", r#"{"FirstName": "Ada"}"#);

    let output = modelguard([
        "check".to_string(),
        model.display().to_string(),
        "--class".to_string(),
        "Person".to_string(),
        "--rules".to_string(),
        fixture.path("rules.json").display().to_string(),
    ]);
    assert_eq!(output.status.code(), Some(60));

    let json = stdout_json(&output);
    assert_eq!(
        json["errors"]["fields"]["LastName"],
        serde_json::json!(["LastName is required"])
    );
}

#[test]
fn malformed_model_exits_60() {
    let fixture = Fixture::new("malformed");
    let model = fixture.write("model.json", "{ not json");

    let output = check(&fixture, &model, &[]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid JSON"));
}

#[test]
fn unknown_class_exits_64() {
    let fixture = Fixture::new("unknown-class");
    let model = fixture.write("model.json", "{}");

    let output = modelguard([
        "check".to_string(),
        model.display().to_string(),
        "--class".to_string(),
        "Invoice".to_string(),
        "--schemas".to_string(),
        fixture.path("schemas").display().to_string(),
    ]);
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown class Invoice"));
}

#[test]
fn check_without_sources_exits_64() {
    let fixture = Fixture::new("no-sources");
    let model = fixture.write("model.json", "{}");

    let output = modelguard([
        "check".to_string(),
        model.display().to_string(),
        "--class".to_string(),
        "Person".to_string(),
    ]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_model_file_exits_64() {
    let fixture = Fixture::new("missing-model");
    let output = check(&fixture, &fixture.path("absent.json"), &[]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn required_lists_rule_fields() {
    let fixture = Fixture::new("required");
    let output = modelguard([
        "required".to_string(),
        "--class".to_string(),
        "Person".to_string(),
        "--rules".to_string(),
        fixture.path("rules.json").display().to_string(),
    ]);
    assert_eq!(output.status.code(), Some(0));

    let json = stdout_json(&output);
    assert_eq!(
        json["fields"],
        serde_json::json!({ "FirstName": true, "Items": false, "LastName": true })
    );
}

#[test]
fn invalid_rule_file_exits_60() {
    let fixture = Fixture::new("bad-rules");
    let rules = fixture.write("bad.json", r#"{"Person": {"Name": {"rule": "email"}}}"#);

    let output = modelguard([
        "required".to_string(),
        "--class".to_string(),
        "Person".to_string(),
        "--rules".to_string(),
        rules.display().to_string(),
    ]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn version_reports_name() {
    let output = modelguard(["version"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["name"], "modelguard");
    assert!(json.get("build").is_none());

    let output = Command::new(env!("CARGO_BIN_EXE_modelguard"))
        .args(["--format", "pretty", "version", "--extended"])
        .output()
        .expect("modelguard should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: modelguard"));
    assert!(stdout.contains("rule_kinds: required, min, max"));
}
