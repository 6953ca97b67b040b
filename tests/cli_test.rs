//! CLI integration tests for the formgen binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("formgen"))
}

// Helper to create a temp file
fn write_temp_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// A small schema set: a form referencing a shared address document.
fn schema_dir(dir: &TempDir) -> PathBuf {
    let schemas = dir.path().join("schemas");
    fs::create_dir_all(&schemas).unwrap();
    write_temp_file(
        &schemas,
        "address.json",
        r#"{
            "$id": "address",
            "type": "object",
            "properties": {
                "street": { "type": "string", "maxLength": 80 },
                "city": { "type": "string" },
                "province": { "type": "string", "enum": ["AB", "BC", "MB", "NB", "ON"] }
            },
            "required": ["street"]
        }"#,
    );
    write_temp_file(
        &schemas,
        "permit.json",
        r##"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": "permit",
            "type": "object",
            "properties": {
                "applicant": { "type": "string", "description": "Full legal name" },
                "mailing": { "$ref": "address" },
                "alias": { "$ref": "#/properties/applicant" },
                "agree": { "type": "boolean", "title": "I accept the terms" }
            },
            "required": ["applicant"]
        }"##,
    );
    schemas
}

mod generate_command {
    use super::*;

    #[test]
    fn writes_pdf_named_after_form() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let out = dir.path().join("out");

        cmd()
            .args(["generate", "permit", "--schemas"])
            .arg(&schemas)
            .arg("--output")
            .arg(&out)
            .assert()
            .success()
            .stdout(predicate::str::contains("permit.pdf"));

        let bytes = fs::read(out.join("permit.pdf")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn second_run_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let out = dir.path().join("out");

        for _ in 0..2 {
            cmd()
                .args(["generate", "permit", "--schemas"])
                .arg(&schemas)
                .arg("--output")
                .arg(&out)
                .assert()
                .success();
        }

        assert!(out.join("permit.pdf").exists());
        assert!(out.join("permit_1.pdf").exists());
    }

    #[test]
    fn unknown_form_fails_without_output() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let out = dir.path().join("out");

        cmd()
            .args(["generate", "nope", "--schemas"])
            .arg(&schemas)
            .arg("--output")
            .arg(&out)
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("unknown schema id: nope"));

        assert!(!out.join("nope.pdf").exists());
    }

    #[test]
    fn broken_schema_is_schema_error() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        write_temp_file(&schemas, "permit.json", "{ broken");

        cmd()
            .args(["generate", "permit", "--schemas"])
            .arg(&schemas)
            .arg("--output")
            .arg(dir.path().join("out"))
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("cannot generate permit: schema could not be parsed"));
    }

    #[test]
    fn missing_schema_dir_is_io_error() {
        let dir = TempDir::new().unwrap();

        cmd()
            .args(["generate", "permit", "--schemas"])
            .arg(dir.path().join("missing"))
            .assert()
            .failure()
            .code(3)
            .stderr(predicate::str::contains("not a directory"));
    }

    #[test]
    fn config_file_drives_layout() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let out = dir.path().join("out");
        let config = write_temp_file(
            dir.path(),
            "forms.json",
            r#"{
                "permit": {
                    "title": "Street Permit",
                    "modules": ["header", "footer", "certification"],
                    "section_order": ["header", "mailing", "applicant", "certification"],
                    "fields": { "mailing": { "label": "Mailing Address", "font": "bold" } },
                    "fee": 15
                }
            }"#,
        );

        cmd()
            .args(["generate", "permit", "--schemas"])
            .arg(&schemas)
            .arg("--output")
            .arg(&out)
            .arg("--config")
            .arg(&config)
            .assert()
            .success();

        assert!(out.join("permit.pdf").exists());
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let config = write_temp_file(dir.path(), "forms.json", r#"{"permit": {"modules": ["nope"]}}"#);

        cmd()
            .args(["generate", "permit", "--schemas"])
            .arg(&schemas)
            .arg("--config")
            .arg(&config)
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("invalid config"));
    }
}

mod resolve_command {
    use super::*;

    #[test]
    fn resolves_flattens_and_cleans() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);

        cmd()
            .args(["resolve", "permit", "--schemas"])
            .arg(&schemas)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""alias":{"type":"string","description":"Full legal name"}"#))
            .stdout(predicate::str::contains(r#""street":{"type":"string","maxLength":80}"#))
            .stdout(predicate::str::contains("$id").not())
            .stdout(predicate::str::contains("required").not());
    }

    #[test]
    fn custom_exclude_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);

        cmd()
            .args(["resolve", "permit", "--exclude", "description", "--schemas"])
            .arg(&schemas)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""$id":"permit""#))
            .stdout(predicate::str::contains("Full legal name").not());
    }

    #[test]
    fn refs_only_keeps_properties() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);

        cmd()
            .args(["resolve", "permit", "--refs-only", "--schemas"])
            .arg(&schemas)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""properties""#))
            .stdout(predicate::str::contains("$ref").not());
    }

    #[test]
    fn pretty_output_to_file() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let output = dir.path().join("tree.json");

        cmd()
            .args(["resolve", "permit", "--pretty", "--schemas"])
            .arg(&schemas)
            .arg("--output")
            .arg(&output)
            .assert()
            .success();

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("{\n"));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(value.get("mailing").is_some());
    }

    #[test]
    fn unresolved_ref_becomes_marker() {
        let dir = TempDir::new().unwrap();
        let schemas = dir.path().join("schemas");
        fs::create_dir_all(&schemas).unwrap();
        write_temp_file(
            &schemas,
            "form.json",
            r#"{"$id": "form", "properties": {"owner": {"$ref": "person"}}}"#,
        );

        cmd()
            .args(["resolve", "form", "--schemas"])
            .arg(&schemas)
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#""owner":{"$ref":"person","error":"unknown schema id: person"}"#,
            ));
    }

    #[test]
    fn config_maps_form_to_schema() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let config = write_temp_file(dir.path(), "forms.json", r#"{"home": {"schema": "address"}}"#);

        cmd()
            .args(["resolve", "home", "--schemas"])
            .arg(&schemas)
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""street":{"type":"string","maxLength":80}"#));
    }

    #[test]
    fn unknown_form_exit_code() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);

        cmd()
            .args(["resolve", "nope", "--schemas"])
            .arg(&schemas)
            .assert()
            .failure()
            .code(2);
    }
}

mod list_command {
    use super::*;

    #[test]
    fn lists_ids_with_configuration_state() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let config = write_temp_file(dir.path(), "forms.json", r#"{"permit": {"title": "Street Permit"}}"#);

        cmd()
            .args(["list", "--schemas"])
            .arg(&schemas)
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("address\t(unconfigured)"))
            .stdout(predicate::str::contains("permit\tStreet Permit"));
    }

    #[test]
    fn reports_skipped_files() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        write_temp_file(&schemas, "broken.json", "{ nope");

        cmd()
            .args(["list", "--schemas"])
            .arg(&schemas)
            .assert()
            .success()
            .stderr(predicate::str::contains("skipped"));
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn valid_directory_passes() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);

        cmd()
            .arg("lint")
            .arg(&schemas)
            .assert()
            .success()
            .stdout(predicate::str::contains("2 files checked, all passed"));
    }

    #[test]
    fn syntax_error_fails() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        write_temp_file(&schemas, "broken.json", "{ nope");

        cmd()
            .arg("lint")
            .arg(&schemas)
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("E001"));
    }

    #[test]
    fn json_format() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        write_temp_file(
            &schemas,
            "extra.json",
            r#"{"$id": "extra", "properties": {"x": {"$ref": "missing"}}}"#,
        );

        let output = cmd()
            .args(["lint", "--format", "json"])
            .arg(&schemas)
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();

        let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(result["files_checked"], 3);
        assert_eq!(result["errors"], 1);
        let codes: Vec<&str> = result["results"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|r| r["diagnostics"].as_array().into_iter().flatten())
            .filter_map(|d| d["code"].as_str())
            .collect();
        assert_eq!(codes, ["E002"]);
    }

    #[test]
    fn strict_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        let schemas = dir.path().join("schemas");
        fs::create_dir_all(&schemas).unwrap();
        write_temp_file(&schemas, "noid.json", r#"{"type": "object"}"#);

        cmd().arg("lint").arg(&schemas).assert().success();

        cmd()
            .args(["lint", "--strict"])
            .arg(&schemas)
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("W001"));
    }

    #[test]
    fn missing_path() {
        cmd()
            .args(["lint", "/definitely/not/here"])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("path not found"));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn valid_payload() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let payload = write_temp_file(
            dir.path(),
            "payload.json",
            r#"{"applicant": "Ada Lovelace", "mailing": {"street": "1 Main St", "province": "BC"}}"#,
        );

        cmd()
            .arg("validate")
            .arg(&payload)
            .args(["--form", "permit", "--schemas"])
            .arg(&schemas)
            .assert()
            .success()
            .stdout(predicate::str::contains("Valid"));
    }

    #[test]
    fn invalid_payload_json_output() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let payload = write_temp_file(
            dir.path(),
            "payload.json",
            r#"{"applicant": "Ada", "mailing": {"province": "QC"}}"#,
        );

        let output = cmd()
            .arg("validate")
            .arg(&payload)
            .args(["--form", "permit", "--json", "--schemas"])
            .arg(&schemas)
            .assert()
            .failure()
            .code(1)
            .get_output()
            .stdout
            .clone();

        let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(result["valid"], false);
        let paths: Vec<&str> = result["errors"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["path"].as_str())
            .collect();
        assert!(paths.contains(&"/mailing/province"));
        assert!(paths.contains(&"/mailing"));
    }

    #[test]
    fn unknown_form() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let payload = write_temp_file(dir.path(), "payload.json", "{}");

        cmd()
            .arg("validate")
            .arg(&payload)
            .args(["--form", "nope", "--schemas"])
            .arg(&schemas)
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("unknown schema id"));
    }

    #[test]
    fn missing_payload_file() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);

        cmd()
            .arg("validate")
            .arg(dir.path().join("missing.json"))
            .args(["--form", "permit", "--schemas"])
            .arg(&schemas)
            .assert()
            .failure()
            .code(3);
    }
}

mod verbosity {
    use super::*;

    #[test]
    fn verbose_logs_written_file() {
        let dir = TempDir::new().unwrap();
        let schemas = schema_dir(&dir);
        let out = dir.path().join("out");

        cmd()
            .args(["-v", "generate", "permit", "--schemas"])
            .arg(&schemas)
            .arg("--output")
            .arg(&out)
            .env_remove("RUST_LOG")
            .assert()
            .success()
            .stderr(predicate::str::contains("wrote permit"));
    }
}
