use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn fhc(store: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fhc").unwrap();
    cmd.arg("--store-dir")
        .arg(store)
        .env_remove("FHC_HOME")
        .env_remove("FHC_HISTORY_BACKEND")
        .env_remove("FHC_HISTORY_JSONL")
        .env_remove("FHC_HISTORY_DB");
    cmd
}

fn add(store: &Path, host: &str, name: &str, kind: &str, at: &str, value: &str) {
    fhc(store)
        .args(["add", "--host", host, "--name", name, "--kind", kind, "--at", at, value])
        .assert()
        .success();
}

fn sample_line(id: u64, value: &str) -> String {
    format!(
        r#"{{"id":{id},"host":"a.com","name":"note","kind":"textarea","value":"{value}","first_used":1,"last_used":2,"use_count":1,"source":"test"}}"#
    )
}

fn seed(store: &Path) {
    add(store, "a.com", "user", "textarea", "2024-05-01T10:00:00.000", "<b>alice</b>");
    add(store, "b.com", "user", "textarea", "2024-05-02T10:00:00.000", "bob");
    add(store, "a.com", "pwd", "input", "2024-05-03T10:00:00.000", "hunter2");
}

#[test]
fn add_prints_assigned_ids_and_bumps_duplicates() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fhc(dir.path())
        .args(["add", "--host", "a.com", "--name", "q", "hello"])
        .assert()
        .success()
        .stdout("1\n");
    fhc(dir.path())
        .args(["add", "--host", "a.com", "--name", "q", "hello"])
        .assert()
        .success()
        .stdout("1\n");
    fhc(dir.path())
        .args(["add", "--host", "a.com", "--name", "q", "other"])
        .assert()
        .success()
        .stdout("2\n");
    fhc(dir.path())
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(contains(r#""use_count": 2"#));
    Ok(())
}

#[test]
fn list_filters_by_field_and_host() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed(dir.path());
    add(dir.path(), "c.org", "bio", "html", "2024-05-04T10:00:00.000", "about me");

    fhc(dir.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("about me").and(contains("2024-05-01 10:00:00")));
    fhc(dir.path())
        .args(["list", "--field", "bio", "--host", "b.com"])
        .assert()
        .success()
        .stdout(contains("about me").and(contains("bob")).and(contains("alice").not()));
    Ok(())
}

#[test]
fn suggest_ranks_host_then_recent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed(dir.path());
    let out = fhc(dir.path())
        .args(["suggest", "--host", "a.com"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let candidates: serde_json::Value = serde_json::from_slice(&out)?;
    let ids: Vec<u64> = candidates
        .as_array()
        .map(|a| a.iter().filter_map(|c| c["entry_id"].as_u64()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(candidates[0]["label"], "alice");
    assert_eq!(candidates[0]["source_kind"], "byHost");
    assert_eq!(candidates[1]["source_kind"], "byRecency");
    Ok(())
}

#[test]
fn menu_preview_lists_items() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed(dir.path());
    fhc(dir.path())
        .args(["menu", "--url", "https://a.com/signup"])
        .assert()
        .success()
        .stdout(
            contains("editfldbyHost\t--- This site: ---\n")
                .and(contains("editfld1\t[24-05-01 10:00] alice\n"))
                .and(contains("editfldbyRecency\t--- Recently used: ---\n"))
                .and(contains("editfld2\t[24-05-02 10:00] bob\n"))
                .and(contains("editfldMore\tMore...\n"))
                .and(contains("editfld3").not()),
        );
    Ok(())
}

#[test]
fn restore_sends_value_to_page() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed(dir.path());
    fhc(dir.path())
        .args(["restore", "--url", "https://a.com/", "editfld1"])
        .assert()
        .success()
        .stdout(contains(
            r#"{"action":"formfieldValueResponseSingle","id":"","name":"user","nodeName":"textarea","value":"<b>alice</b>"}"#,
        ));
    fhc(dir.path())
        .args(["restore", "--url", "https://a.com/", "editfldMore"])
        .assert()
        .success()
        .stdout("open manager\n");
    fhc(dir.path())
        .args(["restore", "--url", "https://a.com/", "editfld99"])
        .assert()
        .failure()
        .stderr(contains("entry 99 not found"));
    Ok(())
}

#[test]
fn rm_missing_entry_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed(dir.path());
    fhc(dir.path()).args(["rm", "2"]).assert().success();
    fhc(dir.path())
        .args(["rm", "2"])
        .assert()
        .failure()
        .stderr(contains("entry 2 not found"));
    Ok(())
}

#[test]
fn export_import_between_stores() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    let dst = tempdir()?;
    seed(src.path());
    let exported = fhc(src.path())
        .arg("export")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8(exported.clone())?.lines().count(), 3);

    fhc(dst.path())
        .arg("import")
        .write_stdin(exported)
        .assert()
        .success()
        .stdout(contains("Imported 3 entries"));
    fhc(dst.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(contains(r#""total":3"#).and(contains(r#""sensitive":1"#)));
    Ok(())
}

#[test]
fn sqlite_backend_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fhc(dir.path())
        .env("FHC_HISTORY_BACKEND", "sqlite")
        .args(["add", "--host", "a.com", "--name", "q", "hello"])
        .assert()
        .success()
        .stdout("1\n");
    assert!(dir.path().join("history.db").exists());
    assert!(!dir.path().join("history.jsonl").exists());
    fhc(dir.path())
        .env("FHC_HISTORY_BACKEND", "sqlite")
        .args(["suggest", "--host", "a.com"])
        .assert()
        .success()
        .stdout(contains(r#""label":"hello""#));
    Ok(())
}

#[test]
fn config_file_limits_suggestions() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    for (i, value) in ["one", "two", "three"].iter().enumerate() {
        add(
            dir.path(),
            "a.com",
            "n",
            "textarea",
            &format!("2024-05-0{}T10:00:00.000", i + 1),
            value,
        );
    }
    fs::write(dir.path().join("config.toml"), "max_per_group = 2\n")?;
    let out = fhc(dir.path())
        .args(["suggest", "--host", "a.com"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let candidates: serde_json::Value = serde_json::from_slice(&out)?;
    assert_eq!(candidates.as_array().map(Vec::len), Some(2));
    assert_eq!(candidates[0]["label"], "three");
    Ok(())
}

#[test]
fn history_compact_removes_duplicates() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("history.jsonl");
    let output = dir.path().join("out.jsonl");
    let data = [
        sample_line(1, "one"),
        sample_line(2, "two"),
        "garbage".to_string(),
        sample_line(1, "one again"),
    ]
    .join("\n");
    fs::write(&input, data + "\n")?;

    fhc(dir.path())
        .args([
            "compact",
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Read 4 lines, wrote 2 entries"));

    let out_data = fs::read_to_string(&output)?;
    assert_eq!(out_data.lines().count(), 2);
    assert!(out_data.contains("one again"));
    Ok(())
}

#[test]
fn history_migrate_imports_entries() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let jsonl = dir.path().join("history.jsonl");
    let sqlite = dir.path().join("history.db");
    let data = [sample_line(1, "one"), sample_line(2, "two")].join("\n");
    fs::write(&jsonl, data + "\n")?;

    fhc(dir.path())
        .args([
            "migrate",
            "--jsonl",
            jsonl.to_str().unwrap(),
            "--sqlite",
            sqlite.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Migrated 2 entries"));
    assert!(sqlite.exists());

    fhc(dir.path())
        .env("FHC_HISTORY_BACKEND", "sqlite")
        .args(["show", "2"])
        .assert()
        .success()
        .stdout(contains(r#""value": "two""#));
    Ok(())
}
