#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn keiko(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("keiko").unwrap();
    cmd.current_dir(dir.path()).env("KEIKO_ROOT", dir.path());
    cmd
}

fn init_dojo(dir: &TempDir) {
    keiko(dir)
        .args(["init", "--name", "Test Dojo"])
        .assert()
        .success();
}

fn json_of(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// keiko init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);
    assert!(dir.path().join(".keiko").is_dir());
    let config = std::fs::read_to_string(dir.path().join(".keiko/config.yaml")).unwrap();
    assert!(config.contains("Test Dojo"));
    assert!(!dir.path().join(".keiko/catalog.yaml").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);
    keiko(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:"));
}

#[test]
fn init_can_write_catalog() {
    let dir = TempDir::new().unwrap();
    keiko(&dir)
        .args(["init", "--write-catalog"])
        .assert()
        .success();
    assert!(dir.path().join(".keiko/catalog.yaml").exists());
    keiko(&dir)
        .args(["catalog", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".keiko/catalog.yaml"));
}

#[test]
fn commands_require_init() {
    let dir = TempDir::new().unwrap();
    keiko(&dir)
        .args(["snapshot", "aiko"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("keiko init"));
}

// ---------------------------------------------------------------------------
// keiko complete
// ---------------------------------------------------------------------------

#[test]
fn complete_then_repeat_same_day() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);

    keiko(&dir)
        .args(["complete", "aiko", "respect_salut", "--date", "2026-10-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+10 XP"))
        .stdout(predicate::str::contains("trophy unlocked: first_keiko"));

    keiko(&dir)
        .args(["complete", "aiko", "respect_salut", "--date", "2026-10-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already completed"));

    let json = json_of(keiko(&dir).args([
        "--json",
        "complete",
        "aiko",
        "respect_salut",
        "--date",
        "2026-10-01",
    ]));
    assert_eq!(json["outcome"], "already_completed");
    assert_eq!(json["snapshot"]["global_xp"], 10);
}

#[test]
fn complete_json_reports_diff() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);
    keiko(&dir)
        .args(["complete", "aiko", "respect_salut", "--date", "2026-10-01"])
        .assert()
        .success();

    let json = json_of(keiko(&dir).args([
        "--json",
        "complete",
        "aiko",
        "courage_ukemi",
        "--date",
        "2026-10-02",
    ]));
    assert_eq!(json["outcome"], "completed");
    assert_eq!(json["diff"]["xp_added"], 15);
    assert_eq!(json["snapshot"]["global_xp"], 25);
    assert_eq!(json["snapshot"]["streak"], 2);
    assert_eq!(json["snapshot"]["virtues"]["respect"]["xp"], 10);
}

#[test]
fn complete_unknown_challenge_fails() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);
    keiko(&dir)
        .args(["complete", "aiko", "juggling"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown challenge: juggling"));
}

#[test]
fn complete_rejects_bad_date() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);
    keiko(&dir)
        .args(["complete", "aiko", "meditation", "--date", "yesterday"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// keiko snapshot / history / leaderboard
// ---------------------------------------------------------------------------

#[test]
fn snapshot_of_new_practitioner_is_baseline() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);
    let json = json_of(keiko(&dir).args(["--json", "snapshot", "aiko"]));
    assert_eq!(json["global_xp"], 0);
    assert_eq!(json["global_level"]["rank"], 1);
    assert_eq!(json["streak_status"], "lapsed");

    keiko(&dir)
        .args(["snapshot", "aiko"])
        .assert()
        .success()
        .stdout(predicate::str::contains("respect"))
        .stdout(predicate::str::contains("none yet"))
        .stdout(predicate::str::contains("50 to go"));
}

#[test]
fn history_lists_completions() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);
    keiko(&dir)
        .args(["complete", "aiko", "open_mat", "--date", "2026-10-12"])
        .assert()
        .success();
    keiko(&dir)
        .args(["history", "aiko"])
        .assert()
        .success()
        .stdout(predicate::str::contains("open_mat"))
        .stdout(predicate::str::contains("2026-W42"));

    let json = json_of(keiko(&dir).args(["--json", "history", "aiko"]));
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[test]
fn leaderboard_orders_by_xp() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);
    for (who, challenge) in [("aiko", "meditation"), ("ben", "open_mat")] {
        keiko(&dir)
            .args(["complete", who, challenge, "--date", "2026-10-12"])
            .assert()
            .success();
    }
    let json = json_of(keiko(&dir).args(["--json", "leaderboard"]));
    assert_eq!(json[0]["practitioner"], "ben");
    assert_eq!(json[1]["practitioner"], "aiko");

    let json = json_of(keiko(&dir).args(["--json", "leaderboard", "--limit", "1"]));
    assert_eq!(json.as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// keiko catalog
// ---------------------------------------------------------------------------

#[test]
fn catalog_listings() {
    let dir = TempDir::new().unwrap();
    keiko(&dir)
        .args(["catalog", "virtues"])
        .assert()
        .success()
        .stdout(predicate::str::contains("benevolence"));

    let json = json_of(keiko(&dir).args(["--json", "catalog", "challenges", "--scope", "weekly"]));
    assert!(json
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["scope"] == "weekly"));

    keiko(&dir)
        .args(["catalog", "badges", "courage"])
        .assert()
        .success()
        .stdout(predicate::str::contains("courage_unbroken"));

    keiko(&dir)
        .args(["catalog", "badges", "patience"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown virtue"));

    keiko(&dir)
        .args(["catalog", "trophies"])
        .assert()
        .success()
        .stdout(predicate::str::contains("balanced_path"));

    keiko(&dir)
        .args(["catalog", "titles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Newcomer"));
}

#[test]
fn catalog_validate_builtin() {
    let dir = TempDir::new().unwrap();
    keiko(&dir)
        .args(["catalog", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("built-in"));
}

#[test]
fn catalog_validate_rejects_broken_ladder() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);
    std::fs::write(
        dir.path().join(".keiko/catalog.yaml"),
        "virtues:\n  - id: respect\n    name: Respect\n    levels:\n      - { rank: 1, name: A, xp_required: 10 }\nglobal_levels:\n  - { rank: 1, name: G, xp_required: 0 }\nchallenges: []\ntitles:\n  - { rank: 1, name: T, xp_required: 0 }\n",
    )
    .unwrap();
    keiko(&dir)
        .args(["catalog", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid catalog"));
}

// ---------------------------------------------------------------------------
// keiko config
// ---------------------------------------------------------------------------

#[test]
fn config_show_and_validate() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);
    keiko(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Dojo"));
    keiko(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No warnings"));
}

#[test]
fn config_validate_fails_on_errors() {
    let dir = TempDir::new().unwrap();
    init_dojo(&dir);
    std::fs::write(
        dir.path().join(".keiko/config.yaml"),
        "dojo:\n  name: Test Dojo\n  timezone_offset_minutes: 5000\n",
    )
    .unwrap();
    keiko(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}
