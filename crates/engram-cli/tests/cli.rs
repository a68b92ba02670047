use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn engram(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("engram").unwrap();
    cmd.current_dir(dir.path()).env("ENGRAM_AGENT", "it-agent");
    cmd
}

fn engram_ops(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("engram-ops").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

fn init_repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    git2::Repository::init(tmp.path()).unwrap();
    engram(&tmp).arg("init").assert().success();
    tmp
}

#[test]
fn init_is_idempotent_without_force() {
    let tmp = init_repo();
    engram(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already initialized"));
}

#[test]
fn commands_refuse_uninitialized_repo() {
    let tmp = TempDir::new().unwrap();
    git2::Repository::init(tmp.path()).unwrap();
    engram(&tmp)
        .args(["entity", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn entity_create_show_list_roundtrip() {
    let tmp = init_repo();

    let output = engram(&tmp)
        .args(["entity", "create", "task", "--title", "wire up login", "--priority", "high"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let id = String::from_utf8(output).unwrap().trim().to_string();

    engram(&tmp)
        .args(["entity", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("wire up login"));

    engram(&tmp)
        .args(["entity", "list", "--kind", "task"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wire up login"));
}

#[test]
fn question_blocks_until_operator_answers() {
    let tmp = init_repo();

    let task = create_task(&tmp, "pick a database");
    let question = {
        let output = engram(&tmp)
            .args(["question", "open", "postgres or sqlite?", "--blocks", &task])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        String::from_utf8(output).unwrap().trim().to_string()
    };

    engram(&tmp)
        .args(["entity", "show", &task])
        .assert()
        .success()
        .stdout(predicate::str::contains("blocked_pending_human_input"));

    // the agent surface has no answer verb at all
    engram(&tmp)
        .args(["question", "answer", &question, "sqlite"])
        .assert()
        .failure();

    engram_ops(&tmp)
        .args(["question", "answer", &question, "sqlite"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unblocked"));

    engram(&tmp)
        .args(["entity", "show", &task])
        .assert()
        .success()
        .stdout(predicate::str::contains("active"));
}

#[test]
fn validate_rejects_unreferenced_commit_message() {
    let tmp = init_repo();
    engram(&tmp)
        .args(["validate", "check", "--message", "fix things"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("no [<task-uuid>] reference"));
}

#[test]
fn hook_install_status_uninstall() {
    let tmp = init_repo();
    engram(&tmp)
        .args(["validate", "hook", "status"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("not installed"));

    engram(&tmp)
        .args(["validate", "hook", "install"])
        .assert()
        .success();
    engram(&tmp)
        .args(["validate", "hook", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("installed"));

    engram(&tmp)
        .args(["validate", "hook", "uninstall"])
        .assert()
        .success();
}

fn create_task(tmp: &TempDir, title: &str) -> String {
    let output = engram(tmp)
        .args(["entity", "create", "task", "--title", title])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).unwrap().trim().to_string()
}
