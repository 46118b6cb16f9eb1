// Drives the compiled binary through its non-interactive subcommands.
// HOME points at a scratch directory so logs and state stay out of the user's home.

use assert_cmd::Command;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn run(&self, args: &[&str]) -> (bool, String) {
        let db = self.dir.path().join("mathoff.db");
        let config = self.dir.path().join("config.json");
        let output = Command::cargo_bin("mathoff")
            .unwrap()
            .env("HOME", self.dir.path())
            .arg("--db")
            .arg(&db)
            .arg("--config")
            .arg(&config)
            .args(args)
            .output()
            .unwrap();
        (
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
        )
    }
}

#[test]
fn login_whoami_logout() {
    let sb = Sandbox::new();

    let (ok, out) = sb.run(&["whoami"]);
    assert!(ok);
    assert!(out.contains("Not logged in."));

    assert!(sb.run(&["login", "secret-token"]).0);
    let (_, out) = sb.run(&["whoami"]);
    assert!(out.contains("Logged in to MathOff."));

    assert!(sb.run(&["logout"]).0);
    let (_, out) = sb.run(&["whoami"]);
    assert!(out.contains("Not logged in."));
}

#[test]
fn record_then_stats_and_scores() {
    let sb = Sandbox::new();

    assert!(sb.run(&["record", "10", "--level", "2", "--operation", "+"]).0);
    assert!(sb.run(&["record", "-3", "--mode", "timed"]).0);

    let (ok, out) = sb.run(&["stats"]);
    assert!(ok);
    assert!(out.contains("Games: 2"));
    assert!(out.contains("High score: 10"));

    let (_, out) = sb.run(&["scores"]);
    assert!(out.contains("Game 1"));
    assert!(out.contains("Level: 2"));
    assert!(out.contains("Mode: timed"));
    assert!(out.contains("Score: -3 points"));
}

#[test]
fn clear_recent_keeps_statistics() {
    let sb = Sandbox::new();
    assert!(sb.run(&["record", "7"]).0);

    assert!(sb.run(&["clear", "--recent", "--yes"]).0);

    let (_, out) = sb.run(&["scores"]);
    assert!(out.contains("No scores recorded."));
    assert!(out.contains("Games: 1"));

    let (_, out) = sb.run(&["scores", "--history"]);
    assert!(out.contains("Score: 7 points"));

    assert!(sb.run(&["clear", "--yes"]).0);
    let (_, out) = sb.run(&["stats"]);
    assert!(out.contains("Games: 0"));
    assert!(out.contains("High score: 0"));
}

#[test]
fn ephemeral_storage_forgets_between_runs() {
    let sb = Sandbox::new();
    assert!(sb.run(&["--ephemeral", "record", "5"]).0);
    let (_, out) = sb.run(&["--ephemeral", "stats"]);
    assert!(out.contains("Games: 0"));
}

#[test]
fn config_changes_are_saved() {
    let sb = Sandbox::new();
    let scores = sb.dir.path().join("elsewhere.db");

    let (ok, out) = sb.run(&["config"]);
    assert!(ok);
    assert!(out.contains("Log filter: info"));
    assert!(!sb.dir.path().join("config.json").exists());

    let (ok, _) = sb.run(&[
        "config",
        "--set-db",
        scores.to_str().unwrap(),
        "--log-filter",
        "mathoff=debug",
    ]);
    assert!(ok);

    let (_, out) = sb.run(&["config"]);
    assert!(out.contains(&format!("Database: {}", scores.display())));
    assert!(out.contains("Log filter: mathoff=debug"));
}
