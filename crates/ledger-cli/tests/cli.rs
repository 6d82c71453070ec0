use assert_cmd::Command;
use predicates::prelude::*;

fn ledger_cli() -> Command {
    Command::cargo_bin("ledger-cli").expect("binary built")
}

#[test]
fn demo_reports_valid_chain() {
    ledger_cli()
        .args(["demo", "--difficulty", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Is blockchain valid? true"))
        .stdout(predicate::str::contains("Block #2:"))
        .stdout(predicate::str::contains("network -> Miner2: 10"));
}

#[test]
fn mine_prints_json_chain() {
    let output = ledger_cli()
        .args(["mine", "--difficulty", "1", "--tx", "A:B:50", "--miner", "M1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let json_start = stdout.find('{').unwrap();
    let doc: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();
    let txs = doc["blocks"][1]["transactions"].as_array().unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[1]["recipient"], "M1");
}

#[test]
fn strict_mode_rejects_negative_amount() {
    ledger_cli()
        .args(["mine", "--difficulty", "1", "--strict", "--tx", "A:B:-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("amount"));
}

#[test]
fn zero_difficulty_fails() {
    ledger_cli()
        .args(["demo", "--difficulty", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("difficulty"));
}

#[test]
fn config_file_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.json");
    std::fs::write(&path, r#"{ "difficulty": 1, "mining_reward": 7.0 }"#).unwrap();
    ledger_cli()
        .args(["mine", "--miner", "M9", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("network -> M9: 7"));
}
