use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

fn bin() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("datalock"));
    for var in [
        "DATALOCK_PASSWORD",
        "DATALOCK_INPUT",
        "DATALOCK_BLOB",
        "DATALOCK_VERIFIER",
        "DATALOCK_ITERATIONS",
        "DATALOCK_VERIFIER_SALT",
        "DATALOCK_VERIFIER_DIGEST",
        "DATALOCK_VERIFIER_ITERATIONS",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

struct Paths {
    _dir: TempDir,
    input: PathBuf,
    blob: PathBuf,
    verifier: PathBuf,
}

fn paths() -> Paths {
    let dir = tempdir().unwrap();
    let input = dir.path().join("game_data.arrow");
    let blob = dir.path().join("public").join("game_data.arrow.enc");
    let verifier = dir.path().join("public").join("verifier.json");
    std::fs::write(&input, b"hello").unwrap();
    Paths {
        _dir: dir,
        input,
        blob,
        verifier,
    }
}

fn package(p: &Paths, password: &str) {
    bin()
        .env("DATALOCK_PASSWORD", password)
        .arg("package")
        .arg("--input")
        .arg(&p.input)
        .arg("--output")
        .arg(&p.blob)
        .arg("--verifier")
        .arg(&p.verifier)
        .arg("--iterations")
        .arg("1000")
        .assert()
        .success();
}

fn unlock(p: &Paths, password: &str) -> assert_cmd::assert::Assert {
    bin()
        .env("DATALOCK_PASSWORD", password)
        .arg("unlock")
        .arg("--verifier")
        .arg(&p.verifier)
        .arg("--blob")
        .arg(&p.blob)
        .assert()
}

fn strip_fingerprint(verifier: &Path) {
    let mut record: serde_json::Value =
        serde_json::from_slice(&std::fs::read(verifier).unwrap()).unwrap();
    record.as_object_mut().unwrap().remove("blob_sha256");
    std::fs::write(verifier, serde_json::to_vec(&record).unwrap()).unwrap();
}

#[test]
fn package_writes_blob_and_verifier() {
    let p = paths();

    bin()
        .env("DATALOCK_PASSWORD", "family2025")
        .arg("package")
        .arg("--input")
        .arg(&p.input)
        .arg("--output")
        .arg(&p.blob)
        .arg("--verifier")
        .arg(&p.verifier)
        .arg("--iterations")
        .arg("1000")
        .assert()
        .success()
        .stdout(predicate::str::contains("packaged 5 bytes"))
        .stdout(predicate::str::contains("(49 bytes)"))
        .stdout(predicate::str::contains("1000 iterations"));

    assert_eq!(std::fs::read(&p.blob).unwrap().len(), 49);

    let record: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&p.verifier).unwrap()).unwrap();
    assert_eq!(record["iterations"], 1000);
    assert_eq!(record["salt"].as_str().unwrap().len(), 32);
    assert_eq!(record["digest"].as_str().unwrap().len(), 64);
    assert!(record["blob_sha256"].is_string());
}

#[test]
fn unlock_roundtrip_to_stdout() {
    let p = paths();
    package(&p, "family2025");

    unlock(&p, "family2025").success().stdout("hello");
}

#[test]
fn unlock_writes_out_file() {
    let p = paths();
    package(&p, "family2025");
    let out = p.input.with_file_name("decrypted.arrow");

    bin()
        .env("DATALOCK_PASSWORD", "family2025")
        .arg("unlock")
        .arg("--verifier")
        .arg(&p.verifier)
        .arg("--blob")
        .arg(&p.blob)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(std::fs::read(out).unwrap(), b"hello");
}

#[test]
fn wrong_password_is_rejected_by_verifier() {
    let p = paths();
    package(&p, "family2025");

    unlock(&p, "wrong")
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("authentication failed"));

    bin()
        .env("DATALOCK_PASSWORD", "wrong")
        .arg("verify")
        .arg("--verifier")
        .arg(&p.verifier)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("authentication failed"));
}

#[test]
fn verify_accepts_correct_password() {
    let p = paths();
    package(&p, "family2025");

    bin()
        .env("DATALOCK_PASSWORD", "family2025")
        .arg("verify")
        .arg("--verifier")
        .arg(&p.verifier)
        .assert()
        .success()
        .stdout(predicate::str::contains("password accepted"));
}

#[test]
fn verify_reads_record_from_environment() {
    let p = paths();
    package(&p, "family2025");
    let record: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&p.verifier).unwrap()).unwrap();

    bin()
        .env("DATALOCK_PASSWORD", "family2025")
        .env("DATALOCK_VERIFIER_SALT", record["salt"].as_str().unwrap())
        .env("DATALOCK_VERIFIER_DIGEST", record["digest"].as_str().unwrap())
        .env("DATALOCK_VERIFIER_ITERATIONS", "1000")
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("password accepted"));
}

#[test]
fn replaced_blob_is_caught_by_fingerprint() {
    let first = paths();
    let second = paths();
    package(&first, "family2025");
    package(&second, "family2025");

    std::fs::copy(&second.blob, &first.blob).unwrap();

    unlock(&first, "family2025")
        .code(1)
        .stderr(predicate::str::contains("does not match the verifier fingerprint"));
}

#[test]
fn mismatched_blob_without_fingerprint_is_integrity_error() {
    let first = paths();
    let second = paths();
    package(&first, "family2025");
    package(&second, "another-password");

    std::fs::copy(&second.blob, &first.blob).unwrap();
    strip_fingerprint(&first.verifier);

    unlock(&first, "family2025")
        .code(3)
        .stderr(predicate::str::contains("decryption failed"));
}

#[test]
fn tampered_blob_is_integrity_error() {
    let p = paths();
    package(&p, "family2025");
    strip_fingerprint(&p.verifier);

    let mut blob = std::fs::read(&p.blob).unwrap();
    let last = blob.len() - 1;
    blob[last] ^= 0x01;
    std::fs::write(&p.blob, blob).unwrap();

    unlock(&p, "family2025")
        .code(3)
        .stderr(predicate::str::contains("decryption failed"));
}

#[test]
fn undersized_blob_is_malformed() {
    let p = paths();
    package(&p, "family2025");
    strip_fingerprint(&p.verifier);
    std::fs::write(&p.blob, [0u8; 43]).unwrap();

    unlock(&p, "family2025")
        .code(1)
        .stderr(predicate::str::contains("malformed"));

    bin()
        .arg("inspect")
        .arg("--blob")
        .arg(&p.blob)
        .assert()
        .failure()
        .stderr(predicate::str::contains("43 bytes"));
}

#[test]
fn missing_blob_reports_cause() {
    let p = paths();
    package(&p, "family2025");
    std::fs::remove_file(&p.blob).unwrap();

    unlock(&p, "family2025")
        .code(1)
        .stderr(predicate::str::contains("failed to fetch encrypted blob"));
}

#[test]
fn package_fails_on_missing_input() {
    let p = paths();
    std::fs::remove_file(&p.input).unwrap();

    bin()
        .env("DATALOCK_PASSWORD", "family2025")
        .arg("package")
        .arg("--input")
        .arg(&p.input)
        .arg("--output")
        .arg(&p.blob)
        .arg("--verifier")
        .arg(&p.verifier)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));

    assert!(!p.blob.exists());
    assert!(!p.verifier.exists());
}

#[test]
fn package_rejects_zero_iterations() {
    let p = paths();

    bin()
        .env("DATALOCK_PASSWORD", "family2025")
        .arg("package")
        .arg("--input")
        .arg(&p.input)
        .arg("--output")
        .arg(&p.blob)
        .arg("--verifier")
        .arg(&p.verifier)
        .arg("--iterations")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("iterations"));
}

#[test]
fn inspect_shows_header_and_fingerprint_status() {
    let p = paths();
    package(&p, "family2025");
    let blob = std::fs::read(&p.blob).unwrap();

    bin()
        .arg("inspect")
        .arg("--blob")
        .arg(&p.blob)
        .arg("--verifier")
        .arg(&p.verifier)
        .assert()
        .success()
        .stdout(predicate::str::contains("size     49 bytes"))
        .stdout(predicate::str::contains(hex::encode(&blob[..16])))
        .stdout(predicate::str::contains(hex::encode(&blob[16..28])))
        .stdout(predicate::str::contains("5 plaintext + 16 tag"))
        .stdout(predicate::str::contains("verifier matches"));
}
