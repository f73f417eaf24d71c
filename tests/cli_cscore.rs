use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn command_cscore() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("synteny")?;
    let output = cmd
        .arg("cscore")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp2.genes.filtered")
        .arg("tests/synteny/sp1_sp2.blast")
        .arg("tests/synteny/sp2_sp1.blast")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert_eq!(stdout.lines().count(), 9);
    assert_eq!(stdout.lines().next().unwrap(), "a01\tb01\t210.0\t1.000");
    // a04 is a tandem copy of a03
    assert!(stdout.contains("a03\tb03\t160.0\t1.000"));
    assert!(!stdout.contains("a04"));
    // x99 is not in the gene order
    assert!(!stdout.contains("x99"));
    assert!(stdout.contains("a10\tb01\t60.0\t0.286"));
    // not the best target of a02
    assert!(!stdout.contains("a02\tb05"));

    Ok(())
}

#[test]
fn command_cscore_all_targets() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("synteny")?;
    let output = cmd
        .arg("cscore")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp2.genes.filtered")
        .arg("tests/synteny/sp1_sp2.blast")
        .arg("tests/synteny/sp2_sp1.blast")
        .arg("--all-targets")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 10);
    assert!(stdout.contains("a02\tb05\t40.0\t0.222"));

    let mut cmd = Command::cargo_bin("synteny")?;
    let output = cmd
        .arg("cscore")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp2.genes.filtered")
        .arg("tests/synteny/sp1_sp2.blast")
        .arg("tests/synteny/sp2_sp1.blast")
        .arg("--all-targets")
        .arg("--cscore-cutoff")
        .arg("0.25")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 9);
    assert!(!stdout.contains("a02\tb05"));

    Ok(())
}

#[test]
fn command_cscore_one_direction() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("synteny")?;
    let output = cmd
        .arg("cscore")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp2.genes.filtered")
        .arg("tests/synteny/sp1_sp2.blast")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 9);
    assert!(stdout.contains("a01\tb01\t200.0\t1.000"));
    assert!(stdout.contains("a10\tb01\t60.0\t0.300"));

    Ok(())
}

#[test]
fn command_cscore_isoform() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let hits = temp.path().join("isoform.blast");
    std::fs::write(
        &hits,
        "a01.1\tb01.2\t90.0\t300\t1\t1e-50\t200\na02.1\tb02.1\t90.0\t300\t1\t1e-50\t180\n",
    )?;

    let mut cmd = Command::cargo_bin("synteny")?;
    let output = cmd
        .arg("cscore")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp2.genes.filtered")
        .arg(&hits)
        .output()?;
    assert_eq!(String::from_utf8(output.stdout)?.lines().count(), 0);

    let mut cmd = Command::cargo_bin("synteny")?;
    let output = cmd
        .arg("cscore")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp2.genes.filtered")
        .arg(&hits)
        .arg("--isoform")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.contains("a01\tb01\t200.0\t1.000"));

    Ok(())
}

#[test]
fn command_cscore_outfile() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let outfile = temp.path().join("sp1_sp2.cscore");

    let mut cmd = Command::cargo_bin("synteny")?;
    cmd.arg("cscore")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp2.genes.filtered")
        .arg("tests/synteny/sp1_sp2.blast")
        .arg("tests/synteny/sp2_sp1.blast")
        .arg("-o")
        .arg(&outfile)
        .assert()
        .success();

    let expected = std::fs::read_to_string("tests/synteny/sp1_sp2.cscore")?;
    assert_eq!(std::fs::read_to_string(&outfile)?, expected);

    Ok(())
}

#[test]
fn command_cscore_missing_file() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("synteny")?;
    cmd.arg("cscore")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp2.genes.filtered")
        .arg("tests/synteny/not_there.blast")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not open"));

    Ok(())
}
