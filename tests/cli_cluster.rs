use assert_cmd::prelude::*;
use std::process::Command;

#[test]
fn command_cluster() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("synteny")?;
    let output = cmd
        .arg("cluster")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp2.genes.filtered")
        .arg("tests/synteny/sp1_sp2.synteny_score")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert_eq!(stdout.lines().filter(|l| l.starts_with("# cluster")).count(), 2);
    assert_eq!(stdout.lines().count(), 11);
    assert_eq!(stdout.lines().next().unwrap(), "# cluster score 20.974");

    // anchors sorted by position, the off-diagonal one included
    assert!(stdout.contains("chr1\t1\tctgA\t1\t3.722\nchr1\t1\tctgA\t2\t1.600\n"));
    assert!(stdout.contains("# cluster score 7.720\nchr2\t0\tctgB\t2\t2.880\n"));

    // below the synteny cutoff
    assert!(!stdout.contains("chr2\t3\tctgA"));

    Ok(())
}

#[test]
fn command_cluster_min_size() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("synteny")?;
    let output = cmd
        .arg("cluster")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp2.genes.filtered")
        .arg("tests/synteny/sp1_sp2.synteny_score")
        .arg("--min-size")
        .arg("4")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 7);
    assert!(!stdout.contains("chr2"));

    Ok(())
}

#[test]
fn command_cluster_synteny_cutoff() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("synteny")?;
    let output = cmd
        .arg("cluster")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp2.genes.filtered")
        .arg("tests/synteny/sp1_sp2.synteny_score")
        .arg("--synteny-cutoff")
        .arg("3.0")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 5);
    assert_eq!(stdout.lines().next().unwrap(), "# cluster score 16.494");
    assert!(!stdout.contains("ctgA\t2\t"));

    Ok(())
}

#[test]
fn command_cluster_self() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let scores = temp.path().join("sp1_sp1.synteny_score");
    // both triangles of a self comparison
    std::fs::write(
        &scores,
        "a01\ta07\t1.000\t3.000\na02\ta08\t1.000\t3.000\na03\ta09\t1.000\t3.000\n\
         a07\ta01\t1.000\t3.000\na08\ta02\t1.000\t3.000\na09\ta03\t1.000\t3.000\n",
    )?;

    let mut cmd = Command::cargo_bin("synteny")?;
    let output = cmd
        .arg("cluster")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg("tests/synteny/sp1.genes.filtered")
        .arg(&scores)
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 4);
    assert!(stdout.contains("chr1\t0\tchr2\t0\t3.000"));
    assert!(!stdout.contains("chr2\t0\tchr1"));

    Ok(())
}
