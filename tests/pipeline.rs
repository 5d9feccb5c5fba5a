//! Aggregate, extract and compare on files, the way the three tools chain

use lingroup_tools::aggregate::{aggregate_lingroups, read_manifest};
use lingroup_tools::concordance::compare_phylogroups;
use lingroup_tools::phylogroup::{PhylogroupExtractor, PhylogroupLevel};
use lingroup_tools::table::{Table, COMMA, TAB};
use std::fs;
use tempfile::tempdir;

#[test]
fn aggregate_two_files_writes_one_header() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("A-x-r1.tsv"), "name\tpercent_containment\nB_1\t0.4\n").unwrap();
    fs::write(dir.path().join("B-x-r1.tsv"), "name\tpercent_containment\nB_2\t0.6\n").unwrap();
    let manifest = dir.path().join("lingroups.txt");
    fs::write(
        &manifest,
        format!(
            "{}\n{}\n",
            dir.path().join("A-x-r1.tsv").display(),
            dir.path().join("B-x-r1.tsv").display()
        ),
    )
    .unwrap();

    let output = dir.path().join("aggregated.tsv");
    let files = read_manifest(&manifest).unwrap();
    aggregate_lingroups(&files, &output).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "sample\tname\tpercent_containment");
    assert!(lines[1].starts_with("A\t"));
    assert!(lines[2].starts_with("B\t"));
}

#[test]
fn full_pipeline_reports_concordance() {
    let dir = tempdir().unwrap();
    let header = "name\tlin\tpercent_containment\tnum_bp_contained\n";
    fs::write(
        dir.path().join("SRR1-x-lingroups.tsv"),
        format!("{header}B_1;B_1.1\t1.1\t0.9\t900\nB_2;B_2.1\t2.1\t0.2\t200\nO_outgroup\t0\t0.05\t50\n"),
    )
    .unwrap();
    fs::write(
        dir.path().join("SRR2-x-lingroups.tsv"),
        format!("{header}B_3;B_3.4\t3.4\t0.7\t700\n"),
    )
    .unwrap();
    fs::write(
        dir.path().join("SRR3-x-lingroups.tsv"),
        format!("{header}O_outgroup\t0\t0.1\t100\n"),
    )
    .unwrap();

    let files: Vec<_> = ["SRR1", "SRR2", "SRR3"]
        .iter()
        .map(|s| dir.path().join(format!("{s}-x-lingroups.tsv")))
        .collect();
    let aggregated = dir.path().join("aggregated.tsv");
    let agg_stats = aggregate_lingroups(&files, &aggregated).unwrap();
    assert_eq!(agg_stats.rows, 5);

    let metadata = dir.path().join("metadata.csv");
    fs::write(
        &metadata,
        "acc,organism,geo_loc_name_country_calc\nSRR1,Escherichia coli,USA\nSRR2,Escherichia coli,USA\nSRR3,metagenome,Peru\n",
    )
    .unwrap();

    let lingroups = Table::read_delimited(&aggregated, TAB).unwrap();
    let metadata = Table::read_delimited(&metadata, COMMA).unwrap();
    let extraction = PhylogroupExtractor::new(0.3, PhylogroupLevel::TwoSegments)
        .unwrap()
        .extract(&lingroups, Some(&metadata))
        .unwrap();
    assert_eq!(extraction.stats.total_samples, 3);
    assert_eq!(extraction.stats.samples_above_threshold, 2);
    assert_eq!(extraction.best.len(), 3);

    let best = dir.path().join("best.tsv");
    extraction.best.write_delimited(&best, TAB).unwrap();

    let reference = dir.path().join("expected.csv");
    fs::write(&reference, "country,expected_phylogroup\nUSA,1.1;2.1\n").unwrap();

    let detected = Table::read_delimited(&best, TAB).unwrap();
    let expected = Table::read_delimited(&reference, COMMA).unwrap();
    let concordance = compare_phylogroups(&detected, &expected).unwrap();

    assert_eq!(concordance.stats.detected_phylogroups, 3);
    assert_eq!(concordance.stats.with_expected_phylogroups, 2);
    assert_eq!(concordance.stats.matches, 1);
    assert_eq!(concordance.stats.match_percentage().unwrap(), 50.0);

    let output = dir.path().join("comparison.csv");
    concordance.table.write_delimited(&output, COMMA).unwrap();
    let written = fs::read_to_string(&output).unwrap();
    assert!(written.lines().next().unwrap().ends_with(",expected_match"));
}
