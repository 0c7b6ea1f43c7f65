//! End-to-end mining and analysis over one small history written in every
//! supported log format.

use std::io::Write;

use coevo_core::{ErrorKind, VcsFormat};
use coevo_history::age::AgeOptions;
use coevo_history::analysis::{run, run_many, Analysis};
use coevo_history::churn::{entity_churn, ChurnKind};
use coevo_history::coupling::CouplingOptions;
use coevo_history::mining::{mine_log, mine_str, MinedLog, MiningOptions};

// c1: ann on 2024-01-01 touches A and B
// c2: bo  on 2024-01-02 touches A, B and C
// c3: ann on 2024-01-03 touches B

const GIT: &str = "\
[c1] ann 2024-01-01 fix A
1\t1\tsrc/A
2\t0\tsrc/B

[c2] bo 2024-01-02 touch everything
3\t1\tsrc/A
1\t1\tsrc/B
4\t0\tsrc/C

[c3] ann 2024-01-03 fix B again
0\t5\tsrc/B
";

const GIT2: &str = "\
--c1--2024-01-01--ann
1\t1\tsrc/A
2\t0\tsrc/B

--c2--2024-01-02--bo
3\t1\tsrc/A
1\t1\tsrc/B
4\t0\tsrc/C

--c3--2024-01-03--ann
0\t5\tsrc/B
";

const SVN: &str = r#"<?xml version="1.0"?>
<log>
<logentry revision="3">
<author>ann</author>
<date>2024-01-03T10:00:00.000000Z</date>
<paths>
<path kind="file" action="M">/src/B</path>
</paths>
<msg>fix B again</msg>
</logentry>
<logentry revision="2">
<author>bo</author>
<date>2024-01-02T10:00:00.000000Z</date>
<paths>
<path kind="file" action="M">/src/A</path>
<path kind="file" action="M">/src/B</path>
<path kind="file" action="A">/src/C</path>
</paths>
<msg>touch everything</msg>
</logentry>
<logentry revision="1">
<author>ann</author>
<date>2024-01-01T10:00:00.000000Z</date>
<paths>
<path kind="file" action="A">/src/A</path>
<path kind="file" action="A">/src/B</path>
</paths>
<msg>fix A</msg>
</logentry>
</log>
"#;

const HG: &str = "\
rev: 3 author: ann date: 2024-01-03 files:
src/B

rev: 2 author: bo date: 2024-01-02 files:
src/A
src/B
src/C

rev: 1 author: ann date: 2024-01-01 files:
src/A
src/B
";

const P4: &str = "\
Change 3 by ann@ws on 2024/01/03 10:00:00
\tfix B again
Affected files ...
... //depot/src/B#3 edit

Change 2 by bo@ws on 2024/01/02
\ttouch everything
Affected files ...
... //depot/src/A#2 edit
... //depot/src/B#2 edit
... //depot/src/C#1 add

Change 1 by ann@ws on 2024/01/01
\tfix A
Affected files ...
... //depot/src/A#1 add
... //depot/src/B#1 add
";

const TFS: &str = "\
-----------------------------------------------------------------------------
Changeset: 3
User: ann
Date: 2024-01-03 10:00:00

Comment:
  fix B again

Items:
  edit $/P/src/B
-----------------------------------------------------------------------------
Changeset: 2
User: bo
Date: 2024-01-02 10:00:00

Comment:
  touch everything

Items:
  edit $/P/src/A
  edit $/P/src/B
  add $/P/src/C
-----------------------------------------------------------------------------
Changeset: 1
User: ann
Date: 2024-01-01 10:00:00

Comment:
  fix A

Items:
  add $/P/src/A
  add $/P/src/B
";

fn all_logs() -> Vec<(VcsFormat, &'static str)> {
    vec![
        (VcsFormat::Git, GIT),
        (VcsFormat::Git2, GIT2),
        (VcsFormat::Svn, SVN),
        (VcsFormat::Hg, HG),
        (VcsFormat::P4, P4),
        (VcsFormat::Tfs, TFS),
    ]
}

fn mine(format: VcsFormat, log: &str) -> MinedLog {
    mine_str(log, format, &MiningOptions::default())
        .unwrap_or_else(|e| panic!("{format}: {e}"))
}

fn coupling(min_revs: u32, max_changeset_size: usize) -> Analysis {
    Analysis::Coupling(CouplingOptions {
        min_coupling: 0,
        max_coupling: 100,
        min_revs,
        max_changeset_size,
    })
}

#[test]
fn every_format_yields_the_same_model() {
    for (format, log) in all_logs() {
        let mined = mine(format, log);
        assert_eq!(mined.changesets().len(), 3, "{format}");
        assert!(mined.warnings().is_empty(), "{format}: {:?}", mined.warnings());

        let mut revs: Vec<u32> = mined.entity_stats().values().map(|s| s.revisions).collect();
        revs.sort_unstable();
        assert_eq!(revs, vec![1, 2, 3], "{format}");
    }
}

#[test]
fn every_format_yields_the_same_coupling() {
    for (format, log) in all_logs() {
        let table = run(&mine(format, log), &coupling(1, 10)).unwrap();
        let degrees: Vec<String> = table.rows.iter().map(|r| r[2].to_string()).collect();
        assert_eq!(degrees, vec!["100", "100", "100"], "{format}");
        let shared: Vec<String> = table.rows.iter().map(|r| r[4].to_string()).collect();
        assert_eq!(shared, vec!["2", "1", "1"], "{format}");
    }
}

#[test]
fn coupling_pairs_are_unique_and_ordered() {
    let table = run(&mine(VcsFormat::Git2, GIT2), &coupling(1, 10)).unwrap();
    for row in &table.rows {
        assert!(row[0].to_string() < row[1].to_string());
    }
    let pairs: Vec<(String, String)> = table
        .rows
        .iter()
        .map(|r| (r[0].to_string(), r[1].to_string()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("src/A".to_string(), "src/B".to_string()),
            ("src/A".to_string(), "src/C".to_string()),
            ("src/B".to_string(), "src/C".to_string()),
        ]
    );
}

#[test]
fn entity_churn_accounts_for_every_known_line() {
    let mined = mine(VcsFormat::Git2, GIT2);
    let rows = entity_churn(mined.changesets());
    let added: u64 = rows.iter().map(|r| r.0.added).sum();
    let deleted: u64 = rows.iter().map(|r| r.0.deleted).sum();
    assert_eq!(added, 1 + 2 + 3 + 1 + 4);
    assert_eq!(deleted, 1 + 1 + 1 + 5);

    let table = run(&mined, &Analysis::Churn(ChurnKind::Entity)).unwrap();
    assert_eq!(table.rows[0][0].to_string(), "src/B");
}

#[test]
fn formats_without_line_counts_report_zero_churn() {
    let mined = mine(VcsFormat::Hg, HG);
    let rows = entity_churn(mined.changesets());
    assert!(rows.iter().all(|r| r.0.total() == 0));
    let b = rows.iter().find(|r| r.0.name == "src/B").unwrap();
    assert_eq!(b.0.commits, 3);
}

#[test]
fn most_recently_changed_entity_has_age_zero() {
    for (format, log) in all_logs() {
        let table = run(&mine(format, log), &Analysis::Age(AgeOptions::default())).unwrap();
        assert!(table.rows[0][0].to_string().ends_with("src/B"), "{format}");
        assert_eq!(table.rows[0][1].to_string(), "0", "{format}");
    }
}

#[test]
fn oversized_changeset_counts_for_churn_but_not_coupling() {
    let mut log = String::from("--big--2024-02-01--ann\n");
    for i in 0..40 {
        log.push_str(&format!("1\t0\tgen/file{i:02}.rs\n"));
    }
    let mined = mine(VcsFormat::Git2, &log);

    let pairs = run(&mined, &coupling(1, 30)).unwrap();
    assert!(pairs.is_empty());

    let revisions = run(&mined, &Analysis::Revisions { min_revs: 1 }).unwrap();
    assert_eq!(revisions.len(), 40);
    assert!(revisions.rows.iter().all(|r| r[1].to_string() == "1"));
}

#[test]
fn malformed_header_reports_its_line_and_stops_mining() {
    let log = "\
--c1--2024-01-01--ann
1\t1\tsrc/A

--c2--2024-13-45--bo
3\t1\tsrc/A
";
    let err = mine_str(log, VcsFormat::Git2, &MiningOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseError);
    assert_eq!(err.line(), Some(4));
    assert!(err.to_string().contains("2024-13-45"), "{err}");
}

#[test]
fn unsupported_format_is_rejected_up_front() {
    let err = "cvs".parse::<VcsFormat>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn mines_from_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(GIT2.as_bytes()).unwrap();
    let mined = mine_log(file.path(), VcsFormat::Git2, &MiningOptions::default()).unwrap();
    assert_eq!(mined.changesets().len(), 3);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let analyses = vec![
        coupling(1, 10),
        Analysis::Churn(ChurnKind::Author),
        Analysis::Authors { min_revs: 1 },
        Analysis::EntityEffort { min_revs: 1 },
        Analysis::Communication { min_shared_revs: 1 },
        Analysis::Messages {
            expression: "fix".into(),
        },
    ];
    let render = || {
        let tables = run_many(&mine(VcsFormat::Git, GIT), &analyses).unwrap();
        serde_json::to_string(&tables).unwrap()
    };
    assert_eq!(render(), render());
}

#[test]
fn messages_are_matched_where_the_format_has_them() {
    let table = run(
        &mine(VcsFormat::Svn, SVN),
        &Analysis::Messages {
            expression: "^fix".into(),
        },
    )
    .unwrap();
    let rows: Vec<(String, String)> = table
        .rows
        .iter()
        .map(|r| (r[0].to_string(), r[1].to_string()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("src/B".to_string(), "2".to_string()),
            ("src/A".to_string(), "1".to_string()),
        ]
    );
}
