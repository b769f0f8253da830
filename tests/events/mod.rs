use flakewatch::events::{EventLog, Filter};
use flakewatch::model::{BuildOccurrence, Occurrence, OccurrenceKind, TestOccurrence};
use std::fs::{self, OpenOptions};
use std::io::Write;
use tempfile::tempdir;

fn test_event(name: &str) -> Occurrence {
    Occurrence::Test(TestOccurrence {
        name: name.to_string(),
        id: "id:1,build:(id:2)".to_string(),
        status: "SUCCESS".to_string(),
        muted: false,
        ignored: false,
        duration: None,
    })
}

#[test]
fn append_and_read() {
    let dir = tempdir().expect("tempdir");
    let log = EventLog::new(dir.path().join("nested/events.jsonl"));

    log.append(&test_event("a: test")).expect("append test");
    log.append(&Occurrence::Build(BuildOccurrence {
        name: "a".to_string(),
        build_id: 2,
        status: "SUCCESS".to_string(),
    }))
    .expect("append build");

    let all = log.read(&Filter::default()).expect("read");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0], test_event("a: test"));

    let builds = log
        .read(&Filter {
            kind: Some(OccurrenceKind::Build),
            ..Filter::default()
        })
        .expect("filter kind");
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].name(), "a");

    let named = log
        .read(&Filter {
            name: Some("test".to_string()),
            ..Filter::default()
        })
        .expect("filter name");
    assert_eq!(named.len(), 1);
}

#[test]
fn read_parses_tagged_lines() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    fs::write(
        &path,
        r#"{"kind":"test","name":"t","id":"id:5,build:(id:9)","status":"FAILURE","muted":true}
{"kind":"critical","name":"suite","build_id":9}
"#,
    )
    .expect("write log");

    let events = EventLog::new(&path).read(&Filter::default()).expect("read");
    match &events[0] {
        Occurrence::Test(t) => {
            assert!(t.muted);
            assert!(!t.ignored);
            assert_eq!(t.duration, None);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(events[1].kind(), OccurrenceKind::Critical);
}

#[test]
fn read_skips_malformed_lines() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    let log = EventLog::new(&path);
    log.append(&test_event("good")).expect("append");

    let mut file = OpenOptions::new()
        .append(true)
        .open(&path)
        .expect("open for append");
    writeln!(file, "{{bad").expect("write malformed");
    writeln!(file).expect("write blank");
    writeln!(file, r#"{{"kind":"unknown","name":"x"}}"#).expect("write unknown kind");

    let events = log.read(&Filter::default()).expect("read");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), "good");
}

#[test]
fn read_missing_file() {
    let dir = tempdir().expect("tempdir");
    let log = EventLog::new(dir.path().join("missing.jsonl"));
    assert!(log.read(&Filter::default()).expect("read").is_empty());
}
