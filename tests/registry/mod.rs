use flakewatch::model::{BuildOccurrence, CriticalOccurrence, Occurrence, TestOccurrence};
use flakewatch::registry::{IngestSummary, Registry, lock};
use std::sync::Arc;
use std::thread;

fn test_event(name: &str, build: i32, status: &str) -> Occurrence {
    Occurrence::Test(TestOccurrence {
        name: name.to_string(),
        id: format!("id:3,build:(id:{build})"),
        status: status.to_string(),
        muted: false,
        ignored: false,
        duration: Some(10),
    })
}

#[test]
fn get_or_create_returns_same_record() {
    let registry = Registry::new();
    let first = registry.get_or_create("a");
    let second = registry.get_or_create("a");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(lock(&first).name(), "a");
    assert_eq!(registry.len(), 1);
    assert!(registry.get("missing").is_none());
}

#[test]
fn ingest_routes_by_name_and_kind() {
    let registry = Registry::new();
    let events = vec![
        test_event("t1", 1, "SUCCESS"),
        test_event("t1", 2, "FAILURE"),
        Occurrence::Build(BuildOccurrence {
            name: "suite".to_string(),
            build_id: 2,
            status: "FAILURE".to_string(),
        }),
        Occurrence::Critical(CriticalOccurrence {
            name: "suite".to_string(),
            build_id: 3,
        }),
        Occurrence::Test(TestOccurrence {
            name: "t2".to_string(),
            id: "garbage".to_string(),
            status: "FAILURE".to_string(),
            muted: false,
            ignored: false,
            duration: None,
        }),
    ];

    let summary = registry.ingest_all(&events);
    assert_eq!(
        summary,
        IngestSummary {
            accepted: 4,
            skipped: 1
        }
    );
    assert_eq!(registry.names(), vec!["suite", "t1", "t2"]);

    let (runs, window) = registry
        .with_record("suite", |r| (r.runs_all_hist(), r.runs_count()))
        .expect("suite");
    assert_eq!((runs, window), (1, 2));

    let t2_runs = registry.with_record("t2", |r| r.runs_all_hist());
    assert_eq!(t2_runs, Some(0));
}

#[test]
fn concurrent_ingestion_keeps_counts_exact() {
    let registry = Arc::new(Registry::new());
    let mut handles = Vec::new();

    for worker in 0..8 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for build in 0..200 {
                let name = if build % 2 == 0 { "shared" } else { "own" };
                let name = format!("{name}-{}", if name == "shared" { 0 } else { worker });
                let status = if build % 3 == 0 { "FAILURE" } else { "SUCCESS" };
                registry.ingest(&test_event(&name, worker * 1000 + build, status));
            }
        }));
    }

    for handle in handles {
        handle.join().expect("worker");
    }

    let shared = registry.get("shared-0").expect("shared");
    let record = lock(&shared);
    assert_eq!(record.runs_all_hist(), 8 * 100);
    assert_eq!(record.runs_count(), 50);
    assert!(record.window().windows(2).all(|pair| pair[0].0 < pair[1].0));
    assert_eq!(registry.len(), 9);
}
