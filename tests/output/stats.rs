use flakewatch::model::{OutcomeCode, RunIdentity};
use flakewatch::output::{StatsRow, format_duration_ms, print_stats};
use flakewatch::record::RunRecord;

#[test]
fn print_stats_empty() {
    let mut out = Vec::new();
    print_stats(&mut out, &[]).expect("print stats");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("No recorded runs yet"));
}

#[test]
fn print_stats_rows() {
    flakewatch::output::configure(true);

    let mut record = RunRecord::new("suite: testFlaky");
    for build in 0..8 {
        let code = if build % 2 == 0 {
            OutcomeCode::Ok
        } else {
            OutcomeCode::Failure
        };
        record.record_test_outcome(RunIdentity::new(build, 1), code, Some(1500));
    }

    let mut out = Vec::new();
    print_stats(&mut out, &[StatsRow::from_record(&record)]).expect("print stats");
    let text = String::from_utf8(out).expect("utf8");

    assert!(text.contains("suite: testFlaky"));
    assert!(text.contains("~ flaky"));
    assert!(text.contains("50,0%"));
    assert!(text.contains("avg duration: 1.500s"));
    assert!(text.contains("latest: .x.x.x.x"));
    assert!(text.contains("change status [7/8]"));
}

#[test]
fn duration_formatting() {
    assert_eq!(format_duration_ms(250), "250ms");
    assert_eq!(format_duration_ms(2000), "2s");
    assert_eq!(format_duration_ms(1234), "1.234s");
}
