mod common;

use common::{ISO_CSV, iso_session, recap_session};
use findings_dashboard::downloader::to_csv;
use findings_dashboard::loader::{Format, from_csv};
use findings_dashboard::{FilterCriteria, PipelineConfig, Session, Value, Variant};

#[test]
fn test_csv_round_trip_keeps_records() {
    println!("\n====== Testing to_csv round trip ======");
    let session = iso_session();
    let bytes = to_csv(session.original()).unwrap();

    let reloaded = Session::from_bytes(
        &bytes,
        Format::Csv,
        PipelineConfig::preset(Variant::IsoMonitoring),
    )
    .unwrap();

    assert_eq!(reloaded.original().columns, session.original().columns);
    assert_eq!(reloaded.original().records, session.original().records);
    println!("✓ {} records survive export and reload", reloaded.original().len());
}

/// Codes that look like numbers but are typed as text.
const CODED_CSV: &str = "\
No,Area,Finding Category,Standard,Finding,Evidence,Finding Status,Due Date,Tgl Closing,Asset Tag
1,007,NC,7.10,Label missing, Photo ,Open,2024-01-15,,12345678901234567890
2, Warehouse ,OB,8.5.1,Rack bent,Log,Open,45306,,000120
";

fn coded_session() -> Session {
    Session::from_bytes(
        CODED_CSV.as_bytes(),
        Format::Csv,
        PipelineConfig::preset(Variant::IsoMonitoring),
    )
    .unwrap()
}

#[test]
fn test_numeric_looking_text_keeps_its_digits() {
    println!("\n====== Testing numeric-looking text fields ======");
    let session = coded_session();
    let first = &session.original().records[0];

    assert_eq!(first.id, Some(1));
    assert_eq!(first.area.as_deref(), Some("007"));
    assert_eq!(first.standard.as_deref(), Some("7.10"));
    assert_eq!(
        first.extra.get("Asset Tag"),
        Some(&Value::Text("12345678901234567890".to_string()))
    );
    // A serial typed into a CSV is still read as a date
    assert_eq!(session.original().records[1].due_date, Some(common::ymd(2024, 1, 15)));
    println!("✓ 007, 7.10 and a 20-digit tag kept as typed");

    let text = String::from_utf8(to_csv(session.original()).unwrap()).unwrap();
    assert_eq!(
        text.lines().nth(1),
        Some("1,007,NC,7.10,Label missing,Photo,Open,2024-01-15,,12345678901234567890")
    );
    assert_eq!(
        text.lines().nth(2),
        Some("2,Warehouse,OB,8.5.1,Rack bent,Log,Open,2024-01-15,,000120")
    );
}

#[test]
fn test_numeric_looking_text_survives_round_trip() {
    let session = coded_session();
    let bytes = to_csv(session.original()).unwrap();
    let reloaded = Session::from_bytes(
        &bytes,
        Format::Csv,
        PipelineConfig::preset(Variant::IsoMonitoring),
    )
    .unwrap();

    assert_eq!(reloaded.original().records, session.original().records);
    println!("✓ Leading zeros, trailing-zero clauses and padded labels round trip");
}

#[test]
fn test_numeric_looking_text_is_searchable() {
    let mut session = coded_session();

    session.set_criteria(FilterCriteria {
        search: "7.10".to_string(),
        ..FilterCriteria::default()
    });
    assert_eq!(session.filtered().unwrap().len(), 1);

    session.set_criteria(FilterCriteria {
        areas: vec!["007".to_string()],
        ..FilterCriteria::default()
    });
    assert_eq!(session.filtered().unwrap().len(), 1);

    session.set_criteria(FilterCriteria {
        areas: vec!["Warehouse".to_string()],
        ..FilterCriteria::default()
    });
    assert_eq!(session.filtered().unwrap().len(), 1);
}

#[test]
fn test_csv_has_header_and_normalized_dates() {
    let session = iso_session();
    let text = String::from_utf8(to_csv(session.original()).unwrap()).unwrap();
    let mut lines = text.lines();

    assert_eq!(
        lines.next(),
        Some("No,Area,Finding Category,Standard,Finding,Evidence,Finding Status,Due Date,Tgl Closing,Auditor")
    );
    assert_eq!(
        lines.nth(2),
        Some("3,Production,OB,ISO 14001 6.1,Waste bins unlabeled,Photo,Open,2024-03-15,,Rina")
    );
}

#[test]
fn test_csv_quotes_awkward_values() {
    let csv = "Finding category,Finding Status,Area,Remarks\nNC,Open,Lab,\"needs \"\"rework\"\", soon\"\n";
    let table = from_csv(csv.as_bytes()).unwrap();
    let session = Session::open(table, PipelineConfig::preset(Variant::FindingRecap)).unwrap();

    let bytes = to_csv(session.original()).unwrap();
    let reread = from_csv(&bytes).unwrap();
    assert_eq!(
        reread.rows[0][3],
        Value::Text("needs \"rework\", soon".to_string())
    );
}

#[test]
fn test_edited_grid_is_what_gets_exported() {
    println!("\n====== Testing export of edited grid ======");
    let mut session = recap_session();
    let mut edited = session.filtered().unwrap();
    edited
        .set_value(0, "Finding Status", Value::Text("Close".to_string()))
        .unwrap();
    edited
        .set_value(3, "Area", Value::Text("Quality Lab".to_string()))
        .unwrap();
    session.accept_edits(edited);

    let text = String::from_utf8(session.export_csv().unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[1], "NC,Close,Warehouse");
    assert_eq!(lines[4], "OFI,Open,Quality Lab");
    println!("✓ Cell edits reflected in the export");

    // The upload itself is untouched
    assert_eq!(session.original().records[0].status.as_deref(), Some("Open"));
}

#[test]
fn test_edits_outside_the_grid_are_rejected() {
    let session = recap_session();
    let mut edited = session.filtered().unwrap();

    assert!(edited.set_value(99, "Area", Value::Empty).is_err());
    assert!(edited.set_value(0, "Auditor", Value::Empty).is_err());
}

#[test]
fn test_unreadable_date_edit_is_kept_verbatim() {
    let session = iso_session();
    let mut edited = session.filtered().unwrap();

    edited
        .set_value(0, "Due Date", Value::Text("next week".to_string()))
        .unwrap();
    assert_eq!(edited.records[0].due_date, None);
    assert_eq!(
        edited.value(0, "Due Date"),
        Some(Value::Text("next week".to_string()))
    );

    edited
        .set_value(0, "Due Date", Value::Text("2024-05-01".to_string()))
        .unwrap();
    assert_eq!(edited.records[0].due_date, Some(common::ymd(2024, 5, 1)));
    assert!(!edited.records[0].extra.contains_key("Due Date"));
}

#[cfg(feature = "xlsx")]
mod xlsx {
    use super::*;
    use findings_dashboard::downloader::to_xlsx;
    use findings_dashboard::loader::from_excel;

    #[test]
    fn test_xlsx_export_reloads() {
        println!("\n====== Testing to_xlsx round trip ======");
        let session = iso_session();
        let bytes = session.export_xlsx().unwrap();

        let reloaded = Session::from_bytes(
            &bytes,
            Format::Xlsx,
            PipelineConfig::preset(Variant::IsoMonitoring),
        )
        .unwrap();
        assert_eq!(reloaded.original().columns, session.original().columns);
        assert_eq!(reloaded.original().records, session.original().records);
        println!("✓ Data sheet reloads to the same records");
    }

    #[test]
    fn test_summary_sheet_holds_the_pivot() {
        let session = iso_session();
        let bytes = session.export_xlsx().unwrap();

        let summary = from_excel(&bytes, Some("Summary")).unwrap();
        assert_eq!(summary.columns, vec!["Category", "Open", "Close", "Total"]);
        assert_eq!(
            summary.rows[2],
            vec![
                Value::Text("OFI".to_string()),
                Value::Number(1.0),
                Value::Number(0.0),
                Value::Number(1.0),
            ]
        );
        assert_eq!(summary.rows.len(), 3);
    }

    #[test]
    fn test_summary_sheet_is_optional() {
        let session = recap_session();
        assert!(!session.config().summary_sheet);
        let bytes = session.export_xlsx().unwrap();

        assert!(from_excel(&bytes, Some("Data")).is_ok());
        assert!(from_excel(&bytes, Some("Summary")).is_err());
    }

    #[test]
    fn test_plain_xlsx_writer_without_summary() {
        let table = from_csv(ISO_CSV.as_bytes()).unwrap();
        let session =
            Session::open(table, PipelineConfig::preset(Variant::IsoMonitoring)).unwrap();
        let bytes = to_xlsx(session.original(), None).unwrap();

        let data = from_excel(&bytes, None).unwrap();
        assert_eq!(data.rows.len(), 5);
        assert_eq!(data.rows[0][0], Value::Number(1.0));
    }

    #[test]
    fn test_numeric_looking_text_survives_xlsx() {
        let session = coded_session();
        let bytes = session.export_xlsx().unwrap();

        let reloaded = Session::from_bytes(
            &bytes,
            Format::Xlsx,
            PipelineConfig::preset(Variant::IsoMonitoring),
        )
        .unwrap();
        assert_eq!(reloaded.original().records, session.original().records);
        assert_eq!(reloaded.original().records[0].standard.as_deref(), Some("7.10"));
    }
}
