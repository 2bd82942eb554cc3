#![allow(dead_code)]

use chrono::NaiveDate;
use findings_dashboard::loader::{Format, from_csv};
use findings_dashboard::{PipelineConfig, Session, Variant};

/// Five findings from an ISO follow-up sheet. Row 2 has a closing date but a
/// stale "Open" status; row 5 has an unreadable closing date.
pub const ISO_CSV: &str = "\
No, Area ,Finding Category,Standard,Finding,Evidence,Finding Status,Due Date,Tgl Closing,Auditor
1,Warehouse,NC,ISO 9001 7.1.5,Calibration overdue,Gauge log,Open,2024-01-15,,Rina
2,Warehouse,NC,ISO 9001 8.5.1,Inspection delayed,Batch 12,Open,2024-02-10,2024-02-20,Budi
3,Production,OB,ISO 14001 6.1,Waste bins unlabeled,Photo,Open,15/03/2024,,Rina
4,Lab,OFI,ISO 45001 8.1,PPE signage faded,Walkthrough,Open,,,Sari
5,Production,OB,ISO 9001 9.2,Audit plan late,Minutes,Close,2024-04-01,not yet,Budi
";

/// The same findings as a recap sheet without dates.
pub const RECAP_CSV: &str = "\
Finding category,Finding Status,Area
NC,Open,Warehouse
NC,Close,Warehouse
OB,Open,Production
OFI,Open,Lab
OB,Close,Production
";

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn iso_session() -> Session {
    Session::from_bytes(
        ISO_CSV.as_bytes(),
        Format::Csv,
        PipelineConfig::preset(Variant::IsoMonitoring),
    )
    .expect("ISO fixture should load")
}

pub fn recap_session() -> Session {
    let table = from_csv(RECAP_CSV.as_bytes()).unwrap();
    Session::open(table, PipelineConfig::preset(Variant::FindingRecap))
        .expect("recap fixture should load")
}
