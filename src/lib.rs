/*!
# Findings Dashboard

The filter-and-aggregate pipeline behind the ISO audit finding dashboards.

## Overview

An audit team uploads a spreadsheet of findings (one row per finding, with
category, status, area and due/closing dates). The dashboard lets them narrow
the rows down with sidebar filters, look at a few charts, fix cells in a grid
and download the result. This crate is the part of that dashboard that is
independent of any UI: it turns the upload into typed records, filters them,
counts them for the charts, and serializes the result.

## Pipeline

Every interaction runs one synchronous pass:

1. **Load** (`loader`) - CSV or XLSX bytes become a `Table` with trimmed,
   unique column names
2. **Validate** (`schema`) - every required column must be present, or the
   upload is rejected with the full list of missing columns
3. **Normalize** (`dates`) - date columns are parsed (unreadable cells become
   blank, never an error) and, when configured, a closing date forces the
   status to the closed label
4. **Filter** (`filter`) - date ranges, category/status/area selections and a
   case-insensitive search, all ANDed, always applied to the original upload
5. **Aggregate** (`aggregate`) - grouped counts, the category × status pivot,
   stacked bars, the area → category → status flow diagram
6. **Export** (`downloader`) - CSV of the current view, XLSX of the edited
   grid with an optional summary sheet

`session::Session` strings these together and holds the per-user state.

## Variants

The dashboards differ only in column names and a few switches, captured by
`config::PipelineConfig` and its presets:

- **cost-ledger**: `DATE` / `AMOUNT`, plotted as a line
- **finding-recap**: `Finding category`, `Finding Status`, `Area`, flow diagram
- **iso-monitoring**: adds `Due Date` / `Tgl Closing`, derives closed status,
  stacked bars, summary sheet on export

## Modules

- **value**: cell values as read from a sheet
- **loader**: CSV/XLSX input
- **schema**: header normalization, column mapping, required-column check
- **record**: typed records and datasets, grid edits
- **dates**: date parsing and status derivation
- **filter**: filter criteria and the filter engine
- **aggregate**: grouped counts and chart data
- **downloader**: CSV/XLSX export
- **config**: pipeline configuration and presets
- **session**: one user's dashboard state
*/

pub mod aggregate;
pub mod config;
pub mod dates;
pub mod downloader;
pub mod error;
pub mod filter;
pub mod loader;
pub mod record;
pub mod schema;
pub mod session;
pub mod value;

pub use config::{ChartKind, PipelineConfig, Variant};
pub use error::{DashboardError, Result};
pub use filter::{DateRange, FilterCriteria, MissingDatePolicy};
pub use record::{Dataset, Record};
pub use session::{DashboardView, Session};
pub use value::Value;
