use super::{Downstream, ReachGraph, ReachId};
use crate::algorithms::ThreadAssignment;
use crate::error::{Result, TopologyError};
use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub const DEFAULT_ID_FIELD: &str = "HYRIV_ID";
pub const DEFAULT_DOWNSTREAM_FIELD: &str = "NEXT_DOWN";

/// Column names appended to the link table on output.
pub const THREAD_ID_FIELD: &str = "River_ID";
pub const ORDER_FIELD: &str = "Order";

/// A hydrography link table: every original column is kept so the table can be
/// written back out with thread assignments joined on.
#[derive(Clone, Debug)]
pub struct ReachTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
    links: Vec<(ReachId, Downstream)>,
}

impl ReachTable {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        id_field: &str,
        downstream_field: &str,
    ) -> Result<ReachTable> {
        let file = File::open(path)?;
        ReachTable::from_reader(file, id_field, downstream_field)
    }

    /// Reads a CSV link table. Both named columns must be present before any
    /// row is parsed.
    pub fn from_reader<R: Read>(
        reader: R,
        id_field: &str,
        downstream_field: &str,
    ) -> Result<ReachTable> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| TopologyError::MissingColumn(name.to_string()))
        };
        let id_column = column(id_field)?;
        let downstream_column = column(downstream_field)?;

        let mut records = vec![];
        let mut links = vec![];
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let raw_id = record.get(id_column).unwrap_or("");
            let id = parse_reach_id(raw_id).ok_or_else(|| TopologyError::InvalidField {
                row: row + 1,
                column: id_field.to_string(),
                value: raw_id.to_string(),
            })?;
            let raw_next = record.get(downstream_column).unwrap_or("");
            let downstream =
                parse_downstream(raw_next).ok_or_else(|| TopologyError::InvalidField {
                    row: row + 1,
                    column: downstream_field.to_string(),
                    value: raw_next.to_string(),
                })?;
            links.push((id, downstream));
            records.push(record);
        }

        Ok(ReachTable {
            headers,
            records,
            links,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn links(&self) -> &[(ReachId, Downstream)] {
        &self.links
    }

    /// Rows whose downstream field was blank or NaN.
    pub fn missing_downstream_count(&self) -> usize {
        self.links
            .iter()
            .filter(|(_, d)| *d == Downstream::Missing)
            .count()
    }

    pub fn to_graph(&self) -> ReachGraph {
        ReachGraph::from_links(self.links.iter().copied())
    }

    /// Writes the table left-joined with `assignments` on the reach id. Rows
    /// without an assignment get empty `River_ID` and `Order` cells. Returns the
    /// number of rows that received an assignment.
    pub fn write_merged<W: Write>(
        &self,
        writer: W,
        assignments: &HashMap<ReachId, ThreadAssignment>,
    ) -> Result<usize> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        let mut header = self.headers.clone();
        header.push_field(THREAD_ID_FIELD);
        header.push_field(ORDER_FIELD);
        wtr.write_record(&header)?;

        let mut assigned = 0usize;
        for (record, (id, _)) in self.records.iter().zip(self.links.iter()) {
            let mut out = record.clone();
            match assignments.get(id) {
                Some(a) => {
                    out.push_field(&a.thread_id);
                    out.push_field(&a.order.to_string());
                    assigned += 1;
                }
                None => {
                    out.push_field("");
                    out.push_field("");
                }
            }
            wtr.write_record(&out)?;
        }
        wtr.flush()?;
        Ok(assigned)
    }
}

/// Parses an integer id. Integral floats (`123.0`) are accepted because tables
/// that passed through a dataframe with missing values store ids that way.
pub fn parse_reach_id(raw: &str) -> Option<ReachId> {
    let s = raw.trim();
    if let Ok(id) = s.parse::<ReachId>() {
        return Some(id);
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
        Some(v as ReachId)
    } else {
        None
    }
}

/// `0` is an outlet, blank or NaN is a missing link, anything else must be an id.
pub fn parse_downstream(raw: &str) -> Option<Downstream> {
    let s = raw.trim();
    if s.is_empty() || ["nan", "na", "null", "none"].contains(&s.to_lowercase().as_str()) {
        return Some(Downstream::Missing);
    }
    match parse_reach_id(s)? {
        0 => Some(Downstream::Outlet),
        id => Some(Downstream::Reach(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "HYRIV_ID,NEXT_DOWN,LENGTH_KM\n\
                         1,2,1.5\n\
                         2,3.0,2.0\n\
                         3,0,0.7\n\
                         4,,0.2\n";

    #[test]
    fn test_reads_links_and_classifies_downstream() {
        let table = ReachTable::from_reader(TABLE.as_bytes(), "HYRIV_ID", "NEXT_DOWN").unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(
            table.links(),
            &[
                (1, Downstream::Reach(2)),
                (2, Downstream::Reach(3)),
                (3, Downstream::Outlet),
                (4, Downstream::Missing),
            ]
        );
        assert_eq!(table.missing_downstream_count(), 1);
        assert_eq!(table.to_graph().edge_count(), 2);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let err = ReachTable::from_reader(TABLE.as_bytes(), "HYRIV_ID", "NEXT_DWN").unwrap_err();
        match err {
            TopologyError::MissingColumn(name) => assert_eq!(name, "NEXT_DWN"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unparsable_downstream_reports_row() {
        let data = "HYRIV_ID,NEXT_DOWN\n1,2\n2,abc\n";
        let err = ReachTable::from_reader(data.as_bytes(), "HYRIV_ID", "NEXT_DOWN").unwrap_err();
        match err {
            TopologyError::InvalidField { row, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_write_merged_left_joins_assignments() {
        let table = ReachTable::from_reader(TABLE.as_bytes(), "HYRIV_ID", "NEXT_DOWN").unwrap();
        let mut assignments = HashMap::new();
        assignments.insert(
            2,
            ThreadAssignment {
                reach_id: 2,
                thread_id: "River_1".to_string(),
                order: 1,
            },
        );
        let mut out = vec![];
        let assigned = table.write_merged(&mut out, &assignments).unwrap();
        assert_eq!(assigned, 1);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "HYRIV_ID,NEXT_DOWN,LENGTH_KM,River_ID,Order");
        assert_eq!(lines[1], "1,2,1.5,,");
        assert_eq!(lines[2], "2,3.0,2.0,River_1,1");
        assert_eq!(lines[4], "4,,0.2,,");
    }

    #[test]
    fn test_parse_reach_id_accepts_integral_floats_only() {
        assert_eq!(parse_reach_id(" 42 "), Some(42));
        assert_eq!(parse_reach_id("42.0"), Some(42));
        assert_eq!(parse_reach_id("42.5"), None);
        assert_eq!(parse_downstream("NaN"), Some(Downstream::Missing));
        assert_eq!(parse_downstream("0.0"), Some(Downstream::Outlet));
    }
}
