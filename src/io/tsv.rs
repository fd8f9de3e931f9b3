//! Tab-separated readers for the vehicle geometry and signal files.
//!
//! Every reader is generic over [`Read`] so the same code serves files and
//! in-memory fixtures.

use std::io::Read;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};

use crate::error::{InputError, ModelError, PlannerError, Result};
use crate::math::Point3;
use crate::model::{parse_edge_label, PanelKind, SignalSource, VehicleModel};

fn reader<R: Read>(source: R, has_headers: bool) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source)
}

/// A record with the file name and line number attached, for messages.
struct Row<'a> {
    file: &'a str,
    line: usize,
    record: StringRecord,
}

impl Row<'_> {
    fn malformed(&self, message: impl Into<String>) -> PlannerError {
        InputError::MalformedRow {
            file: self.file.into(),
            row: self.line,
            message: message.into(),
        }
        .into()
    }

    /// The trimmed column, or `None` when absent or blank.
    fn optional(&self, column: usize) -> Option<&str> {
        self.record.get(column).filter(|s| !s.is_empty())
    }

    fn required(&self, column: usize, what: &str) -> Result<&str> {
        self.optional(column)
            .ok_or_else(|| self.malformed(format!("missing {what} in column {}", column + 1)))
    }

    fn parse<T: FromStr>(&self, column: usize, what: &str) -> Result<T> {
        let text = self.required(column, what)?;
        text.parse()
            .map_err(|_| self.malformed(format!("{what} {text:?} is not a number")))
    }

    fn parse_optional<T: FromStr>(&self, column: usize, what: &str) -> Result<Option<T>> {
        match self.optional(column) {
            None => Ok(None),
            Some(_) => self.parse(column, what).map(Some),
        }
    }
}

fn rows<'a, R: Read>(
    source: R,
    file: &'a str,
    has_headers: bool,
) -> impl Iterator<Item = Result<Row<'a>>> {
    let first_line = if has_headers { 2 } else { 1 };
    reader(source, has_headers)
        .into_records()
        .enumerate()
        .map(move |(idx, record)| {
            Ok(Row {
                file,
                line: idx + first_line,
                record: record.map_err(InputError::from)?,
            })
        })
}

/// Reads `vertexes.txt`: `id  x  y  z`, coordinates in microns.
///
/// # Errors
///
/// Returns an error for malformed rows or duplicate vertex ids.
pub fn read_vertices<R: Read>(source: R, model: &mut VehicleModel) -> Result<usize> {
    let mut count = 0;
    for row in rows(source, "vertexes.txt", false) {
        let row = row?;
        let id: u32 = row.parse(0, "vertex id")?;
        let point = Point3::new(row.parse(1, "x")?, row.parse(2, "y")?, row.parse(3, "z")?);
        model.add_vertex(id, point)?;
        count += 1;
    }
    Ok(count)
}

fn edge_endpoints(row: &Row<'_>, column: usize) -> Result<(u32, u32)> {
    let text = row.required(column, "edge id")?;
    parse_edge_label(text).ok_or_else(|| row.malformed(format!("{text:?} is not an a-b edge id")))
}

/// Reads `edges.txt`: an `a-b` edge id in the first column; the rest of
/// the row is ignored.
///
/// # Errors
///
/// Returns an error for malformed ids, unknown vertices, or duplicates.
pub fn read_edges<R: Read>(source: R, model: &mut VehicleModel) -> Result<usize> {
    let mut count = 0;
    for row in rows(source, "edges.txt", false) {
        let row = row?;
        let (a, b) = edge_endpoints(&row, 0)?;
        model.add_edge(a, b)?;
        count += 1;
    }
    Ok(count)
}

/// Reads `panels.txt`: a panel id, then three edge ids (or vertex ids)
/// whose union is the panel's three corners.
///
/// # Errors
///
/// Returns an error if a row does not name exactly three vertices.
pub fn read_panels<R: Read>(source: R, model: &mut VehicleModel) -> Result<usize> {
    let mut count = 0;
    for row in rows(source, "panels.txt", false) {
        let row = row?;
        let id = row.required(0, "panel id")?.to_owned();
        let mut corners: Vec<u32> = Vec::with_capacity(3);
        for column in 1..=3 {
            let text = row.required(column, "panel side")?;
            let labels = match parse_edge_label(text) {
                Some((a, b)) => vec![a, b],
                None => vec![row.parse(column, "panel vertex")?],
            };
            for label in labels {
                if !corners.contains(&label) {
                    corners.push(label);
                }
            }
        }
        let corners: [u32; 3] = corners.try_into().map_err(|found: Vec<u32>| {
            PlannerError::from(ModelError::InvalidPanel {
                panel: id.clone(),
                reason: format!("sides span {} vertices, expected 3", found.len()),
            })
        })?;
        model.add_panel(&id, corners)?;
        count += 1;
    }
    Ok(count)
}

/// Reads `edge_signal_paths.tsv` (with a header row): edge id, `Controller`
/// or an upstream edge id, controller vertex, build priority.
///
/// # Errors
///
/// Returns an error for unknown edges or vertices, or conflicting chains.
pub fn read_edge_signal_paths<R: Read>(source: R, model: &mut VehicleModel) -> Result<usize> {
    let mut count = 0;
    for row in rows(source, "edge_signal_paths.tsv", true) {
        let row = row?;
        let edge = model.edge_by_label(row.required(0, "edge id")?)?;
        let from = row.required(1, "signal source")?;
        let source = if from.eq_ignore_ascii_case("controller") {
            let vertex: u32 = row.parse(2, "controller vertex")?;
            SignalSource::Controller(model.vertex_by_label(vertex)?)
        } else {
            SignalSource::Edge(model.edge_by_label(from)?)
        };
        let priority = row.parse_optional(3, "priority")?;
        model.set_edge_signal(edge, source, priority)?;
        count += 1;
    }
    Ok(count)
}

/// Reads `panel_signal_paths.tsv` (with a header row): panel id, three
/// edge ids, type, channels, controller vertex, and optionally the vertex
/// where the data line enters.
///
/// # Errors
///
/// Returns an error for unknown panels or vertices.
pub fn read_panel_signal_paths<R: Read>(source: R, model: &mut VehicleModel) -> Result<usize> {
    let mut count = 0;
    for row in rows(source, "panel_signal_paths.tsv", true) {
        let row = row?;
        let panel = model.panel_by_label(row.required(0, "panel id")?)?;
        let kind = row.optional(4).map_or(PanelKind::Lit, PanelKind::parse);
        let channels = row.parse_optional(5, "channels")?.unwrap_or(0);
        let controller = match row.parse_optional::<u32>(6, "controller vertex")? {
            Some(label) => Some(model.vertex_by_label(label)?),
            None => None,
        };
        let signal_in = match row.parse_optional::<u32>(7, "signal-in vertex")? {
            Some(label) => Some(model.vertex_by_label(label)?),
            None => None,
        };
        model.set_panel_signal(panel, kind, channels, controller, signal_in)?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ElectricalParams;

    const VERTICES: &str = "1\t0\t0\t0\n2\t1000000\t0\t0\n3\t0\t1000000\t0\n4\t0\t0\t1000000\n";
    const EDGES: &str = "1-2\tfoo\n2-3\n1-3\n3-4\n";

    fn model() -> VehicleModel {
        let mut m = VehicleModel::new(ElectricalParams::default());
        assert_eq!(read_vertices(VERTICES.as_bytes(), &mut m).unwrap(), 4);
        assert_eq!(read_edges(EDGES.as_bytes(), &mut m).unwrap(), 4);
        m
    }

    #[test]
    fn panels_from_edge_ids_or_vertex_ids() {
        let mut m = model();
        let n = read_panels("P1\t1-2\t2-3\t1-3\nP2\t1\t3\t4\n".as_bytes(), &mut m).unwrap();
        assert_eq!(n, 2);
        let p2 = m.panel(m.panel_by_label("P2").unwrap()).unwrap();
        assert!(p2.has_vertex(m.vertex_by_label(4).unwrap()));
    }

    #[test]
    fn panel_with_four_vertices_is_rejected() {
        let mut m = model();
        let err = read_panels("P1\t1-2\t3-4\t1-3\n".as_bytes(), &mut m).unwrap_err();
        assert!(matches!(err, PlannerError::Model(ModelError::InvalidPanel { .. })));
    }

    #[test]
    fn edge_signal_rows_build_chains() {
        let mut m = model();
        let text = "Edge ID\tSignal from\tController vertex\tPriority\n\
                    1-2\tController\t1\t3\n\
                    2-3\t1-2\t\t\n";
        assert_eq!(read_edge_signal_paths(text.as_bytes(), &mut m).unwrap(), 2);
        let head = m.edge(m.edge_by_label("1-2").unwrap()).unwrap();
        assert_eq!(head.build_priority, Some(3));
        assert_eq!(head.signal_to, Some(m.edge_by_label("2-3").unwrap()));
        assert_eq!(m.injections().len(), 1);
    }

    #[test]
    fn bad_number_reports_the_row() {
        let mut m = VehicleModel::new(ElectricalParams::default());
        let err = read_vertices("1\t0\t0\t0\n2\tabc\t0\t0\n".as_bytes(), &mut m).unwrap_err();
        match err {
            PlannerError::Input(InputError::MalformedRow { row, .. }) => assert_eq!(row, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn panel_signal_rows_set_kind_and_channels() {
        let mut m = model();
        read_panels("P1\t1-2\t2-3\t1-3\nP2\t1\t3\t4\n".as_bytes(), &mut m).unwrap();
        let text = "Panel ID\tEdge1\tEdge2\tEdge3\tType\tChannels\tController vertex\n\
                    P1\t1-2\t2-3\t1-3\tlit\t2\t1\n\
                    P2\t\t\t\tunlit\t0\t\n";
        assert_eq!(read_panel_signal_paths(text.as_bytes(), &mut m).unwrap(), 2);
        let p1 = m.panel(m.panel_by_label("P1").unwrap()).unwrap();
        assert_eq!(p1.channels_required, 2);
        let p2 = m.panel(m.panel_by_label("P2").unwrap()).unwrap();
        assert_eq!(p2.kind, PanelKind::Unlit);
        assert!(p2.strips.is_empty());
        assert_eq!(m.injections().len(), 1);
    }
}
