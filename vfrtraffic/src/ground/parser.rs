//! Ground network record file parser.
//!
//! # Format
//!
//! ```text
//! N <id> <lon> <lat> <elevM> <J|T|H|P> <exits|-> "<name>"
//! A <n1> <n2> <R|T> <Y|N> "<name>"
//! G <id> <lon> <lat> <elevM> <type> <headingDeg> "<name>"
//! [End]
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Everything after
//! `[End]` is ignored. A name without a closing quote runs to the end of
//! the line.

use crate::geo::GeoPoint;
use crate::runway::runway_number;

use super::error::LoadError;
use super::network::{ArcKind, NodeKind};

/// A node definition (`N`).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub line: usize,
    pub id: u32,
    pub position: GeoPoint,
    pub kind: NodeKind,
    /// Runway numbers this node is an exit for.
    pub exits: Vec<u32>,
    pub name: String,
}

/// An arc definition (`A`).
#[derive(Debug, Clone, PartialEq)]
pub struct ArcRecord {
    pub line: usize,
    pub from: u32,
    pub to: u32,
    pub kind: ArcKind,
    pub directed: bool,
    pub name: String,
}

/// A gate definition (`G`).
#[derive(Debug, Clone, PartialEq)]
pub struct GateRecord {
    pub line: usize,
    pub id: u32,
    pub position: GeoPoint,
    pub type_code: String,
    pub heading_deg: f64,
    pub name: String,
}

/// One parsed record.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkRecord {
    Node(NodeRecord),
    Arc(ArcRecord),
    Gate(GateRecord),
}

/// Parse the full text of a ground network file.
pub fn parse_records(text: &str) -> Result<Vec<NetworkRecord>, LoadError> {
    let mut records = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.starts_with("[End]") {
            break;
        }

        let (fields, name) = split_line(trimmed);
        let mut fields = Fields::new(line, fields);
        let tag = fields.next("element type")?;

        let record = match tag {
            "N" => NetworkRecord::Node(parse_node(&mut fields, name)?),
            "A" => NetworkRecord::Arc(parse_arc(&mut fields, name)?),
            "G" => NetworkRecord::Gate(parse_gate(&mut fields, name)?),
            other => {
                return Err(LoadError::UnknownTag {
                    line,
                    tag: other.to_string(),
                })
            }
        };
        records.push(record);
    }

    Ok(records)
}

fn parse_node(fields: &mut Fields<'_>, name: String) -> Result<NodeRecord, LoadError> {
    let line = fields.line;
    let id = fields.number::<u32>("node id")?;
    let position = fields.position()?;

    let code = fields.next("node type")?;
    let kind = match code {
        "J" => NodeKind::Junction,
        "T" => NodeKind::TJunction,
        "H" => NodeKind::Hold,
        "P" => NodeKind::Apron,
        other => {
            return Err(LoadError::UnknownNodeType {
                line,
                code: other.to_string(),
            })
        }
    };

    let exits = match fields.optional() {
        Some(list) => parse_exit_list(line, list)?,
        None => Vec::new(),
    };

    Ok(NodeRecord {
        line,
        id,
        position,
        kind,
        exits,
        name,
    })
}

fn parse_arc(fields: &mut Fields<'_>, name: String) -> Result<ArcRecord, LoadError> {
    let line = fields.line;
    let from = fields.number::<u32>("arc start node")?;
    let to = fields.number::<u32>("arc end node")?;

    let kind = match fields.next("arc type")? {
        "R" => ArcKind::Runway,
        "T" => ArcKind::Taxiway,
        other => {
            return Err(LoadError::UnknownArcType {
                line,
                code: other.to_string(),
            })
        }
    };

    let directed = match fields.next("arc directed flag")? {
        "Y" => true,
        "N" => false,
        other => {
            return Err(LoadError::BadDirected {
                line,
                code: other.to_string(),
            })
        }
    };

    Ok(ArcRecord {
        line,
        from,
        to,
        kind,
        directed,
        name,
    })
}

fn parse_gate(fields: &mut Fields<'_>, name: String) -> Result<GateRecord, LoadError> {
    let line = fields.line;
    let id = fields.number::<u32>("gate id")?;
    let position = fields.position()?;
    let type_code = fields.next("gate type")?.to_string();
    let heading_deg = fields.number::<f64>("gate heading")?;

    Ok(GateRecord {
        line,
        id,
        position,
        type_code,
        heading_deg,
        name,
    })
}

/// Parse a `-`-delimited runway exit list. A lone `-` means no exits.
fn parse_exit_list(line: usize, list: &str) -> Result<Vec<u32>, LoadError> {
    list.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            runway_number(part).ok_or_else(|| LoadError::InvalidNumber {
                line,
                field: "runway exit",
                value: part.to_string(),
            })
        })
        .collect()
}

/// Split a line into whitespace fields and the quoted trailing name.
fn split_line(line: &str) -> (Vec<&str>, String) {
    match line.find('"') {
        Some(start) => {
            let rest = &line[start + 1..];
            let name = match rest.find('"') {
                Some(end) => &rest[..end],
                None => rest,
            };
            (
                line[..start].split_whitespace().collect(),
                name.to_string(),
            )
        }
        None => (line.split_whitespace().collect(), String::new()),
    }
}

/// Cursor over the fields of one line.
struct Fields<'a> {
    line: usize,
    fields: std::vec::IntoIter<&'a str>,
}

impl<'a> Fields<'a> {
    fn new(line: usize, fields: Vec<&'a str>) -> Self {
        Self {
            line,
            fields: fields.into_iter(),
        }
    }

    fn next(&mut self, field: &'static str) -> Result<&'a str, LoadError> {
        self.fields.next().ok_or(LoadError::MissingField {
            line: self.line,
            field,
        })
    }

    fn optional(&mut self) -> Option<&'a str> {
        self.fields.next()
    }

    fn number<T: std::str::FromStr>(&mut self, field: &'static str) -> Result<T, LoadError> {
        let value = self.next(field)?;
        value.parse().map_err(|_| LoadError::InvalidNumber {
            line: self.line,
            field,
            value: value.to_string(),
        })
    }

    fn position(&mut self) -> Result<GeoPoint, LoadError> {
        let lon = self.number::<f64>("longitude")?;
        let lat = self.number::<f64>("latitude")?;
        let elev = self.number::<f64>("elevation")?;
        Ok(GeoPoint::new(lat, lon, elev))
    }
}
