//! Gene table loader.
//!
//! Reads tab-separated text whose first non-comment line is the header. Rows without a primary
//! key are dropped whole; rows shorter than the widest referenced column are reported and
//! skipped.

use crate::{
    error::{Result, XrefError},
    matrix::ConverterMatrix,
    scheme::{IdentifierScheme, SchemaRegistry},
};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub indexed_rows: usize,
    pub rows_without_primary: usize,
    pub malformed_rows: usize,
    pub ignored_columns: Vec<String>,
}

#[derive(Debug, Clone)]
struct ResolvedColumn {
    scheme: IdentifierScheme,
    index: usize,
    canonical: bool,
}

fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell == "-"
}

/// Elements of a possibly list-valued cell (`"a, b, c"`), placeholders removed.
fn cell_values(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(',').map(str::trim).filter(|v| !is_missing(v))
}

/// Loads a gene table into a converter matrix.
pub fn load<I, S>(registry: SchemaRegistry, lines: I) -> Result<ConverterMatrix>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    load_with_report(registry, lines).map(|(matrix, _)| matrix)
}

pub fn load_with_report<I, S>(
    registry: SchemaRegistry,
    lines: I,
) -> Result<(ConverterMatrix, LoadReport)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut lines = lines.into_iter().enumerate();
    let header = loop {
        match lines.next() {
            Some((_, line)) if is_comment_or_blank(line.as_ref()) => continue,
            Some((_, line)) => break line,
            None => return Err(XrefError::MissingHeader),
        }
    };
    let labels: Vec<&str> = header.as_ref().split('\t').map(str::trim).collect();
    let index_of = |label: &str| labels.iter().position(|l| *l == label);

    let mut report = LoadReport::default();
    let primary_label = registry
        .columns_for(registry.primary())
        .first()
        .cloned()
        .unwrap_or_default();
    let primary_index =
        index_of(primary_label.as_str()).ok_or(XrefError::MissingPrimaryColumn(primary_label))?;

    let mut columns = Vec::new();
    for spec in registry.specs() {
        if registry.is_primary(spec.scheme) {
            continue;
        }
        for (position, label) in spec.columns.iter().enumerate() {
            match index_of(label.as_str()) {
                Some(index) => columns.push(ResolvedColumn {
                    scheme: spec.scheme,
                    index,
                    canonical: position == 0,
                }),
                None => {
                    warn!(
                        scheme = %spec.scheme,
                        column = %label,
                        "Column not found in gene table header; ignored"
                    );
                    report.ignored_columns.push(label.clone());
                }
            }
        }
    }
    let widest = columns
        .iter()
        .map(|c| c.index)
        .chain(std::iter::once(primary_index))
        .max()
        .unwrap_or(primary_index);

    let mut matrix = ConverterMatrix::empty(registry);
    for (line_no, line) in lines {
        let line = line.as_ref();
        if is_comment_or_blank(line) {
            continue;
        }
        let cells: Vec<&str> = line.split('\t').map(str::trim).collect();
        if cells.len() <= widest {
            warn!(
                line = line_no + 1,
                columns = cells.len(),
                expected = widest + 1,
                "Malformed gene table row skipped"
            );
            report.malformed_rows += 1;
            continue;
        }
        let primary_key = cells[primary_index];
        if is_missing(primary_key) {
            report.rows_without_primary += 1;
            continue;
        }
        matrix.add_primary_key(primary_key);
        report.indexed_rows += 1;

        for column in &columns {
            let map = matrix.direct_mut(column.scheme);
            for (i, value) in cell_values(cells[column.index]).enumerate() {
                if column.canonical {
                    map.insert_canonical(value, primary_key);
                    if i == 0 {
                        map.set_canonical_value(primary_key, value);
                    }
                } else {
                    map.insert_alias(value, primary_key);
                }
            }
        }
    }

    info!(
        indexed = report.indexed_rows,
        without_primary = report.rows_without_primary,
        malformed = report.malformed_rows,
        "Gene table loaded"
    );
    Ok((matrix, report))
}

pub fn load_reader<R: BufRead>(registry: SchemaRegistry, reader: R) -> Result<ConverterMatrix> {
    let lines = reader.lines().collect::<std::io::Result<Vec<String>>>()?;
    load(registry, lines)
}

pub fn load_path(registry: SchemaRegistry, path: &Path) -> Result<ConverterMatrix> {
    if !path.exists() {
        return Err(XrefError::TableNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    load_reader(registry, BufReader::new(file))
}
