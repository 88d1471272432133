use crate::error::{Result, VisError};
use crate::library::{ConstructDescriptor, Resolution};
use crate::palette::palette_size;
use crate::part_token::{PartToken, PartType, expand_abbreviation};
use std::collections::HashMap;

/// Width of one identifier field in fixed-width files.
pub const FIELD_WIDTH: usize = 16;

/// Marker that is always present in constructs synthesized from a matrix.
const MATRIX_RESISTANCE: PartToken = PartToken {
    part_type: PartType::Resistance,
    column_index: 2,
    level: 1,
};

/// Decoded identifier rows. Each row is aligned to a whole structural row,
/// so its first cell belongs to the construct id column.
#[derive(Clone, Debug)]
pub enum IdentifierTable {
    /// One identifier per slot, blank fields already decoded as `None`.
    FixedWidth(Vec<Vec<Option<String>>>),
    /// Tab separated; elided promoter variants have no column at all.
    TabElided(Vec<Vec<Option<String>>>),
}

impl IdentifierTable {
    fn rows(&self) -> &[Vec<Option<String>>] {
        match self {
            Self::FixedWidth(rows) | Self::TabElided(rows) => rows,
        }
    }
}

#[derive(Clone, Debug)]
pub enum ResolveInput {
    /// Rows of `id, <identifier>:<token>, ...` cells.
    CombinedCsv { rows: Vec<Vec<String>> },
    /// Structural rows plus an optional parallel identifier table. Without
    /// identifiers every token stands for itself.
    TabParallel {
        structure: Vec<Vec<String>>,
        identifiers: Option<IdentifierTable>,
    },
    /// Library rows (`key, token, ...`) plus the raw lines of a fixed-width
    /// equivalence file.
    LibraryEquivalence {
        library: Vec<Vec<String>>,
        equivalence: Vec<String>,
    },
    /// Factorial design matrix, one row per construct.
    Matrix { matrix: Vec<Vec<u32>> },
}

pub fn resolve(input: &ResolveInput) -> Resolution {
    let resolution = match input {
        ResolveInput::CombinedCsv { rows } => resolve_combined(rows),
        ResolveInput::TabParallel {
            structure,
            identifiers,
        } => resolve_tab_parallel(structure, identifiers.as_ref()),
        ResolveInput::LibraryEquivalence {
            library,
            equivalence,
        } => resolve_library(library, equivalence),
        ResolveInput::Matrix { matrix } => resolve_matrix(matrix),
    };
    tracing::debug!(
        constructs = resolution.library.len(),
        parts = resolution.library.parts().len(),
        failures = resolution.failures.len(),
        "library resolved"
    );
    resolution
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Cuts `text` into `FIELD_WIDTH`-character fields; blank fields are absent.
pub fn fixed_width_fields(text: &str) -> Vec<Option<String>> {
    let chars = text.chars().collect::<Vec<_>>();
    chars
        .chunks(FIELD_WIDTH)
        .map(|field| non_blank(&field.iter().collect::<String>()))
        .collect()
}

fn trim_trailing_empty(row: &[String]) -> &[String] {
    let len = row
        .iter()
        .rposition(|cell| !cell.trim().is_empty())
        .map_or(0, |pos| pos + 1);
    &row[..len]
}

fn parse_tokens(cells: &[String]) -> Result<Vec<PartToken>> {
    cells.iter().map(|c| PartToken::parse(c.trim())).collect()
}

/// Splits a row into its construct id and part cells. `None` for blank rows.
fn split_row(row: &[String], row_idx: usize) -> Option<Result<(&str, &[String])>> {
    let cells = trim_trailing_empty(row);
    let (first, rest) = cells.split_first()?;
    let display_id = first.trim();
    if display_id.is_empty() {
        return Some(Err(VisError::malformed(
            "",
            format!("row {} has no construct id", row_idx + 1),
        )));
    }
    Some(Ok((display_id, rest)))
}

fn row_failure_key(row_idx: usize) -> String {
    format!("row {}", row_idx + 1)
}

fn resolve_combined(rows: &[Vec<String>]) -> Resolution {
    let mut resolution = Resolution::default();
    for (row_idx, row) in rows.iter().enumerate() {
        match split_row(row, row_idx) {
            None => continue,
            Some(Err(e)) => resolution.add(&row_failure_key(row_idx), Err(e)),
            Some(Ok((display_id, cells))) => {
                resolution.add(display_id, combined_descriptor(display_id, cells))
            }
        }
    }
    resolution
}

fn combined_descriptor(display_id: &str, cells: &[String]) -> Result<ConstructDescriptor> {
    let mut tokens = Vec::with_capacity(cells.len());
    let mut identifiers = Vec::with_capacity(cells.len());
    for cell in cells {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        let (identifier, token) = cell
            .split_once(':')
            .ok_or_else(|| VisError::malformed(cell, "expected '<identifier>:<token>'"))?;
        tokens.push(PartToken::parse(token.trim())?);
        identifiers.push(non_blank(identifier));
    }
    ConstructDescriptor::new(display_id, tokens, identifiers)
}

fn resolve_tab_parallel(
    structure: &[Vec<String>],
    identifiers: Option<&IdentifierTable>,
) -> Resolution {
    let mut resolution = Resolution::default();
    for (row_idx, row) in structure.iter().enumerate() {
        let (display_id, cells) = match split_row(row, row_idx) {
            None => continue,
            Some(Err(e)) => {
                resolution.add(&row_failure_key(row_idx), Err(e));
                continue;
            }
            Some(Ok(split)) => split,
        };
        let descriptor = parse_tokens(cells).and_then(|tokens| {
            let ids = match identifiers {
                None => tokens.iter().map(|t| Some(t.to_string())).collect(),
                Some(table) => {
                    let id_row = table.rows().get(row_idx).ok_or_else(|| {
                        VisError::misaligned(
                            display_id,
                            format!("identifier table has no row {}", row_idx + 1),
                        )
                    })?;
                    match table {
                        IdentifierTable::FixedWidth(_) => {
                            fixed_width_identifiers(display_id, &tokens, id_row)?
                        }
                        IdentifierTable::TabElided(_) => {
                            elided_identifiers(display_id, &tokens, id_row)?
                        }
                    }
                }
            };
            ConstructDescriptor::new(display_id, tokens, ids)
        });
        resolution.add(display_id, descriptor);
    }
    resolution
}

fn check_no_leftovers(display_id: &str, leftovers: &[Option<String>]) -> Result<()> {
    match leftovers.iter().flatten().next() {
        Some(extra) => Err(VisError::misaligned(
            display_id,
            format!("identifier '{extra}' has no matching part slot"),
        )),
        None => Ok(()),
    }
}

fn fixed_width_identifiers(
    display_id: &str,
    tokens: &[PartToken],
    id_row: &[Option<String>],
) -> Result<Vec<Option<String>>> {
    let fields = id_row.get(1..).unwrap_or_default();
    check_no_leftovers(display_id, fields.get(tokens.len()..).unwrap_or_default())?;
    Ok((0..tokens.len())
        .map(|i| fields.get(i).cloned().flatten())
        .collect())
}

fn elided_identifiers(
    display_id: &str,
    tokens: &[PartToken],
    id_row: &[Option<String>],
) -> Result<Vec<Option<String>>> {
    let mut column = 1;
    let mut ids = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.is_elided_promoter() {
            ids.push(None);
            continue;
        }
        ids.push(id_row.get(column).cloned().flatten());
        column += 1;
    }
    check_no_leftovers(display_id, id_row.get(column..).unwrap_or_default())?;
    Ok(ids)
}

/// Header offset and per-construct identifier fields of an equivalence file.
struct EquivalenceTable {
    rows: HashMap<String, Vec<Option<String>>>,
}

impl EquivalenceTable {
    /// Fails with the header row when the anchor cannot be located.
    fn parse<'a>(lines: &'a [String], anchor: &str) -> std::result::Result<Self, &'a str> {
        let mut lines = lines.iter().filter(|l| !l.trim().is_empty());
        let header = lines.next().map(String::as_str).unwrap_or_default();
        let start = header
            .find(anchor)
            .filter(|_| !anchor.is_empty())
            .ok_or(header)?;
        if header[start + anchor.len()..].contains(anchor) {
            tracing::warn!(anchor, "equivalence anchor occurs more than once, using the first");
        }

        // Columns are counted in characters, like fixed-width identifier files
        let offset = header[..start].chars().count();
        let mut rows = HashMap::new();
        for line in lines {
            let key = line.chars().take(offset).collect::<String>();
            let rest = line.chars().skip(offset).collect::<String>();
            rows.entry(key.trim().to_string()).or_insert_with(|| fixed_width_fields(&rest));
        }
        Ok(Self { rows })
    }
}

struct LibraryRow<'a> {
    key: &'a str,
    tokens: Vec<PartToken>,
}

fn resolve_library(library: &[Vec<String>], equivalence: &[String]) -> Resolution {
    let mut resolution = Resolution::default();

    let mut rows: Vec<LibraryRow> = vec![];
    for (row_idx, row) in library.iter().enumerate() {
        match split_row(row, row_idx) {
            None => continue,
            Some(Err(e)) => resolution.add(&row_failure_key(row_idx), Err(e)),
            Some(Ok((key, cells))) => {
                let tokens = cells
                    .iter()
                    .map(|c| PartToken::parse(&expand_abbreviation(c.trim())))
                    .collect::<Result<Vec<_>>>();
                match tokens {
                    Ok(tokens) => rows.push(LibraryRow { key, tokens }),
                    Err(e) => resolution.add(key, Err(e)),
                }
            }
        }
    }

    // The header repeats the first construct's structure; its first part
    // token fixes where the identifier columns begin.
    let anchor = library
        .iter()
        .find_map(|row| {
            let cells = trim_trailing_empty(row);
            (!cells.is_empty()).then(|| cells.get(1).map(|c| c.trim()))
        })
        .flatten()
        .unwrap_or_default();
    let table = match EquivalenceTable::parse(equivalence, anchor) {
        Ok(table) => table,
        Err(header) => {
            for row in &rows {
                resolution.add(
                    row.key,
                    Err(VisError::UnresolvableEquivalence {
                        anchor: anchor.to_string(),
                        row: header.trim_end().to_string(),
                    }),
                );
            }
            return resolution;
        }
    };

    // Parts are physically shared between constructs: the first concrete
    // identifier seen for a token is used everywhere.
    let mut shared: HashMap<PartToken, Option<String>> = HashMap::new();
    let mut accepted: Vec<&LibraryRow> = vec![];
    for row in &rows {
        let offered = table.rows.get(row.key).map(Vec::as_slice).unwrap_or_default();
        if offered.is_empty() {
            tracing::debug!(construct = row.key, "no equivalence row, using shared parts");
        }
        let leftovers = offered.get(row.tokens.len()..).unwrap_or_default();
        if let Err(e) = check_no_leftovers(row.key, leftovers) {
            resolution.add(row.key, Err(e));
            continue;
        }
        for (i, token) in row.tokens.iter().enumerate() {
            let slot = shared.entry(*token).or_insert(None);
            if slot.is_none() {
                *slot = offered.get(i).cloned().flatten();
            }
        }
        accepted.push(row);
    }

    for row in accepted {
        let ids = row
            .tokens
            .iter()
            .map(|t| shared.get(t).cloned().flatten())
            .collect();
        resolution.add(
            row.key,
            ConstructDescriptor::new(row.key, row.tokens.clone(), ids),
        );
    }
    resolution
}

/// Matrix values select palette positions, so a level past the palette has
/// nothing to draw with.
fn matrix_level(value: u32, row_idx: usize) -> Result<u32> {
    if value as usize >= palette_size() {
        return Err(VisError::InvalidDesignMatrix {
            row: row_idx + 1,
            reason: format!("level {value} exceeds the {}-colour palette", palette_size()),
        });
    }
    Ok(value + 1)
}

/// Column index of the promoter driven by matrix column `column` (1, 3, 5, ...).
fn promoter_column(column: usize) -> u32 {
    column as u32 + 3
}

fn resolve_matrix(matrix: &[Vec<u32>]) -> Resolution {
    let mut resolution = Resolution::default();

    let columns = matrix.iter().map(Vec::len).max().unwrap_or(0);
    for column in (1..columns).step_by(2) {
        let Some(max) = matrix
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|value| (**value as usize) < palette_size())
            .max()
        else {
            continue;
        };
        for level in 1..=max + 1 {
            let token = PartToken::new(PartType::Promoter, promoter_column(column), level);
            resolution.library.parts_mut().register(&token.to_string());
        }
    }

    let width = matrix.len().to_string().len();
    for (row_idx, row) in matrix.iter().enumerate() {
        let key = format!("C{:0width$}", row_idx + 1);
        let descriptor = matrix_descriptor(&key, row_idx, row);
        resolution.add(&key, descriptor);
    }
    resolution
}

fn matrix_descriptor(key: &str, row_idx: usize, row: &[u32]) -> Result<ConstructDescriptor> {
    let (origin, factors) = row
        .split_first()
        .ok_or_else(|| VisError::InvalidDesignMatrix {
            row: row_idx + 1,
            reason: "empty row".to_string(),
        })?;
    if factors.len() % 2 != 0 {
        return Err(VisError::InvalidDesignMatrix {
            row: row_idx + 1,
            reason: "promoter and gene columns must come in pairs".to_string(),
        });
    }
    let mut tokens = vec![
        PartToken::new(PartType::Origin, 1, matrix_level(*origin, row_idx)?),
        MATRIX_RESISTANCE,
    ];
    for (pair_idx, pair) in factors.chunks(2).enumerate() {
        let column = promoter_column(2 * pair_idx + 1);
        tokens.push(PartToken::new(
            PartType::Promoter,
            column,
            matrix_level(pair[0], row_idx)?,
        ));
        tokens.push(PartToken::new(
            PartType::Gene,
            column + 1,
            matrix_level(pair[1], row_idx)?,
        ));
    }
    let ids = tokens.iter().map(|t| Some(t.to_string())).collect();
    ConstructDescriptor::new(key, tokens, ids)
}
