//! Decoding of the DoE input files into the in-memory tables the resolver
//! works on.

use crate::error::{Result, VisError};
use crate::resolver::fixed_width_fields;
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;

fn read_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(|l| l.trim_end().to_string()).collect())
}

fn blank_to_none(cell: &str) -> Option<String> {
    let cell = cell.trim();
    (!cell.is_empty()).then(|| cell.to_string())
}

pub fn split_tab_row(line: &str) -> Vec<String> {
    line.trim_end()
        .split('\t')
        .map(|cell| cell.to_string())
        .collect()
}

/// Splits a line into fixed-width fields; blank fields are absent.
pub fn split_fixed_width(line: &str) -> Vec<Option<String>> {
    fixed_width_fields(line.trim_end())
}

/// Tab separated structural table, one construct per line.
pub fn read_structural_table<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    Ok(read_lines(path)?.iter().map(|l| split_tab_row(l)).collect())
}

pub fn read_fixed_width_identifiers<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Option<String>>>> {
    Ok(read_lines(path)?.iter().map(|l| split_fixed_width(l)).collect())
}

pub fn read_tab_identifiers<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Option<String>>>> {
    Ok(read_lines(path)?
        .iter()
        .map(|l| split_tab_row(l).iter().map(|c| blank_to_none(c)).collect())
        .collect())
}

/// Library description, `key<TAB>token<TAB>...`.
pub fn read_library_table<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    read_structural_table(path)
}

/// Equivalence files are sliced by byte offsets, so lines are kept verbatim
/// apart from trailing whitespace.
pub fn read_equivalence_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    read_lines(path)
}

fn csv_reader<P: AsRef<Path>>(path: P) -> Result<csv::Reader<fs::File>> {
    Ok(ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?)
}

/// Combined file: `id,<identifier>:<token>,...`.
pub fn read_combined_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    let mut rows = vec![];
    for record in csv_reader(path)?.records() {
        let record = record?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    Ok(rows)
}

/// Numeric design matrix. A leading row with non-numeric cells is taken as a
/// header and skipped. Trailing empty cells are dropped; an empty cell inside
/// a row would shift the factor columns and is rejected.
pub fn read_design_matrix<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<u32>>> {
    let mut rows = vec![];
    for (row_idx, record) in csv_reader(path)?.records().enumerate() {
        let record = record?;
        let cells = record.iter().collect::<Vec<_>>();
        let len = cells
            .iter()
            .rposition(|cell| !cell.is_empty())
            .map_or(0, |pos| pos + 1);
        if len == 0 {
            continue;
        }
        let cells = &cells[..len];
        let is_header = cells
            .iter()
            .any(|cell| !cell.is_empty() && cell.parse::<u32>().is_err());
        if row_idx == 0 && is_header {
            continue;
        }
        let invalid = |reason: String| VisError::InvalidDesignMatrix {
            row: row_idx + 1,
            reason,
        };
        let mut row = Vec::with_capacity(len);
        for (col_idx, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                return Err(invalid(format!("column {} is empty", col_idx + 1)));
            }
            row.push(cell.parse::<u32>().map_err(|e| invalid(e.to_string()))?);
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_split_fixed_width() {
        let line = format!("{:<16}{:<16}{:<16}", "C1", "SBC001", "");
        assert_eq!(
            split_fixed_width(&line),
            vec![Some("C1".to_string()), Some("SBC001".to_string())]
        );
        let line = format!("{:<16}{:<16}{:<16}", "C1", "", "SBC002");
        assert_eq!(
            split_fixed_width(&line),
            vec![Some("C1".to_string()), None, Some("SBC002".to_string())]
        );
    }

    #[test]
    fn test_read_structural_and_tab_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let structure = write_file(&dir, "doe.txt", "C1\torigin1_1\tgene5_1\nC2\torigin1_2\n");
        let ids = write_file(&dir, "ids.txt", "C1\tSBC001\t\nC2\tSBC002\n");
        let rows = read_structural_table(structure).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["C1", "origin1_1", "gene5_1"]);
        let id_rows = read_tab_identifiers(ids).unwrap();
        assert_eq!(id_rows[0], vec![Some("C1".to_string()), Some("SBC001".to_string())]);
    }

    #[test]
    fn test_read_combined_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "doe.csv",
            "C1,SBC001:origin1_1,:promoter4_2\nC2,SBC001:origin1_1\n",
        );
        let rows = read_combined_csv(path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][2], ":promoter4_2");
        assert_eq!(rows[1].len(), 2);
    }

    #[test]
    fn test_read_design_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "matrix.csv", "ori,p1,g1\n0,1,0\n1, 0 ,2\n\n");
        assert_eq!(
            read_design_matrix(path).unwrap(),
            vec![vec![0, 1, 0], vec![1, 0, 2]]
        );
        let bad = write_file(&dir, "bad.csv", "0,1,0\n1,x,2\n");
        assert!(matches!(
            read_design_matrix(bad),
            Err(VisError::InvalidDesignMatrix { row: 2, .. })
        ));
    }

    #[test]
    fn test_design_matrix_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let trailing = write_file(&dir, "trailing.csv", "0,1,0,,\n");
        assert_eq!(read_design_matrix(trailing).unwrap(), vec![vec![0, 1, 0]]);
        let gapped = write_file(&dir, "gapped.csv", "0,,1,,2\n");
        assert!(matches!(
            read_design_matrix(gapped),
            Err(VisError::InvalidDesignMatrix { row: 1, .. })
        ));
        let later = write_file(&dir, "later.csv", "0,1,0\n0,,1,2,0\n");
        assert!(matches!(
            read_design_matrix(later),
            Err(VisError::InvalidDesignMatrix { row: 2, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_structural_table("/nonexistent/doe.txt"),
            Err(VisError::Io(_))
        ));
    }
}
