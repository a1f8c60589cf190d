// ─────────────────────────────────────────────────────────────────────
// SCPN Heat Relax — Grid Output
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Text dump of the framed global grid: one line per row, every value
//! printed with six decimals and followed by a comma.

use crate::gather::GlobalGrid;
use heat_types::error::HeatResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn format_grid_csv<W: Write>(grid: &GlobalGrid, out: &mut W) -> HeatResult<()> {
    for row in grid.cells().rows() {
        for v in row {
            write!(out, "{v:.6},")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Write the framed grid to `path`, truncating any existing file.
pub fn write_grid_csv<P: AsRef<Path>>(grid: &GlobalGrid, path: P) -> HeatResult<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    format_grid_csv(grid, &mut out)?;
    out.flush()?;
    log::info!(
        "wrote {}×{} framed grid to {}",
        grid.width() + 2,
        grid.height() + 2,
        path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_format_layout() {
        let grid = GlobalGrid::from_cells(1, 1, array![
            [60.0, 60.0, 60.0],
            [60.0, 20.5, 60.0],
            [60.0, 60.0, 1.0 / 3.0],
        ])
        .unwrap();
        let mut buf = Vec::new();
        format_grid_csv(&grid, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "60.000000,60.000000,60.000000,\n\
             60.000000,20.500000,60.000000,\n\
             60.000000,60.000000,0.333333,\n"
        );
    }

    #[test]
    fn test_nan_is_written_not_rejected() {
        let grid = GlobalGrid::new(1, 1, f64::NAN);
        let mut buf = Vec::new();
        format_grid_csv(&grid, &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().starts_with("NaN,"));
    }

    #[test]
    fn test_write_grid_file() {
        let path = std::env::temp_dir().join(format!("heat_output_{}.txt", std::process::id()));
        let grid = GlobalGrid::new(4, 2, 1.5);
        write_grid_csv(&grid, &path).expect("write");
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.matches(',').count() == 6));
    }

    #[test]
    fn test_write_to_missing_directory_is_io_error() {
        let grid = GlobalGrid::new(1, 1, 0.0);
        let err = write_grid_csv(&grid, "/nonexistent-dir/heat/out.txt").expect_err("no dir");
        assert!(matches!(err, heat_types::error::HeatError::Io(_)));
    }
}
