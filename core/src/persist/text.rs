use crate::prelude::PipelineResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Debug-only text dump: `# Rows: R, Cols: C` header, then tab-separated
/// rows with 8 decimal places.
pub fn save_matrix_text<P: AsRef<Path>>(
    path: P,
    data: &[f32],
    rows: usize,
    cols: usize,
) -> PipelineResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "# Rows: {}, Cols: {}", rows, cols)?;
    for r in 0..rows {
        for c in 0..cols {
            if c > 0 {
                write!(writer, "\t")?;
            }
            write!(writer, "{:.8}", data[r * cols + c])?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
