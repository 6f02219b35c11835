//! Explicit, synchronous persistence for pipeline inputs and products.
//! Nothing here runs inside the per-frame hot path.

pub mod binary;
pub mod text;

pub use binary::{
    load_audio, load_gcc, load_spectra, load_srp, load_tau_table, save_audio, save_gcc,
    save_spectra, save_srp, save_tau_table,
};
pub use text::save_matrix_text;

use crate::array::MicArray;
use crate::prelude::{PipelineError, PipelineResult};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;

/// Microphone geometry interchange as JSON, the format upstream suppliers
/// hand the core.
pub fn save_geometry<P: AsRef<Path>>(path: P, geometry: &MicArray) -> PipelineResult<()> {
    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, geometry)
        .map_err(|e| PipelineError::InvalidFormat(format!("writing geometry: {}", e)))
}

pub fn load_geometry<P: AsRef<Path>>(path: P) -> PipelineResult<MicArray> {
    let file = match File::open(path.as_ref()) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(PipelineError::FileNotFound(
                path.as_ref().display().to_string(),
            ))
        }
        Err(err) => return Err(err.into()),
    };
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| PipelineError::InvalidFormat(format!("parsing geometry: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::MicPosition;
    use tempfile::tempdir;

    #[test]
    fn geometry_round_trips_as_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mics.json");
        let geometry = MicArray::new(vec![
            MicPosition::new(0.05, 0.0, 0.0),
            MicPosition::new(-0.05, 0.0, 0.01),
        ]);
        save_geometry(&path, &geometry).unwrap();
        let restored = load_geometry(&path).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.positions(), geometry.positions());
    }

    #[test]
    fn missing_geometry_is_file_not_found() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_geometry(dir.path().join("absent.json")),
            Err(PipelineError::FileNotFound(_))
        ));
    }
}
