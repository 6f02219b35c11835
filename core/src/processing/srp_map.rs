use crate::array::{MicArray, MicPairs};
use crate::prelude::{GridSpec, PipelineConfig, PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;
use ndarray::{Array2, Array3};

/// Precomputed mapping from (pair, grid cell) to the correlation-lag bin
/// implied by the geometric delay model. Built once per geometry, immutable
/// afterwards; changing the geometry means rebuilding the table.
#[derive(Debug, Clone)]
pub struct TauTable {
    indices: Array2<i32>,
    gcc_length: usize,
}

impl TauTable {
    /// Builds the table for every pair and every grid cell, elevation-major.
    pub fn build(
        geometry: &MicArray,
        pairs: &MicPairs,
        config: &PipelineConfig,
    ) -> PipelineResult<Self> {
        if geometry.len() != config.channels {
            return Err(PipelineError::InvalidParameter(format!(
                "geometry has {} mics, config expects {}",
                geometry.len(),
                config.channels
            )));
        }

        let grid = &config.grid;
        let gcc_length = config.gcc_length();
        let mut indices = Array2::zeros((pairs.len(), grid.cells()));

        for (pair_index, (m1, m2)) in pairs.iter().enumerate() {
            let pos1 = geometry
                .position(m1)
                .ok_or_else(|| PipelineError::OutOfRange(format!("mic {} missing", m1)))?;
            let pos2 = geometry
                .position(m2)
                .ok_or_else(|| PipelineError::OutOfRange(format!("mic {} missing", m2)))?;

            for e in 0..grid.elevation_bins {
                let elevation = grid.elevation(e);
                for a in 0..grid.azimuth_bins {
                    let azimuth = grid.azimuth(a);
                    for (r, &range) in grid.range_values.iter().enumerate() {
                        let (sx, sy, sz) = sph_to_cart(elevation, azimuth, range);
                        let d1 = pos1.distance_to(sx, sy, sz);
                        let d2 = pos2.distance_to(sx, sy, sz);
                        let tau = delay_in_samples(d1, d2, config);

                        let centered = gcc_length as i64 / 2 + tau as i64;
                        let clamped = centered.clamp(0, gcc_length as i64 - 1) as i32;
                        indices[(pair_index, grid.flat_index(e, a, r))] = clamped;
                    }
                }
            }
        }

        Ok(Self {
            indices,
            gcc_length,
        })
    }

    pub fn from_parts(indices: Array2<i32>, gcc_length: usize) -> Self {
        Self {
            indices,
            gcc_length,
        }
    }

    pub fn pairs(&self) -> usize {
        self.indices.nrows()
    }

    pub fn cells(&self) -> usize {
        self.indices.ncols()
    }

    pub fn gcc_length(&self) -> usize {
        self.gcc_length
    }

    pub fn indices(&self) -> &Array2<i32> {
        &self.indices
    }

    pub fn index(&self, pair: usize, cell: usize) -> i32 {
        self.indices[(pair, cell)]
    }
}

/// tau_samples = round(sample_rate * (d1 - d2) / c), rounding half away
/// from zero. A positive value means mic1 is farther, so its signal
/// arrives later.
fn delay_in_samples(d1: f32, d2: f32, config: &PipelineConfig) -> i32 {
    let tau_seconds = (d1 - d2) / config.speed_of_sound;
    (tau_seconds * config.sample_rate as f32).round() as i32
}

/// x = r sin(e) cos(a), y = r sin(e) sin(a), z = r cos(e)
fn sph_to_cart(elevation: f32, azimuth: f32, range: f32) -> (f32, f32, f32) {
    (
        range * elevation.sin() * azimuth.cos(),
        range * elevation.sin() * azimuth.sin(),
        range * elevation.cos(),
    )
}

/// Arg-max cell of an SRP map with its physical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrpPeak {
    pub elevation_bin: usize,
    pub azimuth_bin: usize,
    pub range_bin: usize,
    pub elevation_rad: f32,
    pub azimuth_rad: f32,
    pub range_m: f32,
    pub power: f32,
}

/// Steered-response-power projector. Holds the grid definition and, once
/// installed, the Tau table for the current geometry.
pub struct SrpEngine {
    grid: GridSpec,
    num_pairs: usize,
    gcc_length: usize,
    tau_table: Option<TauTable>,
    logger: LogManager,
}

impl SrpEngine {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            grid: config.grid.clone(),
            num_pairs: config.num_pairs(),
            gcc_length: config.gcc_length(),
            tau_table: None,
            logger: LogManager::for_stage("srp-map"),
        }
    }

    /// Builds and installs the table for a geometry in one step.
    pub fn build_tau_table(
        &mut self,
        geometry: &MicArray,
        pairs: &MicPairs,
        config: &PipelineConfig,
    ) -> PipelineResult<()> {
        let table = TauTable::build(geometry, pairs, config)?;
        self.logger.info(&format!(
            "tau table built: {} pairs x {} cells",
            table.pairs(),
            table.cells()
        ));
        self.tau_table = Some(table);
        Ok(())
    }

    /// Installs a previously built (or deserialized) table after checking
    /// its dimensions against the grid.
    pub fn install_tau_table(&mut self, table: TauTable) -> PipelineResult<()> {
        if table.pairs() != self.num_pairs || table.cells() != self.grid.cells() {
            return Err(PipelineError::InvalidParameter(format!(
                "tau table {}x{} does not match {} pairs x {} cells",
                table.pairs(),
                table.cells(),
                self.num_pairs,
                self.grid.cells()
            )));
        }
        if table.gcc_length() != self.gcc_length {
            return Err(PipelineError::InvalidParameter(format!(
                "tau table gcc length {} does not match {}",
                table.gcc_length(),
                self.gcc_length
            )));
        }
        self.tau_table = Some(table);
        Ok(())
    }

    pub fn tau_table(&self) -> Option<&TauTable> {
        self.tau_table.as_ref()
    }

    /// Projects the GCC curves onto the spatial grid. The map is recomputed
    /// from scratch every call, never accumulated across frames.
    pub fn project(&self, gcc: &Array2<f32>) -> PipelineResult<Array3<f32>> {
        let table = self.tau_table.as_ref().ok_or_else(|| {
            PipelineError::NotInitialized("no tau table for the current geometry".into())
        })?;
        if gcc.nrows() != table.pairs() || gcc.ncols() != self.gcc_length {
            return Err(PipelineError::InvalidParameter(format!(
                "gcc shape {}x{} does not match {} pairs x {} lags",
                gcc.nrows(),
                gcc.ncols(),
                table.pairs(),
                self.gcc_length
            )));
        }

        let grid = &self.grid;
        let mut map = Array3::zeros((grid.elevation_bins, grid.azimuth_bins, grid.range_bins()));
        for e in 0..grid.elevation_bins {
            for a in 0..grid.azimuth_bins {
                for r in 0..grid.range_bins() {
                    let cell = grid.flat_index(e, a, r);
                    let mut sum = 0.0f32;
                    for pair in 0..table.pairs() {
                        // Table entries are clamped into range at build time.
                        sum += gcc[(pair, table.index(pair, cell) as usize)];
                    }
                    map[(e, a, r)] = sum;
                }
            }
        }
        Ok(map)
    }

    /// Arg-max cell; ties go to the first cell in elevation-major order.
    pub fn peak(&self, map: &Array3<f32>) -> SrpPeak {
        let grid = &self.grid;
        let mut best = SrpPeak {
            elevation_bin: 0,
            azimuth_bin: 0,
            range_bin: 0,
            elevation_rad: grid.elevation(0),
            azimuth_rad: grid.azimuth(0),
            range_m: grid.range_values[0],
            power: f32::NEG_INFINITY,
        };
        for e in 0..grid.elevation_bins {
            for a in 0..grid.azimuth_bins {
                for r in 0..grid.range_bins() {
                    let power = map[(e, a, r)];
                    if power > best.power {
                        best = SrpPeak {
                            elevation_bin: e,
                            azimuth_bin: a,
                            range_bin: r,
                            elevation_rad: grid.elevation(e),
                            azimuth_rad: grid.azimuth(a),
                            range_m: grid.range_values[r],
                            power,
                        };
                    }
                }
            }
        }
        best
    }
}
