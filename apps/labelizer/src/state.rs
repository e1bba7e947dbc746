use std::sync::Arc;

use anyhow::{bail, Result};

use crate::barcode::{SymbolEncoder, UpcA, WriterOptions};
use crate::config::Config;
use crate::layout::{default_geometry, LabelGeometry};

/// Everything that stays fixed for one run, handed to the orchestrator.
#[derive(Clone)]
pub struct RunState {
    pub config: Config,
    /// Sheet geometry shared by every output document in the run.
    pub geometry: LabelGeometry,
    /// Symbology used for every barcode. Default: UPC-A.
    pub encoder: Arc<dyn SymbolEncoder>,
    /// Base image options; caption typography is applied per record.
    pub writer_options: WriterOptions,
}

impl RunState {
    /// Builds the run state, rejecting settings the geometry cannot honour.
    pub fn new(config: Config) -> Result<Self> {
        let geometry = default_geometry();
        let per_page = geometry.cells_per_page();
        if config.skip_cells >= per_page {
            bail!(
                "LABELIZER_SKIP_CELLS is {} but a sheet has only {per_page} cells",
                config.skip_cells
            );
        }

        Ok(RunState {
            config,
            geometry,
            encoder: Arc::new(UpcA),
            writer_options: WriterOptions::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_cells_below_page_size_is_accepted() {
        let config = Config {
            skip_cells: 29,
            ..Config::default()
        };
        assert!(RunState::new(config).is_ok());
    }

    #[test]
    fn test_skip_cells_of_a_full_page_is_rejected() {
        let config = Config {
            skip_cells: 30,
            ..Config::default()
        };
        let err = match RunState::new(config) {
            Ok(_) => panic!("a whole page of skipped cells must be rejected"),
            Err(e) => e.to_string(),
        };
        assert!(err.contains("LABELIZER_SKIP_CELLS"), "message names the setting: {err}");
    }
}
