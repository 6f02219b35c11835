use log::{debug, info};

/// Thin wrapper over the `log` facade that tags records with the stage
/// that produced them.
pub struct LogManager {
    stage: &'static str,
}

impl LogManager {
    pub fn for_stage(stage: &'static str) -> Self {
        Self { stage }
    }

    pub fn info(&self, message: &str) {
        info!("[{}] {}", self.stage, message);
    }

    pub fn debug(&self, message: &str) {
        debug!("[{}] {}", self.stage, message);
    }
}
