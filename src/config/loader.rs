//! Configuration loading.

use std::fs;
use std::path::Path;

use crate::error::{AttendanceError, AttendanceResult};

use super::types::EngineConfig;

impl EngineConfig {
    /// Loads configuration from a YAML file.
    ///
    /// Missing sections and fields take their defaults; a missing file or
    /// malformed YAML is an error.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use attendance_engine::config::EngineConfig;
    ///
    /// let config = EngineConfig::load("./config/engine.yaml")?;
    /// # Ok::<(), attendance_engine::error::AttendanceError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> AttendanceResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| AttendanceError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| AttendanceError::ConfigParse {
            path: path_str,
            message: e.to_string(),
        })
    }
}
