// ankle_sim/src/output.rs

//! Trajectory export, the hand-off point for plotting tools.

use ankle_core::prelude::Trajectory;
use std::io::Write;
use std::path::Path;

use crate::data::DataError;

pub const HEADER: [&str; 4] = ["time", "activation", "angle", "velocity"];

/// Writes one row per solver time: `time,activation,angle,velocity`.
pub fn write_trajectory_to<W: Write>(
    sink: W,
    trajectory: &Trajectory,
    path: &Path,
) -> Result<(), DataError> {
    let to_error = |source: csv::Error| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(HEADER).map_err(to_error)?;
    for (i, t) in trajectory.times.iter().enumerate() {
        let x = trajectory.state(i);
        writer
            .write_record(&[t.to_string(), x[0].to_string(), x[1].to_string(), x[2].to_string()])
            .map_err(to_error)?;
    }
    writer.flush().map_err(|e| to_error(e.into()))?;
    Ok(())
}

pub fn write_trajectory(path: &Path, trajectory: &Trajectory) -> Result<(), DataError> {
    let file = std::fs::File::create(path).map_err(|e| DataError::Csv {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    write_trajectory_to(file, trajectory, path)
}
