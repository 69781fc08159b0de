use super::artifacts::{self, QuarantinedArtifactSet, REPORT_EXT, TRAJECTORY_EXT};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SpliceError {
    #[error("I/O error while merging partial outputs: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse tabular report: {0}")]
    Report(#[from] csv::Error),
}

/// Merges each quarantined attempt's partial outputs with the final
/// successful output into one continuous trajectory/report pair.
///
/// Report rows are concatenated in attempt order; rows whose step index does
/// not advance past the previous attempt's last row are dropped, so step
/// numbering in the merged report stays strictly monotonic. Trajectory
/// payloads are concatenated in the same order. The merged result replaces
/// the canonical file; the quarantined partials are left in place.
pub fn merge_partial_outputs(
    sim_dir: &Path,
    partials: &[QuarantinedArtifactSet],
) -> Result<(), SpliceError> {
    let mut ordered: Vec<&QuarantinedArtifactSet> = partials.iter().collect();
    ordered.sort_by_key(|set| set.attempt);

    let mut merged_reports = 0usize;
    let mut merged_trajectories = 0usize;
    for canonical in canonical_outputs(sim_dir)? {
        let Some(ext) = canonical.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let inputs = ordered_inputs(&canonical, &ordered, ext);
        if inputs.len() == 1 {
            // Nothing quarantined for this stem; the canonical file already
            // is the continuous output.
            continue;
        }
        match ext {
            REPORT_EXT => {
                merge_reports(&inputs, &canonical)?;
                merged_reports += 1;
            }
            TRAJECTORY_EXT => {
                concatenate(&inputs, &canonical)?;
                merged_trajectories += 1;
            }
            _ => unreachable!("canonical_outputs only yields report and trajectory files"),
        }
    }

    info!(
        dir = %sim_dir.display(),
        attempts = ordered.len(),
        reports = merged_reports,
        trajectories = merged_trajectories,
        "Merged partial outputs into continuous result."
    );
    Ok(())
}

/// Canonical (untagged) report and trajectory files in the stage directory.
fn canonical_outputs(sim_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut outputs: Vec<PathBuf> = fs::read_dir(sim_dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_name()?.to_str()?;
            let ext = path.extension()?.to_str()?;
            if path.is_file()
                && !name.contains("_partial_")
                && matches!(ext, REPORT_EXT | TRAJECTORY_EXT)
            {
                Some(path)
            } else {
                None
            }
        })
        .collect();
    outputs.sort();
    Ok(outputs)
}

/// Partial files for this stem in attempt order, then the canonical file.
fn ordered_inputs(
    canonical: &Path,
    ordered: &[&QuarantinedArtifactSet],
    ext: &str,
) -> Vec<PathBuf> {
    let stem = canonical
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let mut inputs = Vec::new();
    for set in ordered {
        let bucket = match ext {
            REPORT_EXT => &set.reports,
            _ => &set.trajectories,
        };
        let wanted = artifacts::partial_file_name(stem, set.attempt, ext);
        if let Some(path) = bucket
            .iter()
            .find(|p| p.file_name().and_then(|n| n.to_str()) == Some(wanted.as_str()))
        {
            inputs.push(path.clone());
        }
    }
    inputs.push(canonical.to_path_buf());
    inputs
}

/// Concatenates tabular reports, keeping one header and strictly increasing
/// step indices across attempt boundaries.
fn merge_reports(inputs: &[PathBuf], canonical: &Path) -> Result<(), SpliceError> {
    let staging = staging_path(canonical);
    {
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(&staging)?;
        let mut last_step: Option<i64> = None;
        let mut wrote_header = false;

        for input in inputs {
            debug!(file = %input.display(), "Splicing report rows.");
            let mut reader = ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(input)?;
            for record in reader.records() {
                let record = record?;
                let first = record.get(0).unwrap_or("");
                match first.trim().parse::<i64>() {
                    Ok(step) => {
                        // Attempts overlap at their boundaries: the retried
                        // run re-logs steps already covered by the partial
                        // report it resumed from.
                        if last_step.is_some_and(|prev| step <= prev) {
                            continue;
                        }
                        last_step = Some(step);
                        writer.write_record(&record)?;
                    }
                    Err(_) => {
                        if !wrote_header {
                            wrote_header = true;
                            writer.write_record(&record)?;
                        }
                    }
                }
            }
        }
        writer.flush()?;
    }
    fs::rename(&staging, canonical)?;
    Ok(())
}

/// Byte-level concatenation in attempt order, replacing the canonical file.
fn concatenate(inputs: &[PathBuf], canonical: &Path) -> Result<(), SpliceError> {
    let staging = staging_path(canonical);
    {
        let mut writer = BufWriter::new(File::create(&staging)?);
        for input in inputs {
            debug!(file = %input.display(), "Appending trajectory payload.");
            let mut reader = BufReader::new(File::open(input)?);
            io::copy(&mut reader, &mut writer)?;
        }
    }
    fs::rename(&staging, canonical)?;
    Ok(())
}

fn staging_path(canonical: &Path) -> PathBuf {
    let mut name = canonical.as_os_str().to_os_string();
    name.push(".merging");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_report(path: &Path, steps: &[i64]) {
        let mut body = String::from("#\"Step\",\"Potential Energy (kJ/mole)\"\n");
        for step in steps {
            body.push_str(&format!("{step},-{step}.5\n"));
        }
        fs::write(path, body).unwrap();
    }

    fn report_steps(path: &Path) -> Vec<i64> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .filter_map(|line| line.split(',').next()?.parse().ok())
            .collect()
    }

    fn quarantined(dir: &Path, attempt: u32) -> QuarantinedArtifactSet {
        artifacts::quarantine(dir, attempt).unwrap()
    }

    #[test]
    fn merges_reports_in_attempt_order_with_monotonic_steps() {
        let dir = tempdir().unwrap();

        write_report(&dir.path().join("report.csv"), &[100, 200, 300]);
        let first = quarantined(dir.path(), 1);
        // The retried run resumed from step 200 and re-logged it.
        write_report(&dir.path().join("report.csv"), &[200, 300, 400, 500]);
        let second = quarantined(dir.path(), 2);
        write_report(&dir.path().join("report.csv"), &[500, 600, 700]);

        merge_partial_outputs(dir.path(), &[first, second]).unwrap();

        let steps = report_steps(&dir.path().join("report.csv"));
        assert_eq!(steps, vec![100, 200, 300, 400, 500, 600, 700]);
    }

    #[test]
    fn merged_report_keeps_a_single_header() {
        let dir = tempdir().unwrap();

        write_report(&dir.path().join("report.csv"), &[1, 2]);
        let first = quarantined(dir.path(), 1);
        write_report(&dir.path().join("report.csv"), &[3, 4]);

        merge_partial_outputs(dir.path(), &[first]).unwrap();

        let body = fs::read_to_string(dir.path().join("report.csv")).unwrap();
        let headers = body.lines().filter(|l| l.contains("Step")).count();
        assert_eq!(headers, 1);
    }

    #[test]
    fn concatenates_trajectories_in_attempt_order() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("trajectory.dcd"), b"one;").unwrap();
        let first = quarantined(dir.path(), 1);
        fs::write(dir.path().join("trajectory.dcd"), b"two;").unwrap();
        let second = quarantined(dir.path(), 2);
        fs::write(dir.path().join("trajectory.dcd"), b"final").unwrap();

        merge_partial_outputs(dir.path(), &[second.clone(), first.clone()]).unwrap();

        let merged = fs::read(dir.path().join("trajectory.dcd")).unwrap();
        assert_eq!(merged, b"one;two;final");
        // Partials are preserved, never deleted.
        assert!(dir.path().join("trajectory_partial_1.dcd").is_file());
        assert!(dir.path().join("trajectory_partial_2.dcd").is_file());
    }

    #[test]
    fn leaves_canonical_files_alone_when_nothing_was_quarantined() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("trajectory.dcd"), b"only").unwrap();
        write_report(&dir.path().join("report.csv"), &[1]);

        merge_partial_outputs(dir.path(), &[]).unwrap();

        assert_eq!(fs::read(dir.path().join("trajectory.dcd")).unwrap(), b"only");
        assert_eq!(report_steps(&dir.path().join("report.csv")), vec![1]);
    }
}
