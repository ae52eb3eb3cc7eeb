//! Demo Data
//!
//! Deterministic synthetic wellness history used as the snapshot the
//! simulated providers are carved from. Metrics are coupled the way real
//! self-tracking data tends to be: short sleep nudges up next-day sugar,
//! resting heart rate and lowers mood.

use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const DEFAULT_DEMO_DAYS: usize = 90;
pub const DEFAULT_SEED: u64 = 42;

/// One synthetic day, in snapshot column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoRow {
    pub date: NaiveDate,
    pub sleep_hours: f64,
    pub steps: i64,
    pub active_minutes: i64,
    pub calories: i64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub sugar_g: f64,
    pub resting_hr: f64,
    pub mood: f64,
    pub user_id: String,
}

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

fn normal(rng: &mut StdRng, mean: f64, std: f64) -> f64 {
    // Parameters are finite constants, so construction cannot fail
    Normal::new(mean, std).map_or(mean, |dist| dist.sample(rng))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Generate `days` of history ending on `end`
pub fn generate_demo_data(days: usize, seed: u64, end: NaiveDate) -> Vec<DemoRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = end - Duration::days(days.saturating_sub(1) as i64);

    let mut sleep: Vec<f64> = (0..days)
        .map(|_| normal(&mut rng, 7.0, 0.9).clamp(4.0, 9.5))
        .collect();

    let dips = (days / 20).max(2).min(days);
    for idx in rand::seq::index::sample(&mut rng, days, dips).into_iter() {
        let drop = rng.random_range(1.0..2.0);
        sleep[idx] = (sleep[idx] - drop).clamp(4.0, 9.5);
    }

    let steps: Vec<i64> = sleep
        .iter()
        .map(|s| (normal(&mut rng, 8500.0, 1800.0) + (s - 7.0) * 600.0).clamp(1500.0, 16000.0) as i64)
        .collect();

    let active_minutes: Vec<i64> = steps
        .iter()
        .map(|&st| (normal(&mut rng, 45.0, 18.0) + (st as f64 - 8500.0) / 400.0).clamp(5.0, 120.0) as i64)
        .collect();

    let mut sugar: Vec<f64> = (0..days)
        .map(|_| normal(&mut rng, 45.0, 12.0).clamp(10.0, 120.0))
        .collect();
    for i in 0..days.saturating_sub(1) {
        if sleep[i] < 6.0 {
            sugar[i + 1] += rng.random_range(10.0..25.0);
        }
    }
    for s in sugar.iter_mut() {
        *s = s.clamp(10.0, 140.0);
    }

    (0..days)
        .map(|i| {
            let calories =
                (normal(&mut rng, 2100.0, 250.0) + (sugar[i] - 45.0) * 4.0).clamp(1400.0, 3400.0);
            let protein = normal(&mut rng, 110.0, 25.0).clamp(50.0, 190.0);
            let carbs = (normal(&mut rng, 240.0, 50.0) + (sugar[i] - 45.0) * 1.2).clamp(100.0, 420.0);
            let fat = normal(&mut rng, 70.0, 18.0).clamp(30.0, 130.0);
            let high_activity = if active_minutes[i] > 75 { 2.0 } else { 0.0 };
            let resting_hr = (normal(&mut rng, 62.0, 4.0) + (6.5 - sleep[i]) * 1.3 + high_activity)
                .clamp(50.0, 85.0);
            let mood = (normal(&mut rng, 3.6, 0.5) - (6.0 - sleep[i]) * 0.2).clamp(1.0, 5.0);

            DemoRow {
                date: start + Duration::days(i as i64),
                sleep_hours: round_to(sleep[i], 2),
                steps: steps[i],
                active_minutes: active_minutes[i],
                calories: calories as i64,
                protein_g: round_to(protein, 1),
                carbs_g: round_to(carbs, 1),
                fat_g: round_to(fat, 1),
                sugar_g: round_to(sugar[i], 1),
                resting_hr: round_to(resting_hr, 1),
                mood: round_to(mood, 1),
                user_id: crate::unify::DEFAULT_USER_ID.to_string(),
            }
        })
        .collect()
}

/// Write rows to a temporary file next to `path`, ready to be moved over it
fn stage_csv(path: &Path, rows: &[DemoRow]) -> Result<NamedTempFile, DemoError> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(staged.as_file_mut());
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    Ok(staged)
}

/// Write rows as CSV with a header row
///
/// The file is replaced in one rename, so readers see either the old
/// snapshot or the new one, never a partial write.
pub fn write_csv(path: &Path, rows: &[DemoRow]) -> Result<(), DemoError> {
    stage_csv(path, rows)?.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Generate and write a fresh snapshot, replacing any existing file
pub fn seed_demo_data(path: &Path, days: usize, seed: u64) -> Result<PathBuf, DemoError> {
    let rows = generate_demo_data(days, seed, Utc::now().date_naive());
    write_csv(path, &rows)?;
    tracing::info!(path = ?path, days, "Wrote demo snapshot");
    Ok(path.to_path_buf())
}

/// Create the snapshot only when it does not exist yet
///
/// When two callers race, the first rename wins and the other keeps the
/// existing file.
pub fn ensure_demo_data(path: &Path, days: usize, seed: u64) -> Result<PathBuf, DemoError> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    let rows = generate_demo_data(days, seed, Utc::now().date_naive());
    match stage_csv(path, &rows)?.persist_noclobber(path) {
        Ok(_) => tracing::info!(path = ?path, days, "Wrote demo snapshot"),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
            tracing::debug!(path = ?path, "Demo snapshot created concurrently");
        }
        Err(e) => return Err(e.error.into()),
    }
    Ok(path.to_path_buf())
}
