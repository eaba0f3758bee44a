use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod discover;
pub mod manifest;
pub mod package;
pub mod scd;
pub mod shuffle;
pub mod voice;

#[cfg(test)]
mod testutil;

use discover::{find_primary_voices, find_remastered_voices, FoundFile};
use manifest::ModManifest;
use scd::{ScdError, ScdFile};
use shuffle::shuffle_voices;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomiserSettings {
    pub seed: u64,
    /// Root of the extracted game files.
    pub game_dir: PathBuf,
    pub language: String,
    pub output_path: PathBuf,
    pub package_zip: bool,
    pub debug: bool,
}

#[derive(Debug, Error)]
pub enum RandomiserError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("manifest error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("{name}: {source}")]
    Scd {
        name: String,
        #[source]
        source: ScdError,
    },
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RandomiserError>;

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub seed: u64,
    /// Folder holding `mod.yml` and the rewritten containers.
    pub out_root: PathBuf,
    /// Relative paths of every container written, in write order.
    pub written: Vec<String>,
    pub primary_voices: usize,
    pub remastered_voices: usize,
}

fn join_candidate(base: &Path, candidate: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for part in candidate.split(['/', '\\']) {
        if !part.is_empty() {
            path.push(part);
        }
    }
    path
}

fn scd_error(name: &str) -> impl FnOnce(ScdError) -> RandomiserError + '_ {
    move |source| RandomiserError::Scd {
        name: name.to_string(),
        source,
    }
}

fn append_spoiler(log: &mut String, file: &ScdFile) {
    log.push_str(&format!("{}:\n", file.name()));
    for (slot, voice) in file.voices().enumerate() {
        if voice.is_dummy() {
            log.push_str(&format!("  [{slot:3}] (dummy)\n"));
        } else {
            let origin = voice.origin();
            log.push_str(&format!("  [{slot:3}] <- {} [{}]\n", origin.file, origin.slot));
        }
    }
}

/// Parses every file of one pass, shuffles their voices as a single pool and
/// writes the results under `out_root`. Returns the number of pooled voices.
fn randomize_pass<R: Rng + ?Sized>(
    label: &str,
    found: &[FoundFile],
    out_root: &Path,
    rng: &mut R,
    written: &mut Vec<String>,
    spoiler: &mut String,
) -> Result<usize> {
    let mut files = Vec::with_capacity(found.len());
    for f in found {
        let data = fs::read(&f.path)?;
        let file = ScdFile::parse(&data, f.name.as_str()).map_err(scd_error(&f.name))?;
        files.push(file);
    }

    let pooled = shuffle_voices(&mut files, rng);
    log::info!("{label}: {} files, {pooled} voices shuffled", files.len());

    spoiler.push_str(&format!("== {label} ==\n"));
    for file in &files {
        let bytes = file.save().map_err(scd_error(file.name()))?;
        let dest = join_candidate(out_root, file.name());
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, &bytes)?;
        log::debug!("wrote {} ({} bytes)", dest.display(), bytes.len());

        append_spoiler(spoiler, file);
        written.push(file.name().to_string());
    }

    Ok(pooled)
}

/// Runs both redistribution passes, then writes the manifest and, when asked,
/// the zip package and spoiler log. One generator serves both passes.
pub fn run(settings: RandomiserSettings) -> Result<RunReport> {
    if !settings.game_dir.is_dir() {
        return Err(RandomiserError::Config(format!(
            "Game directory does not exist: {}",
            settings.game_dir.display()
        )));
    }

    let primary = find_primary_voices(&settings.game_dir, &settings.language)?;
    let remastered = find_remastered_voices(&settings.game_dir, &settings.language)?;
    if primary.is_empty() && remastered.is_empty() {
        return Err(RandomiserError::Config(format!(
            "No battle voice files for language '{}' under {}",
            settings.language,
            settings.game_dir.display()
        )));
    }

    let out_root = settings
        .output_path
        .join(format!("BattleVoice_{}", settings.seed));
    fs::create_dir_all(&out_root)?;

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut written = Vec::new();
    let mut spoiler = format!("Battle Voice Randomizer seed: {}\n", settings.seed);

    let primary_voices = randomize_pass(
        "primary",
        &primary,
        &out_root,
        &mut rng,
        &mut written,
        &mut spoiler,
    )?;
    let remastered_voices = randomize_pass(
        "remastered",
        &remastered,
        &out_root,
        &mut rng,
        &mut written,
        &mut spoiler,
    )?;

    ModManifest::battle_voices(&written).write(&out_root)?;
    log::info!("wrote {} containers to {}", written.len(), out_root.display());

    if settings.package_zip {
        let zip_path = settings
            .output_path
            .join(format!("BattleVoice_{}.zip", settings.seed));
        package::write_mod_zip(&out_root, &written, &zip_path)?;
        log::info!("packaged mod into {}", zip_path.display());
    }

    if settings.debug {
        fs::write(out_root.join("spoiler_log.txt"), spoiler)?;
    }

    Ok(RunReport {
        seed: settings.seed,
        out_root,
        written,
        primary_voices,
        remastered_voices,
    })
}
