use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) const MIN_FPS: u32 = 10;
pub(crate) const MAX_FPS: u32 = 240;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "gilded-reef")]
#[command(about = "Gilded underwater clock aquarium in braille")]
pub(crate) struct Cli {
    /// Frame cap (10-240)
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// RNG seed. Defaults to one derived from the clock.
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// World units per canvas sub-pixel
    #[arg(long)]
    pub(crate) scale: Option<f32>,

    /// Parameter override, e.g. --set num_fish=20 (repeatable)
    #[arg(long = "set", value_name = "ID=VALUE")]
    pub(crate) overrides: Vec<String>,

    /// JSON file of parameter definitions
    #[arg(long)]
    pub(crate) params: Option<PathBuf>,

    /// Settings file (default: platform config dir)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Write the merged settings back to the settings file
    #[arg(long)]
    pub(crate) save_config: bool,

    /// Start with the HUD hidden
    #[arg(long)]
    pub(crate) no_hud: bool,

    /// Monochrome output
    #[arg(long)]
    pub(crate) no_color: bool,

    /// Write logs to this file
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) seed: Option<u64>,
    pub(crate) world_scale: f32,
    pub(crate) show_hud: bool,
    pub(crate) enable_color: bool,
    pub(crate) loose_seaweed: usize,
    pub(crate) overrides: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            seed: None,
            world_scale: 4.0,
            show_hud: true,
            enable_color: true,
            loose_seaweed: 0,
            overrides: Vec::new(),
        }
    }
}

impl Settings {
    /// Layer command-line flags over file settings. Overrides from the file
    /// are applied first so the command line wins on the same id.
    pub(crate) fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(fps) = cli.fps {
            self.fps_cap = fps;
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
        if let Some(scale) = cli.scale {
            self.world_scale = scale;
        }
        if cli.no_hud {
            self.show_hud = false;
        }
        if cli.no_color {
            self.enable_color = false;
        }
        self.overrides.extend(cli.overrides.iter().cloned());
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        self.fps_cap = self.fps_cap.clamp(MIN_FPS, MAX_FPS);
        if !self.world_scale.is_finite() || self.world_scale < 0.25 {
            log::warn!("world scale {} out of range, using 4.0", self.world_scale);
            self.world_scale = 4.0;
        }
        self
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
}

pub(crate) fn project_paths(cli: &Cli) -> Result<Paths> {
    if let Some(path) = &cli.config {
        return Ok(Paths {
            settings_path: path.clone(),
        });
    }
    let proj = ProjectDirs::from("com", "gilded-reef", "GildedReef")
        .context("could not resolve project directories")?;
    let dir = proj.config_dir().to_path_buf();
    Ok(Paths {
        settings_path: dir.join("settings.json"),
    })
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    let text = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            log::info!("no settings at {}: {e}", path.display());
            return Settings::default();
        }
    };
    match serde_json::from_str::<Settings>(&text) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("ignoring malformed settings {}: {e}", path.display());
            Settings::default()
        }
    }
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating config dir {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    log::info!("saved settings to {}", path.display());
    Ok(())
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename-over-existing is not atomic on Windows
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
        .with_context(|| format!("renaming {} to {}", from.display(), to.display()))?;
    Ok(())
}

/// Logs go to `log_file` when given. Otherwise nothing is printed unless
/// `RUST_LOG` asks for it, since stderr shares the alternate screen.
pub(crate) fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let default_filter = if log_file.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = log_file {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("logger already initialised")?;
    Ok(())
}
