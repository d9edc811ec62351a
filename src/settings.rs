use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::config as defaults;
use crate::layout::LayoutKind;
use crate::material::TransparentMedium;


/// Scoring weights for the layout cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub illuminance: f32,
    pub shadow: f32,
    pub aesthetic: f32,
    pub proximity: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            illuminance: 0.6,
            shadow: 0.25,
            aesthetic: 0.15,
            proximity: 0.1,
        }
    }
}

/// Per-layout tunables for the candidate generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Aesthetic preference in [0, 1], higher is more pleasing.
    pub aesthetic: f32,
    /// Multiplier on the lumen budget before it is split across fixtures.
    pub lumen_factor: f32,
    /// Upper bound (m) of the layout's spacing, radius or half-diagonal.
    pub max_spacing: f32,
    /// Spacing is also capped at `area_fraction · √area`.
    pub area_fraction: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub single: LayoutParams,
    pub dual: LayoutParams,
    pub triangle: LayoutParams,
    pub square: LayoutParams,
}

impl LayoutSettings {
    pub fn params(&self, kind: LayoutKind) -> &LayoutParams {
        match kind {
            LayoutKind::Single => &self.single,
            LayoutKind::Dual => &self.dual,
            LayoutKind::Triangle => &self.triangle,
            LayoutKind::Square => &self.square,
        }
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        let params = |aesthetic, lumen_factor, max_spacing, area_fraction| LayoutParams {
            aesthetic,
            lumen_factor,
            max_spacing,
            area_fraction,
        };
        Self {
            single: params(1.0, 1.0, 0.0, 0.0),
            dual: params(0.8, 1.05, 2.0, 0.4),
            triangle: params(0.9, 1.1, 1.5, 0.3),
            square: params(0.95, 1.15, 1.2, 0.25),
        }
    }
}

/// Runtime configuration for the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub air_extinction: f32,
    pub distance_epsilon: f32,
    pub cosine_threshold: f32,
    pub reflection_threshold: f32,
    pub transmission_cutoff: f32,
    pub blocking_radius: f32,
    pub blocked_shadow_factor: f32,
    pub medium_refr_index: f32,
    /// When false, light paths are never considered blocked.
    pub occlusion: bool,
    /// Whether a room's furniture lights count towards its illuminance.
    pub include_task_lights: bool,
    pub media: Vec<TransparentMedium>,

    pub floor_z: f32,
    pub work_plane_height: f32,
    pub fixture_drop: f32,
    pub wall_margin: f32,
    pub sample_offset: f32,
    pub grid_divisions: usize,
    pub default_lux: f32,
    pub default_room_area: f32,
    pub default_ceiling_height: f32,

    pub cluster_edge_length: f32,
    pub cluster_min_size: usize,
    pub room_cluster_distance: f32,

    pub weights: Weights,
    pub shadow_score_cap: f32,
    pub overlit_factor: f32,
    pub overlit_weight: f32,
    pub min_fixture_spacing: f32,
    pub layouts: LayoutSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            air_extinction: defaults::AIR_EXTINCTION,
            distance_epsilon: defaults::DISTANCE_EPSILON,
            cosine_threshold: defaults::COSINE_THRESHOLD,
            reflection_threshold: defaults::REFLECTION_THRESHOLD,
            transmission_cutoff: defaults::TRANSMISSION_CUTOFF,
            blocking_radius: defaults::BLOCKING_RADIUS,
            blocked_shadow_factor: defaults::BLOCKED_SHADOW_FACTOR,
            medium_refr_index: defaults::MEDIUM_REFR_INDEX,
            occlusion: true,
            include_task_lights: true,
            media: TransparentMedium::defaults(),

            floor_z: defaults::FLOOR_Z,
            work_plane_height: defaults::WORK_PLANE_HEIGHT,
            fixture_drop: defaults::FIXTURE_DROP,
            wall_margin: defaults::WALL_MARGIN,
            sample_offset: defaults::SAMPLE_OFFSET,
            grid_divisions: defaults::GRID_DIVISIONS,
            default_lux: defaults::DEFAULT_LUX,
            default_room_area: defaults::DEFAULT_ROOM_AREA,
            default_ceiling_height: defaults::DEFAULT_CEILING_HEIGHT,

            cluster_edge_length: defaults::CLUSTER_EDGE_LENGTH,
            cluster_min_size: defaults::CLUSTER_MIN_SIZE,
            room_cluster_distance: defaults::ROOM_CLUSTER_DISTANCE,

            weights: Weights::default(),
            shadow_score_cap: defaults::SHADOW_SCORE_CAP,
            overlit_factor: defaults::OVERLIT_FACTOR,
            overlit_weight: defaults::OVERLIT_WEIGHT,
            min_fixture_spacing: defaults::MIN_FIXTURE_SPACING,
            layouts: LayoutSettings::default(),
        }
    }
}

impl Settings {
    /// Renders the settings as TOML, in the same shape `config/default.toml` uses.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("could not serialize settings")
    }
}

/// Loads `config/default.toml` with no environment or CLI overrides.
pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let settings: Settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("error loading configuration")?
        .try_deserialize()
        .context("error deserializing configuration")?;

    validate_config(&settings)?;

    Ok(settings)
}

/// Loads settings from `config/local.toml` (or `config/default.toml` when
/// there is no local file), then `LUXPLAN_*` environment variables, then the
/// command-line overrides in `args`.
pub fn load_config(args: &CliArgs) -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    let config_file = if local_config.exists() {
        log::info!("using local configuration: {:?}", local_config);
        local_config
    } else {
        log::info!("using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let mut settings: Settings = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(
            Environment::with_prefix("luxplan")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("error loading configuration")?
        .try_deserialize()
        .context("error deserializing configuration")?;

    apply_overrides(&mut settings, args);
    validate_config(&settings)?;

    log::debug!("{:#?}", settings);

    Ok(settings)
}

fn apply_overrides(settings: &mut Settings, args: &CliArgs) {
    if let Some(w) = args.illuminance_weight {
        settings.weights.illuminance = w;
    }
    if let Some(w) = args.shadow_weight {
        settings.weights.shadow = w;
    }
    if let Some(w) = args.aesthetic_weight {
        settings.weights.aesthetic = w;
    }
    if let Some(w) = args.proximity_weight {
        settings.weights.proximity = w;
    }
    if let Some(k) = args.extinction {
        settings.air_extinction = k;
    }
    if let Some(lux) = args.lux {
        settings.default_lux = lux;
    }
    if args.no_occlusion {
        settings.occlusion = false;
    }
    if args.no_task_lights {
        settings.include_task_lights = false;
    }
}

/// Finds the directory holding `config/`: the cargo manifest directory when
/// run through cargo, `LUXPLAN_ROOT_DIR` when set, otherwise the nearest
/// ancestor of the executable that has a `config` subdirectory.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("LUXPLAN_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    let exe_path = env::current_exe().context("failed to get current executable path")?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(|dir| dir.to_path_buf())
        .ok_or_else(|| anyhow!("could not find project root directory"))
}

pub fn validate_config(config: &Settings) -> Result<()> {
    let w = &config.weights;
    if [w.illuminance, w.shadow, w.aesthetic, w.proximity]
        .iter()
        .any(|w| !w.is_finite() || *w < 0.0)
    {
        return Err(anyhow!("scoring weights must be finite and non-negative: {:?}", w));
    }
    if config.distance_epsilon <= 0.0 {
        return Err(anyhow!("distance epsilon must be greater than 0"));
    }
    if config.air_extinction < 0.0 {
        return Err(anyhow!("air extinction must not be negative"));
    }
    if !(0.0..1.0).contains(&config.cosine_threshold) {
        return Err(anyhow!("cosine threshold must lie in [0, 1)"));
    }
    if config.overlit_factor < 1.0 {
        return Err(anyhow!("over-lighting factor must be at least 1"));
    }
    if !(0.0..1.0).contains(&config.overlit_weight) {
        return Err(anyhow!("over-lighting weight must lie in [0, 1)"));
    }
    if config.grid_divisions == 0 {
        return Err(anyhow!("grid divisions must be at least 1"));
    }
    if config.default_room_area <= 0.0 || config.default_ceiling_height <= 0.0 {
        return Err(anyhow!("default room area and ceiling height must be positive"));
    }
    for medium in &config.media {
        if medium.refractive_index < 1.0 || medium.absorption < 0.0 {
            return Err(anyhow!("invalid transparent medium: {:?}", medium));
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about = "luxplan - shadow-aware ceiling fixture placement")]
pub struct CliArgs {
    /// Scene file (JSON) holding the indexed room graph and optional rooms.
    #[arg(short, long)]
    pub scene: Option<PathBuf>,

    /// Where to write the optimized scene. Prints to stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the effective settings as TOML and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Weight of the illuminance-adequacy error.
    #[arg(long)]
    illuminance_weight: Option<f32>,

    /// Weight of the normalized shadow score.
    #[arg(long)]
    shadow_weight: Option<f32>,

    /// Weight of the aesthetic penalty.
    #[arg(long)]
    aesthetic_weight: Option<f32>,

    /// Weight of the fixture-proximity penalty.
    #[arg(long)]
    proximity_weight: Option<f32>,

    /// Air extinction coefficient (1/m).
    #[arg(long)]
    extinction: Option<f32>,

    /// Recommended illuminance (lux) for rooms of unknown type.
    #[arg(long)]
    lux: Option<f32>,

    /// Ignore occlusion: light paths are never blocked.
    #[arg(long)]
    no_occlusion: bool,

    /// Leave furniture lights out of the illuminance sums.
    #[arg(long)]
    no_task_lights: bool,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Weights: illuminance {:.2}, shadow {:.2}, aesthetic {:.2}, proximity {:.2}
  - Air Extinction: {:.4} 1/m
  - Cosine Threshold: {:.3}
  - Blocking Radius: {:.2} m
  - Occlusion: {}
  - Task Lights Counted: {}
  - Default Lux: {:.0}
  - Transparent Media: {}
  ",
            self.weights.illuminance,
            self.weights.shadow,
            self.weights.aesthetic,
            self.weights.proximity,
            self.air_extinction,
            self.cosine_threshold,
            self.blocking_radius,
            self.occlusion,
            self.include_task_lights,
            self.default_lux,
            self.media.len(),
        )
    }
}
