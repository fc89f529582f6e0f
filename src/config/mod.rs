//! TOML run configuration with `[network]`, `[run]` and `[overrides]` tables,
//! every field is optional.

use std::path::PathBuf;
use toml::{from_str, Value};
use crate::error::SweepError;
use crate::network::PopulationSizes;
use crate::neuron::calcium::CalciumMode;
use crate::overrides::ParameterOverrides;


type Result<T> = std::result::Result<T, SweepError>;

fn parse_bool(value: &Value, field_name: &str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| SweepError::Config(format!("Cannot parse {} as boolean", field_name)))
}

fn parse_usize(value: &Value, field_name: &str) -> Result<usize> {
    value
        .as_integer()
        .filter(|v| *v >= 0)
        .ok_or_else(|| SweepError::Config(format!("Cannot parse {} as unsigned integer", field_name)))
        .map(|v| v as usize)
}

fn parse_u64(value: &Value, field_name: &str) -> Result<u64> {
    value
        .as_integer()
        .filter(|v| *v >= 0)
        .ok_or_else(|| SweepError::Config(format!("Cannot parse {} as unsigned integer", field_name)))
        .map(|v| v as u64)
}

// integers are accepted so `duration = 400` parses
fn parse_f64(value: &Value, field_name: &str) -> Result<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|v| v as f64))
        .ok_or_else(|| SweepError::Config(format!("Cannot parse {} as float", field_name)))
}

fn parse_string(value: &Value, field_name: &str) -> Result<String> {
    value
        .as_str()
        .ok_or_else(|| SweepError::Config(format!("Cannot parse {} as string", field_name)))
        .map(String::from)
}

fn parse_calcium_mode(value: &Value, field_name: &str) -> Result<CalciumMode> {
    match parse_string(value, field_name)?.as_str() {
        "combined" => Ok(CalciumMode::Combined),
        "per_species" => Ok(CalciumMode::PerSpecies),
        other => Err(SweepError::Config(
            format!("Unknown {} '{}', expected 'combined' or 'per_species'", field_name, other)
        )),
    }
}

fn parse_value_with_default<T>(
    table: &Value,
    key: &str,
    parser: impl Fn(&Value, &str) -> Result<T>,
    default: T,
) -> Result<T> {
    table
        .get(key)
        .map_or(Ok(default), |value| parser(value, key))
}

/// Settings of a sweep, overrides given on the command line are applied on top
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Population sizes
    pub sizes: PopulationSizes,
    /// Use slow inactivating sodium channels
    pub use_slow: bool,
    /// Calcium pool storage
    pub calcium_mode: CalciumMode,
    /// Wiring seed, entropy when not given
    pub seed: Option<u64>,
    /// External afferents onto granule cell `i` land on granule cell `i + offset`
    pub external_granule_offset: usize,
    /// Timestep (ms)
    pub dt: f64,
    /// Write voltage traces
    pub trace: bool,
    /// Directory output files are written into
    pub output_dir: PathBuf,
    /// Default overrides, includes `sprout` and `duration`
    pub overrides: ParameterOverrides,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            sizes: PopulationSizes::default(),
            use_slow: true,
            calcium_mode: CalciumMode::Combined,
            seed: None,
            external_granule_offset: 200,
            dt: 0.01,
            trace: false,
            output_dir: PathBuf::from("."),
            overrides: ParameterOverrides::default(),
        }
    }
}

impl RunConfig {
    /// Parses a configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Value = from_str(contents).map_err(|e| SweepError::Config(e.to_string()))?;
        let defaults = RunConfig::default();
        let empty = Value::Table(toml::map::Map::new());

        let network = config.get("network").unwrap_or(&empty);
        let default_sizes = defaults.sizes;
        let sizes = PopulationSizes {
            granule: parse_value_with_default(network, "granule", parse_usize, default_sizes.granule)?,
            basket: parse_value_with_default(network, "basket", parse_usize, default_sizes.basket)?,
            mossy: parse_value_with_default(network, "mossy", parse_usize, default_sizes.mossy)?,
            hipp: parse_value_with_default(network, "hipp", parse_usize, default_sizes.hipp)?,
        };
        let use_slow = parse_value_with_default(network, "use_slow", parse_bool, defaults.use_slow)?;
        let calcium_mode = parse_value_with_default(
            network, "calcium_mode", parse_calcium_mode, defaults.calcium_mode,
        )?;
        let seed = match network.get("seed") {
            Some(value) => Some(parse_u64(value, "seed")?),
            None => None,
        };
        let external_granule_offset = parse_value_with_default(
            network, "external_granule_offset", parse_usize, defaults.external_granule_offset,
        )?;

        let run = config.get("run").unwrap_or(&empty);
        let dt = parse_value_with_default(run, "dt", parse_f64, defaults.dt)?;
        if !dt.is_finite() || dt <= 0. {
            return Err(SweepError::Config(format!("dt must be positive, got {}", dt)));
        }
        let trace = parse_value_with_default(run, "trace", parse_bool, defaults.trace)?;
        let output_dir = PathBuf::from(
            parse_value_with_default(run, "output_dir", parse_string, String::from("."))?
        );

        let mut overrides = defaults.overrides;
        overrides.duration = parse_value_with_default(run, "duration", parse_f64, overrides.duration)?;

        if let Some(table) = config.get("overrides") {
            let table = table.as_table()
                .ok_or_else(|| SweepError::Config(String::from("overrides must be a table")))?;
            for (key, value) in table.iter() {
                overrides.set(key, parse_f64(value, key)?)?;
            }
        }

        Ok(RunConfig {
            sizes, use_slow, calcium_mode, seed, external_granule_offset, dt, trace, output_dir, overrides,
        })
    }
}
