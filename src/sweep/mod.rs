//! Batch driver, each run builds a fresh network, applies its `name=value`
//! overrides, wires, stimulates, runs and writes its spike (and optionally
//! trace) file named after the overrides.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    time::Instant,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, info};
use crate::config::RunConfig;
use crate::error::{DentateGyrusError, SimulationError, SweepError};
use crate::network::{
    default_rules, Network, PerforantPathStimulus, RunSummary, WiringConfig, WiringSummary,
};
use crate::neuron::cell::CellOptions;
use crate::output::{SpikeWriter, TraceWriter};
use crate::overrides::{apply_overrides, ParameterOverrides, PARAMETER_NAMES};


/// A single `name=value` override
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: f64,
}

impl Assignment {
    pub fn new(name: &str, value: f64) -> Self {
        Assignment { name: name.to_string(), value }
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Parses a `name=value` token, the name must be a known parameter
pub fn parse_assignment(token: &str) -> Result<Assignment, SweepError> {
    let (name, value) = token.trim()
        .split_once('=')
        .ok_or_else(|| SweepError::MalformedToken(token.to_string()))?;
    let (name, value) = (name.trim(), value.trim());

    if name.is_empty() || value.is_empty() {
        return Err(SweepError::MalformedToken(token.to_string()));
    }
    if !PARAMETER_NAMES.contains(&name) {
        return Err(SweepError::UnknownParameter(name.to_string()));
    }

    let value = value.parse::<f64>()
        .ok()
        .filter(|i| i.is_finite())
        .ok_or_else(|| SweepError::InvalidValue(name.to_string(), value.to_string()))?;

    Ok(Assignment { name: name.to_string(), value })
}

/// Parses every non blank token in order
pub fn parse_assignments<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Assignment>, SweepError> {
    tokens.iter()
        .map(|i| i.as_ref())
        .filter(|i| !i.trim().is_empty())
        .map(parse_assignment)
        .collect()
}

/// Output file stem, the prefix followed by `_name=value` per assignment in order
pub fn output_stem(prefix: &str, assignments: &[Assignment]) -> String {
    let mut stem = String::from(prefix);
    for assignment in assignments {
        stem.push('_');
        stem.push_str(&assignment.to_string());
    }

    stem
}

/// Ordered list of runs, each a list of overrides
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SweepPlan {
    pub runs: Vec<Vec<Assignment>>,
}

impl SweepPlan {
    /// A plan with one run
    pub fn single(assignments: Vec<Assignment>) -> Self {
        SweepPlan { runs: vec![assignments] }
    }

    /// Sprouting figure, four sodium and calcium channel variants at each
    /// sprouting probability
    pub fn sprouting_figure() -> Self {
        let mut runs = vec![];
        for sprout in [0.4, 0.5, 0.6, 0.7, 1.] {
            let sprouting = Assignment::new("sprout", sprout);

            runs.push(vec![sprouting.clone()]);
            runs.push(vec![Assignment::new("Vhalfmn", 2.), sprouting.clone()]);
            runs.push(vec![
                Assignment::new("Vhalfm", -2.), Assignment::new("Vhalfmn", 2.), sprouting.clone(),
            ]);
            runs.push(vec![
                Assignment::new("Vhalfm", -2.), Assignment::new("Vhalfns", 2.),
                Assignment::new("Vhalfmn", 2.), sprouting,
            ]);
        }

        SweepPlan { runs }
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Outcome of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub assignments: Vec<Assignment>,
    pub spike_file: PathBuf,
    pub trace_file: Option<PathBuf>,
    pub wiring: WiringSummary,
    pub summary: RunSummary,
}

fn create(path: &Path) -> Result<BufWriter<File>, SimulationError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| SimulationError::Output(format!("{}: {}", path.display(), e)))
}

/// Runs sweep plans against a base configuration
#[derive(Debug, Clone)]
pub struct SweepDriver {
    pub config: RunConfig,
}

impl SweepDriver {
    pub fn new(config: RunConfig) -> Self {
        SweepDriver { config }
    }

    /// Base overrides with the assignments applied in order
    pub fn overrides_for(&self, assignments: &[Assignment]) -> Result<ParameterOverrides, SweepError> {
        let mut overrides = self.config.overrides;
        for assignment in assignments {
            overrides.set(&assignment.name, assignment.value)?;
        }

        Ok(overrides)
    }

    /// Builds a network with the overrides applied, wired and stimulated
    pub fn build_network(&self, overrides: &ParameterOverrides) -> Result<(Network, WiringSummary), DentateGyrusError> {
        let options = CellOptions {
            use_slow: self.config.use_slow,
            calcium_mode: self.config.calcium_mode,
            trace: self.config.trace,
        };
        let wiring = WiringConfig {
            sprout: overrides.sprout,
            external_granule_offset: self.config.external_granule_offset,
        };

        let mut network = Network::new(self.config.sizes, options, wiring)?;
        apply_overrides(&mut network.cells, overrides);

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!("Making connections");
        let mut summary = network.wire(&default_rules(), &mut rng)?;
        let stimulus = network.stimulate(&PerforantPathStimulus::default(), &mut rng)?;
        summary.external += stimulus.external;

        Ok((network, summary))
    }

    /// Runs once with the given overrides and writes its output files
    pub fn run_once(&self, assignments: &[Assignment]) -> Result<RunReport, DentateGyrusError> {
        let overrides = self.overrides_for(assignments)?;
        let (mut network, wiring) = self.build_network(&overrides)?;

        let spike_file = self.config.output_dir.join(format!("{}.dat", output_stem("ap", assignments)));
        let trace_file = if self.config.trace {
            Some(self.config.output_dir.join(format!("{}.dat", output_stem("trace", assignments))))
        } else {
            None
        };

        let mut spikes = SpikeWriter::new(create(&spike_file)?);
        let mut traces = match &trace_file {
            Some(path) => Some(TraceWriter::new(create(path)?)),
            None => None,
        };

        let start = Instant::now();
        let result = network.run(overrides.duration, self.config.dt);

        for cell in network.cells.iter() {
            spikes.write_cell(cell)?;
            if let Some(traces) = traces.as_mut() {
                traces.write_cell(cell)?;
            }
        }

        match result {
            Ok(summary) => {
                info!("Made it in {:.3}s", start.elapsed().as_secs_f64());

                Ok(RunReport { assignments: assignments.to_vec(), spike_file, trace_file, wiring, summary })
            },
            Err(e) => {
                error!("Didn't make it: {}", e);

                Err(e)
            },
        }
    }

    /// Runs every entry of the plan in order, stops at the first failure
    pub fn run_plan(&self, plan: &SweepPlan) -> Result<Vec<RunReport>, DentateGyrusError> {
        let mut reports = Vec::with_capacity(plan.len());

        for (n, assignments) in plan.runs.iter().enumerate() {
            let description: Vec<String> = assignments.iter().map(|i| i.to_string()).collect();
            info!("Running {}/{}: {}", n + 1, plan.len(), description.join(" "));

            reports.push(self.run_once(assignments)?);
        }

        Ok(reports)
    }
}
