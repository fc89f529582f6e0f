#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};
    use dentate_gyrus::{
        config::RunConfig,
        error::{DentateGyrusError, SweepError},
        network::PopulationSizes,
        neuron::{
            calcium::CalciumMode,
            cell::{Cell, CellOptions, CellType},
            ion_channels::{ChannelType, IonChannel},
        },
        overrides::{ParameterOverrides, apply_overrides},
        sweep::{
            Assignment, SweepDriver, SweepPlan, output_stem, parse_assignment, parse_assignments,
        },
    };


    #[test]
    pub fn test_override_names_and_values() {
        let mut overrides = ParameterOverrides::default();

        assert_eq!(overrides.set("Vhalfmn", 2.), Ok(()));
        assert_eq!(overrides.get("Vhalfmn"), Some(2.));
        assert_eq!(overrides.get("Am"), Some(1.));
        assert_eq!(overrides.get("duration"), Some(400.));
        assert_eq!(overrides.get("vhalfmn"), None);

        assert_eq!(overrides.set("Foo", 1.), Err(SweepError::UnknownParameter(String::from("Foo"))));
        assert_eq!(
            overrides.set("Am", f64::NAN),
            Err(SweepError::InvalidValue(String::from("Am"), String::from("NaN"))),
        );
        assert_eq!(overrides.a_m, 1.);

        let rendered = overrides.to_string();
        assert!(rendered.starts_with("Vhalfnf=0 "));
        assert!(rendered.contains(" Vhalfmn=2 "));
        assert!(rendered.ends_with("duration=400"));
    }

    fn a_type_midpoints(cell: &Cell) -> Option<(f64, f64)> {
        match cell.soma().channel(ChannelType::Ka) {
            Some(IonChannel::Ka(ka)) => Some((ka.kinetics.vhalf_n, ka.kinetics.vhalf_l)),
            _ => None,
        }
    }

    #[test]
    pub fn test_apply_overrides_is_idempotent() -> Result<(), DentateGyrusError> {
        let mut cells = vec![
            Cell::build(CellType::Granule, 0, CellOptions::default())?,
            Cell::build(CellType::Basket, 1, CellOptions::default())?,
        ];
        for cell in cells.iter_mut() {
            cell.make_synapses()?;
        }

        let mut overrides = ParameterOverrides::default();
        overrides.set("Vhalfma", 3.)?;
        overrides.set("Vhalfha", -2.)?;
        overrides.set("Vhalfm", -2.)?;
        overrides.set("Vhalfnf", 1.5)?;
        overrides.set("Ggaba", 0.5)?;

        for _ in 0..2 {
            apply_overrides(&mut cells, &overrides);

            let (vhalf_n, vhalf_l) = a_type_midpoints(&cells[0]).unwrap_or((0., 0.));
            assert!((vhalf_n - -36.6).abs() < 1e-12);
            assert!((vhalf_l - -81.).abs() < 1e-12);

            match cells[0].soma().channel(ChannelType::Na) {
                Some(IonChannel::NaSlow(na)) => assert_eq!(na.kinetics.vhalf_m, -2.),
                _ => panic!("granule soma should carry slow sodium"),
            }
            match cells[1].soma().channel(ChannelType::Kdrf) {
                Some(IonChannel::Kdrf(kdrf)) => assert_eq!(kdrf.kinetics.vhalf_n, 1.5),
                _ => panic!("basket soma should carry a fast delayed rectifier"),
            }

            let mut inhibitory = 0;
            for synapse in cells.iter().flat_map(|i| i.synapses.iter()) {
                if synapse.is_gabaergic() {
                    assert_eq!(synapse.g_max, synapse.base_g_max * 0.5);
                    inhibitory += 1;
                } else {
                    assert_eq!(synapse.g_max, synapse.base_g_max);
                }
            }
            assert!(inhibitory > 0);
        }

        Ok(())
    }

    #[test]
    pub fn test_parse_assignment() {
        assert_eq!(parse_assignment("Vhalfmn=2"), Ok(Assignment::new("Vhalfmn", 2.)));
        assert_eq!(parse_assignment(" sprout = 0.4 "), Ok(Assignment::new("sprout", 0.4)));
        assert_eq!(parse_assignment("Vhalfm=-2"), Ok(Assignment::new("Vhalfm", -2.)));

        assert_eq!(parse_assignment("sprout"), Err(SweepError::MalformedToken(String::from("sprout"))));
        assert_eq!(parse_assignment("=1"), Err(SweepError::MalformedToken(String::from("=1"))));
        assert_eq!(parse_assignment("Am="), Err(SweepError::MalformedToken(String::from("Am="))));
        assert_eq!(parse_assignment("foo=1"), Err(SweepError::UnknownParameter(String::from("foo"))));
        assert_eq!(
            parse_assignment("Am=abc"),
            Err(SweepError::InvalidValue(String::from("Am"), String::from("abc"))),
        );
        assert!(parse_assignment("Am=inf").is_err());

        let parsed = parse_assignments(&["", "Am=2", "  ", "Ah=0.5"]);
        assert_eq!(parsed, Ok(vec![Assignment::new("Am", 2.), Assignment::new("Ah", 0.5)]));
        assert!(parse_assignments(&["Am=2", "bad"]).is_err());
    }

    #[test]
    pub fn test_output_stem() {
        assert_eq!(output_stem("ap", &[]), "ap");
        assert_eq!(
            output_stem("ap", &[Assignment::new("Vhalfmn", 2.), Assignment::new("sprout", 0.4)]),
            "ap_Vhalfmn=2_sprout=0.4",
        );
        assert_eq!(output_stem("trace", &[Assignment::new("Vhalfm", -2.)]), "trace_Vhalfm=-2");
    }

    #[test]
    pub fn test_sprouting_figure_plan() {
        let plan = SweepPlan::sprouting_figure();
        assert_eq!(plan.len(), 20);
        assert!(!plan.is_empty());

        assert_eq!(plan.runs[0], vec![Assignment::new("sprout", 0.4)]);
        assert_eq!(output_stem("ap", &plan.runs[1]), "ap_Vhalfmn=2_sprout=0.4");
        assert_eq!(
            output_stem("ap", &plan.runs[19]),
            "ap_Vhalfm=-2_Vhalfns=2_Vhalfmn=2_sprout=1",
        );

        // every run carries the sprouting probability last
        assert!(plan.runs.iter().all(|i| i.last().map(|j| j.name.as_str()) == Some("sprout")));

        assert_eq!(SweepPlan::single(vec![]).len(), 1);
    }

    #[test]
    pub fn test_config_parsing() -> Result<(), SweepError> {
        let config = RunConfig::from_toml(r#"
            [network]
            granule = 50
            calcium_mode = "per_species"
            seed = 7
            external_granule_offset = 20

            [run]
            dt = 0.025
            duration = 200
            trace = true
            output_dir = "out"

            [overrides]
            Vhalfmn = 2
            sprout = 0.4
        "#)?;

        assert_eq!(config.sizes, PopulationSizes { granule: 50, ..PopulationSizes::default() });
        assert!(config.use_slow);
        assert_eq!(config.calcium_mode, CalciumMode::PerSpecies);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.external_granule_offset, 20);
        assert_eq!(config.dt, 0.025);
        assert!(config.trace);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.overrides.duration, 200.);
        assert_eq!(config.overrides.vhalf_mn, 2.);
        assert_eq!(config.overrides.sprout, 0.4);

        assert_eq!(RunConfig::from_toml("")?, RunConfig::default());

        Ok(())
    }

    #[test]
    pub fn test_config_errors() {
        let invalid = [
            "[run]\ndt = 0",
            "[run]\ndt = \"fast\"",
            "[network]\ngranule = -1",
            "[network]\ncalcium_mode = \"shared\"",
            "overrides = 3",
            "[overrides]\nVhalfmn = \"two\"",
            "[network\n",
        ];
        for contents in invalid {
            assert!(
                matches!(RunConfig::from_toml(contents), Err(SweepError::Config(_))),
                "{}", contents,
            );
        }

        assert_eq!(
            RunConfig::from_toml("[overrides]\nFoo = 1"),
            Err(SweepError::UnknownParameter(String::from("Foo"))),
        );
    }

    #[test]
    pub fn test_run_once_writes_output() -> Result<(), DentateGyrusError> {
        let output_dir = std::env::temp_dir().join(format!("dentate_gyrus_sweep_{}", std::process::id()));
        fs::create_dir_all(&output_dir)
            .map_err(|e| SweepError::Config(e.to_string()))?;

        let mut config = RunConfig {
            sizes: PopulationSizes { granule: 4, basket: 1, mossy: 1, hipp: 1 },
            seed: Some(11),
            external_granule_offset: 0,
            trace: true,
            output_dir: output_dir.clone(),
            ..RunConfig::default()
        };
        config.overrides.duration = 2.;
        let driver = SweepDriver::new(config);

        let assignments = vec![Assignment::new("sprout", 0.5)];
        assert_eq!(driver.overrides_for(&assignments)?.sprout, 0.5);

        let report = driver.run_once(&assignments)?;
        assert_eq!(report.spike_file, output_dir.join("ap_sprout=0.5.dat"));
        assert_eq!(report.trace_file, Some(output_dir.join("trace_sprout=0.5.dat")));
        assert_eq!(report.summary.steps, 200);
        assert!(report.wiring.external > 0);

        let traces = report.trace_file.as_ref()
            .map(|i| fs::read_to_string(i).unwrap_or_default())
            .unwrap_or_default();
        // every compartment of every cell is sampled once per step
        let compartments = 4 * 9 + 17 + 17 + 13;
        assert_eq!(traces.lines().count(), compartments * 200);
        assert!(report.spike_file.exists());

        fs::remove_dir_all(&output_dir).map_err(|e| SweepError::Config(e.to_string()))?;

        Ok(())
    }
}
