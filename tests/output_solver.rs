#[cfg(test)]
mod tests {
    use ndarray::Array1;
    use dentate_gyrus::{
        diagnostics::CellSnapshot,
        error::{DentateGyrusError, SimulationError},
        neuron::{
            calcium::CalciumMode,
            cell::{Cell, CellOptions, CurrentInjection},
            solver::SolverModel,
        },
        output::{SpikeWriter, TraceWriter},
    };


    fn lines(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8_lossy(&bytes).lines().map(String::from).collect()
    }

    #[test]
    pub fn test_spike_lines() -> Result<(), DentateGyrusError> {
        let mut writer = SpikeWriter::new(vec![]);
        writer.write_spike(3, 12.5, "Granule cell")?;

        let mut cell = Cell::granule(7, CellOptions::default())?;
        cell.compartments[0].ap_detector.times = vec![4., 20.25];
        // dendritic crossings are not written
        cell.compartments[1].ap_detector.times = vec![5.];
        writer.write_cell(&cell)?;

        assert_eq!(writer.spikes, 3);
        assert_eq!(
            lines(writer.into_inner()),
            vec!["3 12.5 \"Granule cell\"", "7 4 \"Granule cell\"", "7 20.25 \"Granule cell\""],
        );

        Ok(())
    }

    #[test]
    pub fn test_trace_lines() -> Result<(), DentateGyrusError> {
        let untraced = Cell::granule(0, CellOptions::default())?;
        let mut writer = TraceWriter::new(vec![]);
        writer.write_cell(&untraced)?;
        assert_eq!(writer.samples, 0);

        let options = CellOptions { trace: true, ..CellOptions::default() };
        let mut cell = Cell::hipp(2, options)?;
        for _ in 0..3 {
            cell.step(0.01)?;
        }

        let mut writer = TraceWriter::new(vec![]);
        writer.write_cell(&cell)?;
        assert_eq!(writer.samples, 3 * cell.compartments.len());

        let written = lines(writer.into_inner());
        let first: Vec<&str> = written[0].split(' ').collect();
        assert_eq!(first.len(), 4);
        assert_eq!(&first[..2], &["2", "0"]);
        assert_eq!(first[2].parse::<f64>().ok(), Some(0.01));
        assert_eq!(first[3].parse::<f64>().ok(), cell.compartments[0].trace.as_ref().map(|i| i.voltages[0]));

        Ok(())
    }

    #[test]
    pub fn test_snapshot_rendering() -> Result<(), DentateGyrusError> {
        let mut cell = Cell::granule(0, CellOptions::default())?;
        cell.make_synapses()?;
        cell.step(0.01)?;

        let snapshot = CellSnapshot::capture(&cell);
        assert_eq!(snapshot.compartments.len(), 9);
        assert_eq!(snapshot.state.len(), cell.state_len());
        assert_eq!(snapshot.derivatives.len(), cell.state_len());
        assert_eq!(snapshot.compartments[0].synapses.len(), 1);

        let rendered = snapshot.to_string();
        assert!(rendered.starts_with("Dumping Granule cell, id=0, time=0.01, steps=1/1 accepted"));
        assert!(rendered.contains(": soma Em="));
        assert!(rendered.contains("APthreshold=10"));
        assert!(rendered.contains("Vhalfm=0"));
        assert!(rendered.contains("::  Exp2Syn"));
        assert!(rendered.contains(":::   Y[0]="));
        assert!(rendered.contains(&format!("Y[{}]=", cell.state_len() - 1)));

        Ok(())
    }

    #[test]
    pub fn test_state_vector() -> Result<(), DentateGyrusError> {
        let mut cell = Cell::mossy(0, CellOptions::default())?;
        cell.make_synapses()?;

        let state = cell.state();
        assert_eq!(state.len(), SolverModel::state_len(&cell));
        assert_eq!(state[0], cell.soma().voltage);

        let short = Array1::zeros(state.len() - 1);
        assert_eq!(
            cell.set_state(&short).err(),
            Some(SimulationError::StateLength { expected: state.len(), found: state.len() - 1 }),
        );

        let mut shifted = state.clone();
        shifted[0] -= 5.;
        cell.set_state(&shifted)?;
        assert_eq!(cell.soma().voltage, state[0] - 5.);
        assert_eq!(cell.state(), shifted);

        Ok(())
    }

    #[test]
    pub fn test_step_matches_voltage_derivative() -> Result<(), DentateGyrusError> {
        let mut cell = Cell::granule(0, CellOptions::default())?;
        cell.make_synapses()?;
        cell.injection = None;
        let uninjected = SolverModel::derivatives(&cell);
        cell.injection = Some(CurrentInjection { start: 0., end: 10., amplitude: 0.3 });

        let dt = 0.01;
        let v0 = cell.soma().voltage;
        let derivatives = SolverModel::derivatives(&cell);
        cell.step(dt)?;

        assert!((cell.soma().voltage - (v0 + dt * derivatives[0])).abs() < 1e-12);
        // a depolarizing injection only moves the soma
        assert!(derivatives[0] > uninjected[0]);
        assert_eq!(derivatives.to_vec()[1..], uninjected.to_vec()[1..]);

        assert_eq!(cell.step(0.).err(), Some(SimulationError::InvalidTimestep(0.)));

        Ok(())
    }

    fn injected_soma(calcium_mode: CalciumMode) -> Result<(Vec<f64>, f64), DentateGyrusError> {
        let options = CellOptions { calcium_mode, ..CellOptions::default() };
        let mut cell = Cell::granule(0, options)?;
        cell.injection = Some(CurrentInjection { start: 0., end: 20., amplitude: 0.3 });

        for _ in 0..2000 {
            cell.step(0.01)?;
        }

        Ok((cell.soma().ap_detector.times.clone(), cell.soma().voltage))
    }

    #[test]
    pub fn test_calcium_modes_agree() -> Result<(), DentateGyrusError> {
        let (combined_spikes, combined_voltage) = injected_soma(CalciumMode::Combined)?;
        let (species_spikes, species_voltage) = injected_soma(CalciumMode::PerSpecies)?;

        assert_eq!(combined_spikes.len(), species_spikes.len());
        for (a, b) in combined_spikes.iter().zip(species_spikes.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        assert!((combined_voltage - species_voltage).abs() < 1e-6);

        Ok(())
    }
}
