#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use dentate_gyrus::{
        error::{DentateGyrusError, WiringError},
        network::{
            ConnectionOutcome, Network, NetworkConnection, PerforantPathStimulus,
            PopulationSizes, WiringConfig, default_rules,
        },
        neuron::{
            cell::{CellOptions, CellType},
            spike_train::{PoissonSpikeTrain, PresetSpikeTrain},
        },
    };


    fn network(sizes: PopulationSizes, sprout: f64, offset: usize) -> Result<Network, DentateGyrusError> {
        let config = WiringConfig { sprout, external_granule_offset: offset };

        Ok(Network::new(sizes, CellOptions::default(), config)?)
    }

    fn granule_pair() -> PopulationSizes {
        PopulationSizes { granule: 2, basket: 1, mossy: 0, hipp: 0 }
    }

    fn recurrent(source: usize, target: usize) -> NetworkConnection {
        NetworkConnection {
            source,
            target,
            synapse: 7,
            weight: 2e-3,
            delay: 0.8,
            threshold: 10.,
            gate: None,
        }
    }

    fn installed_fraction(sprout: f64, trials: usize, seed: u64) -> Result<f64, DentateGyrusError> {
        let mut network = network(granule_pair(), sprout, 200)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut installed = 0;
        for _ in 0..trials {
            if network.connect(recurrent(0, 1), &mut rng)? == ConnectionOutcome::Live {
                installed += 1;
            }
        }
        assert_eq!(network.connections.len(), installed);

        Ok(installed as f64 / trials as f64)
    }

    #[test]
    pub fn test_sprouting_probability() -> Result<(), DentateGyrusError> {
        assert_eq!(installed_fraction(0., 1000, 1)?, 0.);
        assert_eq!(installed_fraction(1., 1000, 2)?, 1.);

        let fraction = installed_fraction(0.3, 10000, 3)?;
        assert!((fraction - 0.3).abs() < 0.02, "{}", fraction);

        Ok(())
    }

    #[test]
    pub fn test_sprouting_only_gates_granule_pairs() -> Result<(), DentateGyrusError> {
        let mut network = network(granule_pair(), 0., 200)?;
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let basket_to_granule = NetworkConnection { source: 2, synapse: 6, ..recurrent(2, 0) };
        assert_eq!(network.connect(basket_to_granule, &mut rng)?, ConnectionOutcome::Live);
        assert_eq!(network.connect(recurrent(0, 1), &mut rng)?, ConnectionOutcome::Skipped);

        let explicit = NetworkConnection { gate: Some(1.), ..recurrent(0, 1) };
        assert_eq!(network.connect(explicit, &mut rng)?, ConnectionOutcome::Live);

        let invalid = NetworkConnection { gate: Some(1.5), ..recurrent(0, 1) };
        assert_eq!(network.connect(invalid, &mut rng).err(), Some(WiringError::InvalidProbability(1.5)));

        assert_eq!(network.outgoing(2).count(), 1);
        assert_eq!(network.outgoing(0).count(), 1);

        Ok(())
    }

    #[test]
    pub fn test_connect_sets_threshold_and_validates() -> Result<(), DentateGyrusError> {
        let mut network = network(granule_pair(), 1., 200)?;
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let connection = NetworkConnection { threshold: -20., ..recurrent(0, 1) };
        network.connect(connection, &mut rng)?;
        let compartment = network.cells[1].synapses[7].compartment;
        assert_eq!(network.cells[1].compartments[compartment].ap_detector.threshold, -20.);

        let missing_target = NetworkConnection { target: 10, ..recurrent(0, 1) };
        assert_eq!(network.connect(missing_target, &mut rng).err(), Some(WiringError::TargetNotFound(10)));

        let missing_synapse = NetworkConnection { synapse: 40, ..recurrent(0, 1) };
        assert_eq!(network.connect(missing_synapse, &mut rng).err(), Some(WiringError::SynapseNotFound(1, 40)));

        Ok(())
    }

    #[test]
    pub fn test_external_sources_are_redirected() -> Result<(), DentateGyrusError> {
        let sizes = PopulationSizes { granule: 4, basket: 1, mossy: 0, hipp: 0 };
        let mut network = network(sizes, 0., 2)?;
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let external = network.cells.len();

        let onto_granule = NetworkConnection {
            source: external, target: 0, synapse: 0, weight: 1., delay: 3., threshold: 10., gate: None,
        };
        assert_eq!(network.connect(onto_granule, &mut rng)?, ConnectionOutcome::External);
        assert!(network.cells[0].synapses[0].queue.is_empty());
        assert_eq!(network.cells[2].synapses[0].queue.len(), 1);
        assert_eq!(network.cells[2].synapses[0].queue[0].time, 3.);

        let onto_basket = NetworkConnection { target: 4, ..onto_granule };
        assert_eq!(network.connect(onto_basket, &mut rng)?, ConnectionOutcome::External);
        assert_eq!(network.cells[4].synapses[0].queue.len(), 1);

        // the redirected target must exist
        let beyond = NetworkConnection { target: 3, ..onto_granule };
        assert_eq!(network.connect(beyond, &mut rng).err(), Some(WiringError::TargetNotFound(5)));

        assert!(network.connections.is_empty());

        Ok(())
    }

    #[test]
    pub fn test_perforant_path_stimulus() -> Result<(), DentateGyrusError> {
        let sizes = PopulationSizes { granule: 4, basket: 2, mossy: 0, hipp: 0 };
        let mut network = network(sizes, 0., 0)?;
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let stimulus = PerforantPathStimulus { granule: 2, basket: 1, ..PerforantPathStimulus::default() };
        let summary = network.stimulate(&stimulus, &mut rng)?;
        assert_eq!(summary.external, 6);

        for (cell, expected) in [(0, 1), (1, 1), (2, 0), (4, 1), (5, 0)] {
            for synapse in network.cells[cell].perforant_path.clone() {
                let queue = &network.cells[cell].synapses[synapse].queue;
                assert_eq!(queue.len(), expected, "cell {}", cell);
                assert!(queue.iter().all(|i| i.time == 3. && i.weight == 1.));
            }
        }

        Ok(())
    }

    #[test]
    pub fn test_default_rules() -> Result<(), DentateGyrusError> {
        let sizes = PopulationSizes { granule: 20, basket: 2, mossy: 3, hipp: 2 };
        let rules = default_rules();
        assert_eq!(rules.len(), 14);

        let mut unsprouted = network(sizes, 0., 200)?;
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let summary = unsprouted.wire(&rules, &mut rng)?;

        let granule = unsprouted.population(CellType::Granule);
        let basket = unsprouted.population(CellType::Basket);
        assert_eq!(basket, 20..22);

        let recurrent = unsprouted.connections.iter()
            .filter(|i| granule.contains(&i.source) && granule.contains(&i.target))
            .count();
        assert_eq!(recurrent, 0);
        assert_eq!(summary.skipped, 20 * 10);

        // each basket cell contacts every granule cell
        let basket_to_granule = unsprouted.connections.iter()
            .filter(|i| basket.contains(&i.source) && granule.contains(&i.target))
            .count();
        assert_eq!(basket_to_granule, 2 * 20);

        for rule in rules.iter() {
            let sources = unsprouted.population(rule.source);
            let targets = unsprouted.population(rule.target);
            for connection in unsprouted.connections.iter() {
                if sources.contains(&connection.source) && targets.contains(&connection.target) {
                    assert!(connection.synapse >= rule.synapses.0 && connection.synapse <= rule.synapses.1);
                    assert_ne!(connection.source, connection.target);
                    assert_eq!(connection.delay, rule.delay);
                }
            }
        }

        let mut sprouted = network(sizes, 1., 200)?;
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        sprouted.wire(&rules, &mut rng)?;
        let recurrent = sprouted.connections.iter()
            .filter(|i| granule.contains(&i.source) && granule.contains(&i.target))
            .count();
        assert_eq!(recurrent, 20 * 10);

        Ok(())
    }

    #[test]
    pub fn test_spikes_are_routed_with_delay() -> Result<(), DentateGyrusError> {
        let sizes = PopulationSizes { granule: 0, basket: 2, mossy: 0, hipp: 0 };
        let mut network = network(sizes, 0., 200)?;
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let connection = NetworkConnection {
            source: 0, target: 1, synapse: 8, weight: 7.6e-3, delay: 0.8, threshold: 10., gate: None,
        };
        network.connect(connection, &mut rng)?;

        for compartment in network.cells[0].compartments.iter_mut() {
            compartment.voltage = 40.;
        }

        let spikes = network.step(0.01)?;
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].0, 0);

        let queue = &network.cells[1].synapses[8].queue;
        assert_eq!(queue.len(), 1);
        assert!((queue[0].time - 0.81).abs() < 1e-12);
        assert_eq!(queue[0].weight, 7.6e-3);

        assert!(network.run(1., 0.).is_err());

        Ok(())
    }

    #[test]
    pub fn test_external_spike_trains() -> Result<(), DentateGyrusError> {
        let sizes = PopulationSizes { granule: 1, basket: 0, mossy: 0, hipp: 0 };
        let mut network = network(sizes, 0., 200)?;

        let mut preset = PresetSpikeTrain::new(vec![5., 1., f64::NAN, 50.]);
        assert_eq!(preset.firing_times, vec![1., 5., 50.]);
        let enqueued = network.connect_spike_train(&mut preset, 0, 2, 0.3e-3, 3., 20.)?;
        assert_eq!(enqueued, 2);
        let times: Vec<f64> = network.cells[0].synapses[2].queue.iter().map(|i| i.time).collect();
        assert_eq!(times, vec![4., 8.]);

        let mut poisson = PoissonSpikeTrain::from_firing_rate(100., 0., ChaCha8Rng::seed_from_u64(10));
        let enqueued = network.connect_spike_train(&mut poisson, 0, 3, 0.3e-3, 0., 1000.)?;
        // 100 Hz over a second
        assert!(enqueued > 50 && enqueued < 150, "{}", enqueued);
        let queue = &network.cells[0].synapses[3].queue;
        assert!(queue.windows(2).all(|i| i[0].time <= i[1].time));

        Ok(())
    }
}
