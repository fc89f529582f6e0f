#[cfg(test)]
mod tests {
    use dentate_gyrus::{
        error::{CompartmentError, DentateGyrusError},
        neuron::{
            cell::{Cell, CellOptions, CellType, ConductanceScaling},
            compartment::{
                ChannelDensities, Compartment, GeometryBuilder, axial_current, coupling_conductance,
            },
            ion_channels::{ChannelType, ConductanceChannel, DrivingForce, IonChannel, slow_sodium_scale},
            kinetics::{FastDelayedRectifierKinetics, SlowSodiumKinetics},
            calcium::CalciumMode,
        },
    };


    fn assert_relative(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance * expected.abs(),
            "expected {}, got {}", expected, actual,
        );
    }

    fn geometry(diameter: f64, length: f64) -> Result<Compartment, CompartmentError> {
        let geometry = GeometryBuilder::new()
            .diameter(diameter)
            .length(length)
            .axial_resistivity(210.)
            .specific_capacitance(1.)
            .leak_conductance(0.04)
            .build()?;

        Ok(Compartment::new("test", geometry))
    }

    #[test]
    pub fn test_granule_topology() -> Result<(), DentateGyrusError> {
        let cell = Cell::granule(0, CellOptions::default())?;

        assert_eq!(cell.cell_type, CellType::Granule);
        assert_eq!(cell.compartments.len(), 9);
        assert_eq!(cell.dendrites, vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]);
        assert!(cell.soma().parent.is_none());
        for chain in cell.dendrites.iter() {
            let mut parent = 0;
            for index in chain.iter() {
                assert_eq!(cell.compartments[*index].parent.map(|i| i.parent), Some(parent));
                parent = *index;
            }
        }
        cell.verify_topology()?;

        assert_eq!(cell.soma().ap_detector.threshold, 10.);
        assert!(cell.injection.is_some());

        Ok(())
    }

    #[test]
    pub fn test_granule_proximal_densities() -> Result<(), DentateGyrusError> {
        let cell = Cell::granule(0, CellOptions::default())?;
        let scaling = ConductanceScaling::for_cell_type(CellType::Granule);
        let proximal = &cell.compartments[cell.dendrite(0, 0)?];

        // mS/cm^2 to S
        let area = proximal.area * 10.;

        let g = |channel_type: ChannelType| proximal.channel(channel_type).map(|i| i.g_max());
        let scale = slow_sodium_scale(&SlowSodiumKinetics::default(), proximal.resting_potential())?;

        assert_relative(g(ChannelType::Na).unwrap_or(0.), 18. * area / scale, 1e-12);
        assert_relative(g(ChannelType::Kdrf).unwrap_or(0.), 4. * area, 1e-12);
        assert_relative(g(ChannelType::Kdrs).unwrap_or(0.), 6. * area, 1e-12);
        assert_relative(g(ChannelType::CaN).unwrap_or(0.), 3. * scaling.can * area, 1e-12);
        assert_relative(g(ChannelType::CaL).unwrap_or(0.), 7.5 * scaling.cal * area, 1e-12);
        assert_relative(g(ChannelType::CaT).unwrap_or(0.), 0.075 * scaling.cal * area, 1e-12);
        assert_relative(g(ChannelType::Ksk).unwrap_or(0.), 0.4 * scaling.sk * area, 1e-12);

        // granule cells carry no BK conductance and dendrites no A current
        assert_eq!(g(ChannelType::Kbk), None);
        assert_eq!(g(ChannelType::Ka), None);

        assert!(matches!(proximal.channel(ChannelType::Na), Some(IonChannel::NaSlow(_))));
        let pool = proximal.calcium.as_ref().map(|i| i.providers.clone());
        assert_eq!(pool, Some(vec![ChannelType::CaN, ChannelType::CaL, ChannelType::CaT]));

        Ok(())
    }

    fn assert_densities(
        cell: &Cell, index: usize, expected: &[(ChannelType, f64)],
    ) -> Result<(), DentateGyrusError> {
        let compartment = &cell.compartments[index];
        let area = compartment.area * 10.;
        let na_scale = slow_sodium_scale(&SlowSodiumKinetics::default(), compartment.resting_potential())?;

        for channel_type in ChannelType::ALL {
            let density = expected.iter()
                .find(|(i, _)| *i == channel_type)
                .map_or(0., |(_, g)| *g);
            let g_max = compartment.channel(channel_type).map(|i| i.g_max());

            if density > 0. {
                let scale = if channel_type == ChannelType::Na { na_scale } else { 1. };
                match g_max {
                    Some(g) => assert_relative(g, density * area / scale, 1e-12),
                    None => panic!("{} {} is missing {}", cell.cell_type, compartment.name, channel_type.name()),
                }
            } else {
                assert_eq!(g_max, None, "{} {} {}", cell.cell_type, compartment.name, channel_type.name());
            }
        }

        Ok(())
    }

    #[test]
    pub fn test_granule_density_table() -> Result<(), DentateGyrusError> {
        use ChannelType::*;

        let cell = Cell::granule(0, CellOptions::default())?;
        let s = ConductanceScaling::for_cell_type(CellType::Granule);

        assert_densities(&cell, 0, &[
            (Na, 120.), (Kdrf, 16.), (Kdrs, 6.), (Ka, 12.),
            (CaN, 2. * s.can), (CaL, 5. * s.cal), (CaT, 0.037 * s.cat),
            (Ksk, 1. * s.sk), (Kbk, 0.6 * s.bk),
        ])?;
        assert!(cell.soma().has_channel(Ka));
        assert!(!cell.soma().has_channel(Kbk));

        let branch = [
            vec![
                (Na, 18.), (Kdrf, 4.), (Kdrs, 6.),
                (CaN, 3. * s.can), (CaL, 7.5 * s.cal), (CaT, 0.075 * s.cal), (Ksk, 0.4 * s.sk),
            ],
            vec![
                (Na, 13.), (Kdrf, 4.), (Kdrs, 6.),
                (CaN, 1. * s.can), (CaL, 7.5 * s.cal), (CaT, 0.25 * s.cat), (Ksk, 0.2 * s.sk),
            ],
            vec![
                (Na, 8.), (Kdrf, 1.), (Kdrs, 6.),
                (CaN, 1. * s.can), (CaL, 0.5 * s.cal), (CaT, 0.5 * s.cat),
            ],
            vec![(Kdrf, 1.), (Kdrs, 8.), (CaN, 1. * s.can), (CaT, 1. * s.cat)],
        ];

        assert_eq!(cell.dendrites.len(), 2);
        for chain in cell.dendrites.iter() {
            for (index, expected) in chain.iter().zip(branch.iter()) {
                assert_densities(&cell, *index, expected)?;
            }
        }

        Ok(())
    }

    #[test]
    pub fn test_basket_density_table() -> Result<(), DentateGyrusError> {
        use ChannelType::*;

        let cell = Cell::basket(0, CellOptions::default())?;
        let s = ConductanceScaling::for_cell_type(CellType::Basket);

        let passive = vec![(Ka, 0.15), (CaN, 0.8 * s.can), (CaL, 5. * s.cal), (Ksk, 0.002 * s.sk)];
        let mut active = passive.clone();
        active.extend([(Na, 120.), (Kdrf, 13.)]);

        assert_densities(&cell, 0, &active)?;
        assert!(cell.soma().has_channel(Ka));
        assert!(!cell.soma().has_channel(Kbk));
        assert!(!cell.soma().has_channel(CaT));

        assert_eq!(cell.dendrites.len(), 4);
        for chain in cell.dendrites.iter() {
            assert_eq!(chain.len(), 4);
            assert_densities(&cell, chain[0], &active)?;
            for index in chain[1..].iter() {
                assert_densities(&cell, *index, &passive)?;
            }
        }

        Ok(())
    }

    #[test]
    pub fn test_mossy_and_hipp_density_tables() -> Result<(), DentateGyrusError> {
        use ChannelType::*;

        let mossy = Cell::mossy(0, CellOptions::default())?;
        let s = ConductanceScaling::for_cell_type(CellType::Mossy);
        let passive = vec![
            (Ka, 0.01), (CaN, 0.08 * s.can), (CaL, 0.6 * s.cal),
            (Ksk, 16. * s.sk), (Kbk, 16.5 * s.bk), (Ihf, 0.005), (Ihs, 0.005),
        ];
        let mut active = passive.clone();
        active.extend([(Na, 120.), (Kdrf, 0.5)]);

        assert_densities(&mossy, 0, &active)?;
        for chain in mossy.dendrites.iter() {
            assert_densities(&mossy, chain[0], &active)?;
            for index in chain[1..].iter() {
                assert_densities(&mossy, *index, &passive)?;
            }
        }

        let hipp = Cell::hipp(0, CellOptions::default())?;
        let s = ConductanceScaling::for_cell_type(CellType::Hipp);
        let passive = vec![
            (Ka, 0.8), (CaL, 1.5 * s.cal), (Ksk, 3. * s.sk), (Kbk, 3. * s.bk),
            (Ihf, 0.015), (Ihs, 0.015),
        ];
        let mut active = passive.clone();
        active.extend([(Na, 200.), (Kdrf, 6.)]);

        assert_densities(&hipp, 0, &active)?;
        for chain in hipp.dendrites.iter() {
            assert_eq!(chain.len(), 3);
            assert_densities(&hipp, chain[0], &active)?;
            for index in chain[1..].iter() {
                assert_densities(&hipp, *index, &passive)?;
            }
        }

        Ok(())
    }

    #[test]
    pub fn test_absent_channels_have_no_entry()-> Result<(), DentateGyrusError> {
        let cell = Cell::granule(0, CellOptions::default())?;
        let distal = &cell.compartments[cell.dendrite(0, 3)?];

        assert!(!distal.has_channel(ChannelType::Na));
        assert!(distal.channel(ChannelType::Na).is_none());
        assert!(distal.channel_currents().iter().all(|(i, _)| *i != ChannelType::Na));

        let passive = geometry(3., 50.)?;
        assert!(passive.channels.is_empty());
        assert_eq!(passive.channel_current(), 0.);
        assert_eq!(passive.leak_current(), 0.);

        Ok(())
    }

    #[test]
    pub fn test_fast_sodium_without_slow_inactivation() -> Result<(), DentateGyrusError> {
        let options = CellOptions { use_slow: false, ..CellOptions::default() };
        let cell = Cell::granule(0, options)?;

        assert!(matches!(cell.soma().channel(ChannelType::Na), Some(IonChannel::Na(_))));
        assert_relative(
            cell.soma().channel(ChannelType::Na).map_or(0., |i| i.g_max()),
            120. * cell.soma().area * 10.,
            1e-12,
        );

        Ok(())
    }

    #[test]
    pub fn test_coupling_is_symmetric() -> Result<(), DentateGyrusError> {
        let soma = geometry(16.8, 16.8)?;
        let dendrite = geometry(3., 50.)?;

        let forward = coupling_conductance(&soma.geometry, &dendrite.geometry);
        let backward = coupling_conductance(&dendrite.geometry, &soma.geometry);
        assert_eq!(forward, backward);

        let expected = 1. / (soma.geometry.half_resistance() + dendrite.geometry.half_resistance());
        assert_relative(forward, expected, 1e-12);

        for (a, b) in [(-70., -65.), (10., -80.), (-60., -60.)] {
            assert_eq!(axial_current(a, b, forward), -axial_current(b, a, forward));
        }

        Ok(())
    }

    #[test]
    pub fn test_geometry_errors() {
        let missing = GeometryBuilder::new()
            .length(10.)
            .axial_resistivity(100.)
            .specific_capacitance(1.)
            .leak_conductance(0.1)
            .build();
        assert_eq!(missing.err(), Some(CompartmentError::MissingGeometry(String::from("diameter"))));

        let negative = GeometryBuilder::new()
            .diameter(2.)
            .length(-10.)
            .axial_resistivity(100.)
            .specific_capacitance(1.)
            .leak_conductance(0.1)
            .build();
        assert_eq!(negative.err(), Some(CompartmentError::InvalidGeometry(String::from("length"), -10.)));
    }

    #[test]
    pub fn test_duplicate_channel() -> Result<(), DentateGyrusError> {
        let mut compartment = geometry(10., 10.)?;
        let channel = || ConductanceChannel::new(
            FastDelayedRectifierKinetics::default(), 1e-9, -90., DrivingForce::Linear,
        );

        compartment.add_channel(channel()?.into())?;
        let result = compartment.add_channel(channel()?.into());
        assert_eq!(
            result.err(),
            Some(CompartmentError::DuplicateChannel(String::from("test"), String::from("Kdrf"))),
        );

        Ok(())
    }

    #[test]
    pub fn test_cell_tables() -> Result<(), DentateGyrusError> {
        let expected = [
            (CellType::Granule, 9, 9, 2, true),
            (CellType::Basket, 17, 12, 2, false),
            (CellType::Mossy, 17, 17, 4, true),
            (CellType::Hipp, 13, 8, 0, true),
        ];

        for (cell_type, compartments, synapses, perforant, injected) in expected {
            let mut cell = Cell::build(cell_type, 3, CellOptions::default())?;
            cell.make_synapses()?;

            assert_eq!(cell.compartments.len(), compartments, "{}", cell_type);
            assert_eq!(cell.synapses.len(), synapses, "{}", cell_type);
            assert_eq!(cell.perforant_path.len(), perforant, "{}", cell_type);
            assert_eq!(cell.injection.is_some(), injected, "{}", cell_type);
            assert_eq!(cell.id, 3);
            cell.verify_topology()?;

            for compartment in cell.compartments.iter() {
                assert!(compartment.calcium.is_some());
            }
        }

        Ok(())
    }

    #[test]
    pub fn test_mossy_h_currents() -> Result<(), DentateGyrusError> {
        let mossy = Cell::mossy(0, CellOptions::default())?;
        assert!(mossy.soma().has_channel(ChannelType::Ihf));
        assert!(mossy.soma().has_channel(ChannelType::Ihs));
        // mossy cells have neither L nor N type calcium channels
        assert!(!mossy.soma().has_channel(ChannelType::CaL));
        assert!(!mossy.soma().has_channel(ChannelType::CaN));

        let granule = Cell::granule(1, CellOptions::default())?;
        assert!(!granule.soma().has_channel(ChannelType::Ihf));

        Ok(())
    }

    #[test]
    pub fn test_synapse_placement() -> Result<(), DentateGyrusError> {
        let mut cell = Cell::granule(0, CellOptions::default())?;
        cell.make_synapses()?;

        // basket input is somatic, perforant path is distal
        assert_eq!(cell.synapse(6)?.compartment, 0);
        assert!(cell.synapse(6)?.is_gabaergic());
        assert_eq!(cell.synapse(0)?.compartment, cell.dendrite(0, 3)?);
        assert_eq!(cell.synapse(1)?.compartment, cell.dendrite(1, 3)?);
        assert_eq!(cell.perforant_path, vec![0, 1]);
        assert!(cell.synapse(9).is_err());

        Ok(())
    }

    #[test]
    pub fn test_resting_cell_is_finite() -> Result<(), DentateGyrusError> {
        for calcium_mode in [CalciumMode::Combined, CalciumMode::PerSpecies] {
            let options = CellOptions { calcium_mode, ..CellOptions::default() };
            for cell_type in [CellType::Granule, CellType::Basket, CellType::Mossy, CellType::Hipp] {
                let mut cell = Cell::build(cell_type, 0, options)?;
                cell.make_synapses()?;
                for _ in 0..100 {
                    cell.step(0.01)?;
                }

                assert!(cell.compartments.iter().all(|i| i.is_finite()));
                assert_eq!(cell.statistics.accepted_steps, 100);
            }
        }

        Ok(())
    }
}
