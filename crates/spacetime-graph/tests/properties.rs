//! Structural invariants of linked graphs, checked over random inputs.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use proptest::prelude::*;
use spacetime_graph::{
    Admission, BiasShape, CausalLinker, EmergentMetric, EmergentOrder, EnergyBias, EnergySource,
    EventSet, EventSetPlan, SourceAnchor,
};
use spacetime_types::{AmbientBounds, Distance, EventId};

fn plan(count: usize, dimension: usize, source: Option<u32>) -> EventSetPlan {
    let mut plan = EventSetPlan::new(
        count,
        AmbientBounds {
            min: vec![0.0; dimension],
            max: vec![10.0; dimension],
        },
    );
    if let Some(index) = source {
        plan.sources.push(EnergySource {
            anchor: SourceAnchor::Index(index),
            magnitude: 3.0,
        });
    }
    plan
}

fn biased() -> EnergyBias {
    EnergyBias::from_shape(&BiasShape::InverseSquare { gain: 1.0 }, 2.0, true).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn edges_point_forward_in_generation(
        count in 2_usize..40,
        dimension in 1_usize..=3,
        horizon in 0.0_f64..3.0,
        seed in any::<u64>(),
    ) {
        let set = EventSet::generate(&plan(count, dimension, Some(0)), seed).unwrap();
        let graph = CausalLinker::new(horizon, biased()).unwrap().build(set).unwrap();
        for edge in graph.edges() {
            let source = graph.event(edge.source).unwrap();
            let target = graph.event(edge.target).unwrap();
            prop_assert!(source.generation < target.generation);
        }
    }

    #[test]
    fn emergent_time_respects_edges(
        count in 1_usize..40,
        horizon in 0.0_f64..3.0,
        seed in any::<u64>(),
    ) {
        let set = EventSet::generate(&plan(count, 2, None), seed).unwrap();
        let graph = CausalLinker::new(horizon, EnergyBias::neutral()).unwrap().build(set).unwrap();
        let order = EmergentOrder::compute(&graph);
        for event in graph.events() {
            if graph.in_degree(event.id) == 0 {
                prop_assert_eq!(order.time(event.id), Some(0));
            }
        }
        for edge in graph.edges() {
            let parent = order.time(edge.source).unwrap();
            let child = order.time(edge.target).unwrap();
            prop_assert!(child > parent);
        }
    }

    #[test]
    fn emergent_distance_is_symmetric(
        count in 1_usize..25,
        horizon in 0.0_f64..2.0,
        seed in any::<u64>(),
    ) {
        let set = EventSet::generate(&plan(count, 1, None), seed).unwrap();
        let graph = CausalLinker::new(horizon, EnergyBias::neutral()).unwrap().build(set).unwrap();
        let matrix = EmergentMetric::new(&graph).unwrap().all_pairs();
        for a in graph.events() {
            prop_assert_eq!(matrix.get(a.id, a.id), Some(Distance::Finite(0.0)));
            for b in graph.events() {
                prop_assert_eq!(matrix.get(a.id, b.id), matrix.get(b.id, a.id));
            }
        }
    }

    #[test]
    fn wider_horizon_never_removes_edges(
        count in 2_usize..40,
        narrow in 0.0_f64..2.0,
        extra in 0.0_f64..2.0,
        probability in 0.0_f64..=1.0,
        seed in any::<u64>(),
    ) {
        let set = EventSet::generate(&plan(count, 2, Some(1)), seed).unwrap();
        let admission = Admission::Probabilistic { base_probability: probability };
        let link = |horizon: f64| {
            CausalLinker::new(horizon, biased())
                .unwrap()
                .with_admission(admission)
                .unwrap()
                .with_seed(seed)
                .build(set.clone())
                .unwrap()
        };
        let small = link(narrow);
        let large = link(narrow + extra);
        for edge in small.edges() {
            prop_assert!(large.has_edge(edge.source, edge.target));
        }
    }

    #[test]
    fn density_cap_bounds_in_degree(
        count in 2_usize..40,
        cap in 1_usize..5,
        seed in any::<u64>(),
    ) {
        let set = EventSet::generate(&plan(count, 2, None), seed).unwrap();
        let graph = CausalLinker::new(5.0, EnergyBias::neutral())
            .unwrap()
            .with_density_cap(Some(cap))
            .unwrap()
            .build(set)
            .unwrap();
        for index in 0..count {
            let id = EventId::from_index(index).unwrap();
            prop_assert!(graph.in_degree(id) <= cap);
        }
    }
}
