//! The finite collection of discrete events a run is built from.
//!
//! [`EventSet::generate`] places `count` events in a bounded ambient region,
//! assigns generation indices in creation order, and marks energy sources.
//! Generation is deterministic for a given seed: positions and spontaneous
//! sources each draw from their own derived stream (see [`crate::seed`]).

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use spacetime_types::{AmbientBounds, Event, EventId, Position};

use crate::error::GraphError;
use crate::seed::{self, POSITION_STREAM, SOURCE_STREAM};

/// Largest ambient dimension accepted by the generator.
pub const MAX_DIMENSION: usize = 3;

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// How event positions are laid out in the ambient box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Each coordinate drawn uniformly from `[min, max]`.
    #[default]
    Uniform,
    /// Evenly spaced grid filling the box in row-major order.
    Lattice,
    /// Caller-provided positions, one per event.
    Explicit {
        /// Positions in creation order.
        positions: Vec<Position>,
    },
}

/// Where an energy source is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceAnchor {
    /// The event with this creation index.
    Index(u32),
    /// The event nearest to this ambient position (ties go to the lowest id).
    Position(Position),
}

/// A configured energy source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySource {
    /// Which event carries the energy.
    pub anchor: SourceAnchor,
    /// Energy magnitude, strictly positive.
    pub magnitude: f64,
}

/// Randomly promoted high-energy events.
///
/// Every event without an anchored source independently becomes a source
/// with probability `probability`, its magnitude drawn uniformly from
/// `magnitudes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpontaneousSources {
    /// Per-event promotion probability in `[0, 1]`.
    pub probability: f64,
    /// Candidate magnitudes, all strictly positive.
    pub magnitudes: Vec<f64>,
}

/// Everything [`EventSet::generate`] needs apart from the seed.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSetPlan {
    /// Number of events to create.
    pub count: usize,
    /// Ambient region the positions live in.
    pub bounds: AmbientBounds,
    /// Position layout.
    pub placement: Placement,
    /// Explicitly placed energy sources.
    pub sources: Vec<EnergySource>,
    /// Optional random sources.
    pub spontaneous: Option<SpontaneousSources>,
    /// Global multiplier applied to every energy magnitude.
    pub energy_strength: f64,
}

impl EventSetPlan {
    /// A plan with `count` uniformly placed events and no sources.
    pub fn new(count: usize, bounds: AmbientBounds) -> Self {
        Self {
            count,
            bounds,
            placement: Placement::Uniform,
            sources: Vec::new(),
            spontaneous: None,
            energy_strength: 1.0,
        }
    }

    /// Check every parameter without generating anything.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] on the first problem found.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.count == 0 {
            return Err(GraphError::invalid("event count must be at least 1"));
        }
        if u32::try_from(self.count).is_err() {
            return Err(GraphError::invalid(format!(
                "event count {} exceeds the supported maximum",
                self.count
            )));
        }
        validate_bounds(&self.bounds)?;

        if !self.energy_strength.is_finite() || self.energy_strength <= 0.0 {
            return Err(GraphError::invalid(format!(
                "energy strength must be finite and positive, got {}",
                self.energy_strength
            )));
        }

        if let Placement::Explicit { positions } = &self.placement {
            if positions.len() != self.count {
                return Err(GraphError::invalid(format!(
                    "explicit placement lists {} positions for {} events",
                    positions.len(),
                    self.count
                )));
            }
            if let Some(outside) = positions.iter().find(|p| !self.bounds.contains(p)) {
                return Err(GraphError::invalid(format!(
                    "explicit position {:?} lies outside the ambient bounds",
                    outside.coords()
                )));
            }
        }

        for source in &self.sources {
            if !source.magnitude.is_finite() || source.magnitude <= 0.0 {
                return Err(GraphError::invalid(format!(
                    "energy source magnitude must be finite and positive, got {}",
                    source.magnitude
                )));
            }
            match &source.anchor {
                SourceAnchor::Index(index) => {
                    if *index as usize >= self.count {
                        return Err(GraphError::invalid(format!(
                            "energy source index {index} is out of range for {} events",
                            self.count
                        )));
                    }
                }
                SourceAnchor::Position(position) => {
                    if position.dimension() != self.bounds.dimension()
                        || position.coords().iter().any(|x| !x.is_finite())
                    {
                        return Err(GraphError::invalid(format!(
                            "energy source position {:?} does not match the ambient space",
                            position.coords()
                        )));
                    }
                }
            }
        }

        if let Some(spontaneous) = &self.spontaneous {
            if !(0.0..=1.0).contains(&spontaneous.probability) {
                return Err(GraphError::invalid(format!(
                    "spontaneous source probability must be in [0, 1], got {}",
                    spontaneous.probability
                )));
            }
            if spontaneous.magnitudes.is_empty() {
                return Err(GraphError::invalid(
                    "spontaneous sources need at least one magnitude",
                ));
            }
            if spontaneous
                .magnitudes
                .iter()
                .any(|m| !m.is_finite() || *m <= 0.0)
            {
                return Err(GraphError::invalid(
                    "spontaneous source magnitudes must be finite and positive",
                ));
            }
        }
        Ok(())
    }
}

/// Validate an ambient box: 1 to [`MAX_DIMENSION`] axes, finite, `min <= max`.
///
/// # Errors
///
/// Returns [`GraphError::InvalidConfiguration`] describing the bad axis.
pub fn validate_bounds(bounds: &AmbientBounds) -> Result<(), GraphError> {
    let dim = bounds.dimension();
    if dim == 0 || dim > MAX_DIMENSION {
        return Err(GraphError::invalid(format!(
            "ambient dimension must be between 1 and {MAX_DIMENSION}, got {dim}"
        )));
    }
    if bounds.max.len() != dim {
        return Err(GraphError::invalid(format!(
            "ambient bounds have {dim} lower and {} upper coordinates",
            bounds.max.len()
        )));
    }
    for (axis, (lo, hi)) in bounds.axes().enumerate() {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(GraphError::invalid(format!(
                "ambient axis {axis} has invalid range [{lo}, {hi}]"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// EventSet
// ---------------------------------------------------------------------------

/// The events of one run, indexed by [`EventId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSet {
    events: Vec<Event>,
    bounds: AmbientBounds,
}

impl EventSet {
    /// Generate the events described by `plan`.
    ///
    /// Generation indices run `0..count` in creation order. Positions and
    /// spontaneous sources are reproducible for the same `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] if the plan is invalid
    /// (zero events, out-of-range source index, bad bounds, ...). Nothing is
    /// generated in that case.
    pub fn generate(plan: &EventSetPlan, seed: u64) -> Result<Self, GraphError> {
        plan.validate()?;

        let positions = match &plan.placement {
            Placement::Uniform => uniform_positions(plan.count, &plan.bounds, seed),
            Placement::Lattice => lattice_positions(plan.count, &plan.bounds),
            Placement::Explicit { positions } => positions.clone(),
        };

        let mut events = Vec::with_capacity(plan.count);
        for (index, position) in positions.into_iter().enumerate() {
            let id = EventId::from_index(index)
                .ok_or_else(|| GraphError::invalid("event index overflow"))?;
            events.push(Event {
                id,
                position,
                generation: id.0,
                energy: 0.0,
            });
        }

        let mut set = Self {
            events,
            bounds: plan.bounds.clone(),
        };

        for source in &plan.sources {
            let target = set.resolve_anchor(&source.anchor)?;
            if let Some(event) = set.events.get_mut(target.index()) {
                event.energy += source.magnitude * plan.energy_strength;
            }
        }

        if let Some(spontaneous) = &plan.spontaneous {
            set.promote_spontaneous(spontaneous, plan.energy_strength, seed);
        }

        debug!(
            events = set.len(),
            sources = set.sources().count(),
            dimension = set.bounds.dimension(),
            seed,
            "event set generated"
        );
        Ok(set)
    }

    /// Build a set from externally supplied events.
    ///
    /// Event ids must equal their position in `events`; energies must be
    /// finite and non-negative; positions must match the bounds' dimension.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfiguration`] on the first violation.
    pub fn from_events(events: Vec<Event>, bounds: AmbientBounds) -> Result<Self, GraphError> {
        validate_bounds(&bounds)?;
        if events.is_empty() {
            return Err(GraphError::invalid("an event set needs at least one event"));
        }
        for (index, event) in events.iter().enumerate() {
            if event.id.index() != index {
                return Err(GraphError::invalid(format!(
                    "event {} is stored at index {index}",
                    event.id
                )));
            }
            if !event.energy.is_finite() || event.energy < 0.0 {
                return Err(GraphError::invalid(format!(
                    "event {} has invalid energy {}",
                    event.id, event.energy
                )));
            }
            if event.position.dimension() != bounds.dimension() {
                return Err(GraphError::invalid(format!(
                    "event {} has a {}-dimensional position in a {}-dimensional space",
                    event.id,
                    event.position.dimension(),
                    bounds.dimension()
                )));
            }
        }
        Ok(Self { events, bounds })
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the set is empty (never true for a generated set).
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events in creation order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Look up one event.
    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.get(id.index())
    }

    /// The ambient box the events live in.
    pub const fn bounds(&self) -> &AmbientBounds {
        &self.bounds
    }

    /// Events with positive energy.
    pub fn sources(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_source())
    }

    /// Replace the energy of one event before the set is linked.
    ///
    /// Used by scenarios that perturb a source between otherwise identical
    /// runs.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EventNotFound`] for an unknown id or
    /// [`GraphError::InvalidConfiguration`] for a negative or non-finite
    /// energy.
    pub fn reassign_energy(&mut self, id: EventId, energy: f64) -> Result<(), GraphError> {
        if !energy.is_finite() || energy < 0.0 {
            return Err(GraphError::invalid(format!(
                "energy must be finite and non-negative, got {energy}"
            )));
        }
        let event = self
            .events
            .get_mut(id.index())
            .ok_or(GraphError::EventNotFound(id))?;
        event.energy = energy;
        Ok(())
    }

    /// Consume the set, returning its parts.
    pub fn into_parts(self) -> (Vec<Event>, AmbientBounds) {
        (self.events, self.bounds)
    }

    fn resolve_anchor(&self, anchor: &SourceAnchor) -> Result<EventId, GraphError> {
        match anchor {
            SourceAnchor::Index(index) => {
                let id = EventId(*index);
                self.get(id).map(|e| e.id).ok_or(GraphError::EventNotFound(id))
            }
            SourceAnchor::Position(position) => self
                .events
                .iter()
                .map(|e| (e.position.distance(position), e.id))
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
                .map(|(_, id)| id)
                .ok_or_else(|| GraphError::invalid("cannot anchor a source in an empty set")),
        }
    }

    fn promote_spontaneous(&mut self, spontaneous: &SpontaneousSources, strength: f64, seed: u64) {
        let mut rng = seed::stream_rng(seed, SOURCE_STREAM, 0);
        for event in &mut self.events {
            // Draw for every event so anchored sources do not shift the stream.
            let roll: f64 = rng.random();
            let pick = rng.random_range(0..spontaneous.magnitudes.len());
            if event.is_source() || roll >= spontaneous.probability {
                continue;
            }
            if let Some(magnitude) = spontaneous.magnitudes.get(pick) {
                event.energy = magnitude * strength;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

fn uniform_positions(count: usize, bounds: &AmbientBounds, seed: u64) -> Vec<Position> {
    let mut rng = seed::stream_rng(seed, POSITION_STREAM, 0);
    (0..count)
        .map(|_| {
            Position::new(
                bounds
                    .axes()
                    .map(|(lo, hi)| rng.random_range(lo..=hi))
                    .collect(),
            )
        })
        .collect()
}

/// Row-major grid with `side^dim >= count` points per box.
fn lattice_positions(count: usize, bounds: &AmbientBounds) -> Vec<Position> {
    let dim = bounds.dimension();
    let mut side: usize = 1;
    while side.checked_pow(u32::try_from(dim).unwrap_or(1)).unwrap_or(usize::MAX) < count {
        side = side.saturating_add(1);
    }

    (0..count)
        .map(|index| {
            let mut rest = index;
            let coords = bounds
                .axes()
                .map(|(lo, hi)| {
                    let digit = rest.checked_rem(side).unwrap_or(0);
                    rest = rest.checked_div(side).unwrap_or(0);
                    let last = side.saturating_sub(1);
                    if last == 0 {
                        lo
                    } else {
                        #[allow(clippy::cast_precision_loss)]
                        let fraction = digit as f64 / last as f64;
                        (hi - lo).mul_add(fraction, lo)
                    }
                })
                .collect();
            Position::new(coords)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn line_plan(count: usize) -> EventSetPlan {
        EventSetPlan::new(count, AmbientBounds::interval(0.0, 10.0))
    }

    #[test]
    fn generates_requested_count_in_generation_order() {
        let set = EventSet::generate(&line_plan(25), 7).unwrap();
        assert_eq!(set.len(), 25);
        for (i, event) in set.events().iter().enumerate() {
            assert_eq!(event.id.index(), i);
            assert_eq!(event.generation as usize, i);
            assert!(set.bounds().contains(&event.position));
            assert!(!event.is_source());
        }
    }

    #[test]
    fn zero_count_rejected() {
        let result = EventSet::generate(&line_plan(0), 1);
        assert!(matches!(result, Err(GraphError::InvalidConfiguration { .. })));
    }

    #[test]
    fn out_of_range_source_rejected() {
        let mut plan = line_plan(5);
        plan.sources.push(EnergySource {
            anchor: SourceAnchor::Index(5),
            magnitude: 1.0,
        });
        let result = EventSet::generate(&plan, 1);
        assert!(matches!(result, Err(GraphError::InvalidConfiguration { .. })));
    }

    #[test]
    fn non_positive_magnitude_rejected() {
        let mut plan = line_plan(5);
        plan.sources.push(EnergySource {
            anchor: SourceAnchor::Index(1),
            magnitude: 0.0,
        });
        assert!(EventSet::generate(&plan, 1).is_err());
    }

    #[test]
    fn bad_bounds_rejected() {
        let plan = EventSetPlan::new(3, AmbientBounds::interval(5.0, 1.0));
        assert!(EventSet::generate(&plan, 1).is_err());

        let plan = EventSetPlan::new(
            3,
            AmbientBounds {
                min: vec![0.0; 4],
                max: vec![1.0; 4],
            },
        );
        assert!(EventSet::generate(&plan, 1).is_err());
    }

    #[test]
    fn same_seed_same_positions() {
        let a = EventSet::generate(&line_plan(40), 99).ok();
        let b = EventSet::generate(&line_plan(40), 99).ok();
        let c = EventSet::generate(&line_plan(40), 100).ok();
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn lattice_spaces_line_evenly() {
        let mut plan = EventSetPlan::new(5, AmbientBounds::interval(0.0, 4.0));
        plan.placement = Placement::Lattice;
        let set = EventSet::generate(&plan, 0).unwrap();
        let xs: Vec<f64> = set
            .events()
            .iter()
            .filter_map(|e| e.position.coords().first().copied())
            .collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn lattice_fills_square() {
        let mut plan = EventSetPlan::new(
            4,
            AmbientBounds {
                min: vec![0.0, 0.0],
                max: vec![2.0, 2.0],
            },
        );
        plan.placement = Placement::Lattice;
        let set = EventSet::generate(&plan, 0).unwrap();
        let last = set.get(EventId(3)).map(|e| e.position.clone());
        assert_eq!(last, Some(Position::new(vec![2.0, 2.0])));
    }

    #[test]
    fn lattice_in_degenerate_box_collapses_to_one_point() {
        let mut plan = EventSetPlan::new(3, AmbientBounds::interval(5.0, 5.0));
        plan.placement = Placement::Lattice;
        let set = EventSet::generate(&plan, 0).unwrap();
        for event in set.events() {
            assert_eq!(event.position, Position::on_line(5.0));
        }
    }

    #[test]
    fn explicit_positions_must_match_count() {
        let mut plan = line_plan(3);
        plan.placement = Placement::Explicit {
            positions: vec![Position::on_line(0.0)],
        };
        assert!(EventSet::generate(&plan, 0).is_err());
    }

    #[test]
    fn position_anchor_picks_nearest_event() {
        let mut plan = line_plan(3);
        plan.placement = Placement::Explicit {
            positions: vec![
                Position::on_line(0.0),
                Position::on_line(5.0),
                Position::on_line(10.0),
            ],
        };
        plan.sources.push(EnergySource {
            anchor: SourceAnchor::Position(Position::on_line(6.0)),
            magnitude: 3.0,
        });
        plan.energy_strength = 2.0;
        let set = EventSet::generate(&plan, 0).unwrap();
        let energies: Vec<f64> = set.events().iter().map(|e| e.energy).collect();
        assert_eq!(energies, vec![0.0, 6.0, 0.0]);
    }

    #[test]
    fn spontaneous_sources_respect_probability() {
        let mut plan = line_plan(50);
        plan.spontaneous = Some(SpontaneousSources {
            probability: 1.0,
            magnitudes: vec![2.0, 5.0, 10.0],
        });
        let set = EventSet::generate(&plan, 3).unwrap();
        assert_eq!(set.sources().count(), 50);
        assert!(
            set.events()
                .iter()
                .all(|e| [2.0, 5.0, 10.0].iter().any(|m| (m - e.energy).abs() < 1e-12))
        );

        plan.spontaneous = Some(SpontaneousSources {
            probability: 0.0,
            magnitudes: vec![2.0],
        });
        let set = EventSet::generate(&plan, 3).unwrap();
        assert_eq!(set.sources().count(), 0);
    }

    #[test]
    fn reassign_energy_validates() {
        let mut set = EventSet::generate(&line_plan(3), 0).unwrap();
        assert!(set.reassign_energy(EventId(1), 4.0).is_ok());
        assert_eq!(set.sources().count(), 1);
        assert!(set.reassign_energy(EventId(1), -1.0).is_err());
        assert_eq!(
            set.reassign_energy(EventId(9), 1.0),
            Err(GraphError::EventNotFound(EventId(9)))
        );
    }

    #[test]
    fn from_events_rejects_misnumbered_ids() {
        let events = vec![Event {
            id: EventId(1),
            position: Position::on_line(0.0),
            generation: 0,
            energy: 0.0,
        }];
        assert!(EventSet::from_events(events, AmbientBounds::interval(0.0, 1.0)).is_err());
    }
}
