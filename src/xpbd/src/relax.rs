//! Iterative constraint relaxation.
//!
//! Every iteration projects all constraints once. Multipliers start from
//! the values passed in (zero at the start of a frame) and accumulate
//! across iterations.

use crate::coloring::{Coloring, Side};
use crate::constraint::{PhysicsConstraint, Projection};
use crate::dispatch::ParallelFor;
use crate::error::DispatchError;
use crate::V3;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RelaxStats {
	pub iterations: usize,
	/// Projections skipped because both endpoints coincided.
	pub degenerate: usize,
	pub max_violation: f32,
}

/// Largest absolute violation, NaN if any violation is NaN.
pub fn max_violation(constraints: &[PhysicsConstraint], positions: &[V3]) -> f32 {
	constraints
		.iter()
		.map(|c| c.violation(positions[c.a], positions[c.b]).abs())
		.fold(0.0, |acc: f32, v| {
			if acc.is_nan() || v.is_nan() {
				f32::NAN
			} else {
				acc.max(v)
			}
		})
}

#[derive(Clone, Copy)]
struct Slot {
	constraint: usize,
	lambda: f32,
	projection: Projection,
}

pub struct Relaxation<'a> {
	pub constraints: &'a [PhysicsConstraint],
	pub imass: &'a [f32],
	pub dt: f32,
	pub iterations: usize,
	pub tolerance: Option<f32>,
}

impl<'a> Relaxation<'a> {
	fn project(&self, k: usize, positions: &[V3], lambda: f32) -> Projection {
		let c = &self.constraints[k];
		let [a, b] = c.objects();
		c.project(
			positions[a],
			positions[b],
			[self.imass[a], self.imass[b]],
			lambda,
			self.dt,
		)
	}

	fn converged(&self, positions: &[V3]) -> bool {
		match self.tolerance {
			Some(tolerance) => {
				max_violation(self.constraints, positions) < tolerance
			}
			None => false,
		}
	}

	/// Color by color: constraints of a color are projected in parallel
	/// against the current positions, then each object adds the one
	/// correction it received.
	pub fn colored<D: ParallelFor>(
		&self,
		d: &D,
		coloring: &Coloring,
		positions: &mut [V3],
		lambdas: &mut [f32],
	) -> Result<RelaxStats, DispatchError> {
		let mut slots: Vec<Slot> = coloring
			.order()
			.iter()
			.map(|&constraint| Slot {
				constraint,
				lambda: lambdas[constraint],
				projection: Projection::Skip,
			})
			.collect();
		let mut stats = RelaxStats::default();
		for _ in 0..self.iterations {
			for color in 0..coloring.len() {
				let range = coloring.range(color);
				let current: &[V3] = positions;
				d.for_each_mut(
					"relax-constraints",
					&mut slots[range.clone()],
					|_, slot| {
						slot.projection =
							self.project(slot.constraint, current, slot.lambda);
						if let Projection::Correct { dlambda, .. } =
							slot.projection
						{
							slot.lambda += dlambda;
						}
					},
				)?;
				stats.degenerate += slots[range]
					.iter()
					.filter(|s| s.projection.is_degenerate())
					.count();

				let slots = &slots;
				d.for_each_mut("relax-objects", &mut *positions, |i, pos| {
					let Some(incident) = coloring.find(i, color) else {
						return;
					};
					if let Projection::Correct { da, db, .. } =
						slots[incident.slot].projection
					{
						*pos += match incident.side {
							Side::A => da,
							Side::B => db,
						};
					}
				})?;
			}
			stats.iterations += 1;
			if self.converged(positions) {
				break;
			}
		}
		for slot in slots.iter() {
			lambdas[slot.constraint] = slot.lambda;
		}
		stats.max_violation = max_violation(self.constraints, positions);
		Ok(stats)
	}

	/// Plain Gauss-Seidel in insertion order, each projection applied
	/// before the next one is computed.
	pub fn sequential(
		&self,
		positions: &mut [V3],
		lambdas: &mut [f32],
	) -> RelaxStats {
		let mut stats = RelaxStats::default();
		for _ in 0..self.iterations {
			for (k, c) in self.constraints.iter().enumerate() {
				match self.project(k, positions, lambdas[k]) {
					Projection::Correct { dlambda, da, db } => {
						lambdas[k] += dlambda;
						positions[c.a] += da;
						positions[c.b] += db;
					}
					Projection::Degenerate => stats.degenerate += 1,
					Projection::Skip => {}
				}
			}
			stats.iterations += 1;
			if self.converged(positions) {
				break;
			}
		}
		stats.max_violation = max_violation(self.constraints, positions);
		stats
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::dispatch::{Rayon, Serial};

	struct Case {
		constraints: Vec<PhysicsConstraint>,
		imass: Vec<f32>,
		positions: Vec<V3>,
	}

	impl Case {
		// pinned anchor at the origin, links hanging along -y, stretched
		fn chain(n: usize) -> Self {
			let constraints = (1..n)
				.map(|i| PhysicsConstraint::distance(i - 1, i, 1.0))
				.collect();
			let mut imass = vec![1.0; n];
			imass[0] = 0.0;
			let positions = (0..n)
				.map(|i| V3::new(0.1 * i as f32, -1.5 * i as f32, 0.))
				.collect();
			Self {
				constraints,
				imass,
				positions,
			}
		}

		fn hub(spokes: usize) -> Self {
			let constraints = (1..=spokes)
				.map(|i| PhysicsConstraint::distance(0, i, 2.0))
				.collect();
			let imass = vec![1.0; spokes + 1];
			let mut positions = vec![V3::zeros()];
			for i in 0..spokes {
				let angle = i as f32 * std::f32::consts::TAU / spokes as f32;
				positions.push(V3::new(angle.cos(), angle.sin(), 0.) * 3.0);
			}
			Self {
				constraints,
				imass,
				positions,
			}
		}

		fn relaxation(&self, iterations: usize) -> Relaxation {
			Relaxation {
				constraints: &self.constraints,
				imass: &self.imass,
				dt: 1.0 / 60.0,
				iterations,
				tolerance: None,
			}
		}

		fn run_colored<D: ParallelFor>(
			&self,
			d: &D,
			n: usize,
		) -> (Vec<V3>, RelaxStats) {
			let coloring =
				Coloring::new(&self.constraints, self.positions.len());
			let mut positions = self.positions.clone();
			let mut lambdas = vec![0.0; self.constraints.len()];
			let stats = self
				.relaxation(n)
				.colored(d, &coloring, &mut positions, &mut lambdas)
				.unwrap();
			(positions, stats)
		}

		fn run_sequential(&self, n: usize) -> (Vec<V3>, RelaxStats) {
			let mut positions = self.positions.clone();
			let mut lambdas = vec![0.0; self.constraints.len()];
			let stats =
				self.relaxation(n).sequential(&mut positions, &mut lambdas);
			(positions, stats)
		}
	}

	#[test]
	fn test_chain_converges() {
		let case = Case::chain(5);
		let (positions, stats) = case.run_colored(&Serial, 200);
		assert_eq!(stats.iterations, 200);
		assert!(stats.max_violation < 1e-3, "{}", stats.max_violation);
		assert_eq!(positions[0], V3::zeros());
		let (positions, stats) = case.run_sequential(200);
		assert!(stats.max_violation < 1e-3, "{}", stats.max_violation);
		assert_eq!(positions[0], V3::zeros());
	}

	#[test]
	fn test_hub_converges() {
		let case = Case::hub(4);
		let (positions, stats) = case.run_colored(&Serial, 50);
		assert!(stats.max_violation < 1e-3);
		for p in positions.iter().skip(1) {
			assert!(((p - positions[0]).magnitude() - 2.0).abs() < 1e-3);
		}
		let (_, stats) = case.run_sequential(50);
		assert!(stats.max_violation < 1e-3);
	}

	#[test]
	fn test_parallel_matches_serial() {
		let case = Case::chain(300);
		let rayon = Rayon::new(Some(4)).unwrap();
		let (serial, _) = case.run_colored(&Serial, 10);
		let (parallel, _) = case.run_colored(&rayon, 10);
		assert_eq!(serial, parallel);
	}

	#[test]
	fn test_degenerate_is_skipped() {
		let case = Case {
			constraints: vec![
				PhysicsConstraint::distance(0, 1, 1.0),
				PhysicsConstraint::distance(1, 2, 1.0),
			],
			imass: vec![1.0; 3],
			positions: vec![V3::zeros(), V3::zeros(), V3::new(3., 0., 0.)],
		};
		let (positions, stats) = case.run_colored(&Serial, 1);
		assert_eq!(stats.degenerate, 1);
		assert!(positions.iter().all(|p| p.iter().all(|x| x.is_finite())));
		let (_, stats) = case.run_sequential(1);
		assert_eq!(stats.degenerate, 1);
	}

	#[test]
	fn test_tolerance_stops_early() {
		let case = Case {
			constraints: vec![PhysicsConstraint::distance(0, 1, 1.0)],
			imass: vec![1.0; 2],
			positions: vec![V3::zeros(), V3::new(4., 0., 0.)],
		};
		let mut relaxation = case.relaxation(50);
		relaxation.tolerance = Some(1e-4);
		let mut positions = case.positions.clone();
		let mut lambdas = vec![0.0];
		let stats = relaxation.sequential(&mut positions, &mut lambdas);
		assert_eq!(stats.iterations, 1);
		assert!(lambdas[0] < 0.0);
	}

	#[test]
	fn test_nan_never_converges() {
		let case = Case {
			constraints: vec![
				PhysicsConstraint::distance(0, 1, 1.0),
				PhysicsConstraint::distance(1, 2, 1.0),
			],
			imass: vec![1.0; 3],
			positions: vec![
				V3::zeros(),
				V3::new(1., 0., 0.),
				V3::new(f32::NAN, 0., 0.),
			],
		};
		assert!(max_violation(&case.constraints, &case.positions).is_nan());
		let mut relaxation = case.relaxation(5);
		relaxation.tolerance = Some(1e-4);
		let mut positions = case.positions.clone();
		let mut lambdas = vec![0.0; 2];
		let stats = relaxation.sequential(&mut positions, &mut lambdas);
		assert_eq!(stats.iterations, 5);
		assert!(stats.max_violation.is_nan());
	}
}
