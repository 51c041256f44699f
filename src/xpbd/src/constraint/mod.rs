pub mod distance;

use crate::error::Error;
use crate::V3;
use protocol::pr_model::PrConstraint;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConstraintKind {
	#[default]
	Distance,
}

/// Outcome of projecting one constraint onto its manifold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
	Correct { dlambda: f32, da: V3, db: V3 },
	// endpoints coincide, no direction to push along
	Degenerate,
	// nothing can move: both ends pinned or zero stiffness
	Skip,
}

impl Projection {
	pub fn is_degenerate(&self) -> bool {
		matches!(self, Projection::Degenerate)
	}
}

/// A pairwise relation between two objects of the store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConstraint {
	pub kind: ConstraintKind,
	pub a: usize,
	pub b: usize,
	pub rest_length: f32,
	/// 1.0 is rigid, lower values are compliant.
	pub stiffness: f32,
	/// Accumulated multiplier of the last frame.
	pub lambda: f32,
}

impl PhysicsConstraint {
	pub fn distance(a: usize, b: usize, rest_length: f32) -> Self {
		Self {
			kind: ConstraintKind::Distance,
			a,
			b,
			rest_length,
			stiffness: 1.0,
			lambda: 0.0,
		}
	}

	pub fn with_stiffness(mut self, stiffness: f32) -> Self {
		self.stiffness = stiffness;
		self
	}

	pub fn objects(&self) -> [usize; 2] {
		[self.a, self.b]
	}

	/// XPBD compliance scaled by the time step, `(1 - k) / (k * dt^2)`.
	pub fn compliance(&self, dt: f32) -> f32 {
		if self.stiffness == 0.0 {
			return f32::INFINITY;
		}
		(1.0 - self.stiffness) / (self.stiffness * dt * dt)
	}

	pub fn violation(&self, pa: V3, pb: V3) -> f32 {
		match self.kind {
			ConstraintKind::Distance => {
				distance::violation(pa, pb, self.rest_length)
			}
		}
	}

	pub fn project(
		&self,
		pa: V3,
		pb: V3,
		imass: [f32; 2],
		lambda: f32,
		dt: f32,
	) -> Projection {
		match self.kind {
			ConstraintKind::Distance => distance::project(
				pa,
				pb,
				imass,
				self.rest_length,
				lambda,
				self.compliance(dt),
			),
		}
	}

	pub(crate) fn validate(&self, count: usize) -> Result<(), Error> {
		for index in self.objects() {
			if index >= count {
				return Err(Error::InvalidReference { index, count });
			}
		}
		if self.a == self.b {
			return Err(Error::InvalidReference {
				index: self.b,
				count,
			});
		}
		if !(0.0..=1.0).contains(&self.stiffness) {
			return Err(Error::InvalidStiffness(self.stiffness));
		}
		if !(self.rest_length >= 0.0 && self.rest_length.is_finite()) {
			return Err(Error::InvalidRestLength(self.rest_length));
		}
		Ok(())
	}

	pub fn render(&self, id: usize) -> PrConstraint {
		PrConstraint {
			id,
			objects: self.objects(),
			rest_length: self.rest_length,
		}
	}
}
