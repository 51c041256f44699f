use crate::coloring::Coloring;
use crate::constraint::PhysicsConstraint;
use crate::error::Error;

/// Bounded, append-only constraint arena.
///
/// The coloring used by the parallel solver is cached here and rebuilt
/// lazily after the constraint set or the object count changes.
pub struct ConstraintStore {
	capacity: usize,
	constraints: Vec<PhysicsConstraint>,
	coloring: Option<Coloring>,
}

impl ConstraintStore {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			constraints: Vec::new(),
			coloring: None,
		}
	}

	/// `object_count` is the number of live objects endpoints may refer to.
	pub fn add_constraint(
		&mut self,
		mut constraint: PhysicsConstraint,
		object_count: usize,
	) -> Result<usize, Error> {
		if self.constraints.len() >= self.capacity {
			return Err(Error::CapacityExceeded {
				capacity: self.capacity,
			});
		}
		constraint.validate(object_count)?;
		constraint.lambda = 0.0;
		self.constraints.push(constraint);
		self.coloring = None;
		Ok(self.constraints.len() - 1)
	}

	pub fn len(&self) -> usize {
		self.constraints.len()
	}

	pub fn is_empty(&self) -> bool {
		self.constraints.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn remaining(&self) -> usize {
		self.capacity - self.constraints.len()
	}

	pub fn constraints(&self) -> &[PhysicsConstraint] {
		&self.constraints
	}

	pub fn read_all(&self) -> Vec<PhysicsConstraint> {
		self.constraints.clone()
	}

	pub fn colored(
		&mut self,
		object_count: usize,
	) -> (&[PhysicsConstraint], &Coloring) {
		let stale = self
			.coloring
			.as_ref()
			.map_or(false, |c| c.object_count() != object_count);
		if stale {
			self.coloring = None;
		}
		let constraints = &self.constraints;
		let coloring = self.coloring.get_or_insert_with(|| {
			let coloring = Coloring::new(constraints, object_count);
			log::debug!(
				"colored {} constraints with {} colors",
				constraints.len(),
				coloring.len()
			);
			coloring
		});
		(constraints, coloring)
	}

	pub(crate) fn commit_lambdas(&mut self, lambdas: &[f32]) {
		for (c, lambda) in self.constraints.iter_mut().zip(lambdas.iter()) {
			c.lambda = *lambda;
		}
	}

	pub fn clear(&mut self) {
		self.constraints.clear();
		self.coloring = None;
	}
}
