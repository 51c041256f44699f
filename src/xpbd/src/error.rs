//! Error types for the solver.

use thiserror::Error;

/// Errors surfaced by the world and its stores.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
	/// A store is full.
	#[error("capacity of {capacity} reached")]
	CapacityExceeded {
		/// Fixed capacity of the store.
		capacity: usize,
	},

	/// A constraint endpoint does not name a live object, or both
	/// endpoints name the same one.
	#[error("object index {index} is not a valid endpoint ({count} objects)")]
	InvalidReference {
		/// Offending index.
		index: usize,
		/// Number of objects at insertion time.
		count: usize,
	},

	/// Mass must be positive; infinity pins the object.
	#[error("invalid mass {0}")]
	InvalidMass(f32),

	/// Stiffness must lie in `[0, 1]`.
	#[error("invalid stiffness {0}")]
	InvalidStiffness(f32),

	/// Rest length must be finite and not negative.
	#[error("invalid rest length {0}")]
	InvalidRestLength(f32),

	/// Positions, velocities and accelerations must be finite.
	#[error("non-finite {field}")]
	NonFinite {
		/// Name of the offending vector.
		field: &'static str,
	},

	/// Time step must be positive and finite.
	#[error("invalid time step {0}")]
	InvalidTimeStep(f32),

	/// The frame was aborted, state is unchanged.
	#[error("frame aborted: {0}")]
	Dispatch(#[from] DispatchError),
}

/// Failures of the parallel execution substrate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
	#[error("failed to build thread pool: {0}")]
	ThreadPool(String),

	#[error("{pass} pass panicked")]
	Panicked { pass: &'static str },
}
