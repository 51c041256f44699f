use crate::dispatch::ParallelFor;
use crate::error::DispatchError;
use crate::object::PhysicsObject;
use crate::V3;

/// Unconstrained position after `dt`, starting from `start`.
///
/// Pinned objects stay where they are.
pub fn inertial_position(object: &PhysicsObject, start: V3, dt: f32) -> V3 {
	if object.is_pinned() {
		return start;
	}
	start + object.velocity * dt + object.acceleration * (dt * dt)
}

/// Predicts every object from its warm start position.
pub fn predict<D: ParallelFor>(
	d: &D,
	objects: &[PhysicsObject],
	start: &[V3],
	dt: f32,
) -> Result<Vec<V3>, DispatchError> {
	let mut inertial = start.to_vec();
	d.for_each_mut("predict", &mut inertial, |i, pos| {
		*pos = inertial_position(&objects[i], *pos, dt)
	})?;
	Ok(inertial)
}
