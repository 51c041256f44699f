use crate::dispatch::ParallelFor;
use crate::error::DispatchError;
use crate::V3;

/// Velocities derived from the positional change over the frame.
///
/// There is no separate velocity integration: `(resolved - previous) / dt`
/// is the only way velocity is produced.
pub fn derive_velocities<D: ParallelFor>(
	d: &D,
	resolved: &[V3],
	previous: &[V3],
	dt: f32,
) -> Result<Vec<V3>, DispatchError> {
	let mut velocities = vec![V3::zeros(); resolved.len()];
	d.for_each_mut("reconcile", &mut velocities, |i, vel| {
		*vel = (resolved[i] - previous[i]) / dt
	})?;
	Ok(velocities)
}
