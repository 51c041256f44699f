use crate::error::Error;
use crate::object::PhysicsObject;
use crate::V3;

/// Bounded, append-only object arena.
///
/// Alongside the authoritative objects it keeps the resolved position of
/// the previous frame for every object, which seeds the next relaxation.
pub struct ObjectStore {
	capacity: usize,
	objects: Vec<PhysicsObject>,
	previous: Vec<V3>,
}

impl ObjectStore {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			objects: Vec::new(),
			previous: Vec::new(),
		}
	}

	pub fn add_object(&mut self, object: PhysicsObject) -> Result<usize, Error> {
		object.validate()?;
		if self.objects.len() >= self.capacity {
			return Err(Error::CapacityExceeded {
				capacity: self.capacity,
			});
		}
		self.previous.push(object.position);
		self.objects.push(object);
		Ok(self.objects.len() - 1)
	}

	pub fn len(&self) -> usize {
		self.objects.len()
	}

	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn remaining(&self) -> usize {
		self.capacity - self.objects.len()
	}

	pub fn objects(&self) -> &[PhysicsObject] {
		&self.objects
	}

	pub fn previous(&self) -> &[V3] {
		&self.previous
	}

	pub fn read_all(&self) -> Vec<PhysicsObject> {
		self.objects.clone()
	}

	pub fn check_index(&self, index: usize) -> Result<(), Error> {
		if index >= self.objects.len() {
			return Err(Error::InvalidReference {
				index,
				count: self.objects.len(),
			});
		}
		Ok(())
	}

	// teleport, moves both slots so no velocity is derived from the jump
	pub fn reset_pos(&mut self, index: usize, pos: V3) -> Result<(), Error> {
		self.check_index(index)?;
		if !pos.iter().all(|x| x.is_finite()) {
			return Err(Error::NonFinite { field: "position" });
		}
		self.objects[index].position = pos;
		self.previous[index] = pos;
		Ok(())
	}

	// install a reconciled frame, `resolved` becomes the next warm start
	pub(crate) fn commit(&mut self, resolved: Vec<V3>, velocities: Vec<V3>) {
		debug_assert_eq!(resolved.len(), self.objects.len());
		debug_assert_eq!(velocities.len(), self.objects.len());
		for ((object, pos), vel) in self
			.objects
			.iter_mut()
			.zip(resolved.iter())
			.zip(velocities.into_iter())
		{
			object.position = *pos;
			object.velocity = vel;
		}
		self.previous = resolved;
	}

	pub fn clear(&mut self) {
		self.objects.clear();
		self.previous.clear();
	}
}
