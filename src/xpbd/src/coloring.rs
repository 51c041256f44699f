//! Greedy graph coloring of the constraint graph.
//!
//! Constraints of one color share no object, so within a color every
//! constraint can be projected concurrently and every object receives at
//! most one correction. Colors are processed one after another, which
//! makes a relaxation iteration Gauss-Seidel across colors.

use std::ops::Range;

use fnv::FnvHashSet;

use crate::constraint::PhysicsConstraint;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
	A,
	B,
}

/// A constraint touching an object, addressed by its slot in color order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Incident {
	pub color: usize,
	pub slot: usize,
	pub side: Side,
}

#[derive(Clone, Debug)]
pub struct Coloring {
	// constraint ids sorted by color
	order: Vec<usize>,
	ranges: Vec<Range<usize>>,
	// per object incident list, sorted by color
	offsets: Vec<usize>,
	incident: Vec<Incident>,
}

impl Coloring {
	pub fn new(constraints: &[PhysicsConstraint], object_count: usize) -> Self {
		let mut used: Vec<FnvHashSet<usize>> =
			vec![FnvHashSet::default(); object_count];
		let mut colors: Vec<Vec<usize>> = Vec::new();
		for (id, c) in constraints.iter().enumerate() {
			let [a, b] = c.objects();
			let color = (0..)
				.find(|k| !used[a].contains(k) && !used[b].contains(k))
				.unwrap_or_default();
			used[a].insert(color);
			used[b].insert(color);
			if color == colors.len() {
				colors.push(Vec::new());
			}
			colors[color].push(id);
		}

		let mut order = Vec::with_capacity(constraints.len());
		let mut ranges = Vec::with_capacity(colors.len());
		for ids in colors.into_iter() {
			let start = order.len();
			order.extend(ids);
			ranges.push(start..order.len());
		}

		let mut counts = vec![0usize; object_count + 1];
		for &id in order.iter() {
			for index in constraints[id].objects() {
				counts[index + 1] += 1;
			}
		}
		for i in 0..object_count {
			counts[i + 1] += counts[i];
		}
		let offsets = counts;
		let mut fill = offsets.clone();
		let mut incident = vec![
			Incident {
				color: 0,
				slot: 0,
				side: Side::A,
			};
			offsets[object_count]
		];
		// slots are visited in color order, so every list ends up sorted
		for (color, range) in ranges.iter().enumerate() {
			for slot in range.clone() {
				let c = &constraints[order[slot]];
				for (index, side) in [(c.a, Side::A), (c.b, Side::B)] {
					incident[fill[index]] = Incident { color, slot, side };
					fill[index] += 1;
				}
			}
		}

		Self {
			order,
			ranges,
			offsets,
			incident,
		}
	}

	pub fn len(&self) -> usize {
		self.ranges.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ranges.is_empty()
	}

	pub fn object_count(&self) -> usize {
		self.offsets.len() - 1
	}

	/// Constraint ids, grouped by color.
	pub fn order(&self) -> &[usize] {
		&self.order
	}

	/// Slot range of one color inside `order`.
	pub fn range(&self, color: usize) -> Range<usize> {
		self.ranges[color].clone()
	}

	pub fn incident(&self, object: usize) -> &[Incident] {
		&self.incident[self.offsets[object]..self.offsets[object + 1]]
	}

	/// The constraint of `color` touching `object`, if any.
	pub fn find(&self, object: usize, color: usize) -> Option<Incident> {
		let incident = self.incident(object);
		incident
			.binary_search_by_key(&color, |i| i.color)
			.ok()
			.map(|i| incident[i])
	}
}
