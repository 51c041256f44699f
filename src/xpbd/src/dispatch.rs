//! Data-parallel execution of solver sub-passes.
//!
//! Each call to [`ParallelFor::for_each_mut`] is one sub-pass: it hands out
//! disjoint `&mut` items and returns only after every item is done, which
//! is the barrier between a pass that writes and the pass that reads it.

use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use crate::config::DispatchKind;
use crate::error::DispatchError;

/// Items per work group.
pub const GROUP_SIZE: usize = 64;

pub fn work_groups(len: usize) -> usize {
	(len + GROUP_SIZE - 1) / GROUP_SIZE
}

pub trait ParallelFor: Send + Sync {
	fn for_each_mut<T, F>(
		&self,
		pass: &'static str,
		items: &mut [T],
		body: F,
	) -> Result<(), DispatchError>
	where
		T: Send,
		F: Fn(usize, &mut T) + Send + Sync;
}

/// Runs every item in order on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct Serial;

impl ParallelFor for Serial {
	fn for_each_mut<T, F>(
		&self,
		pass: &'static str,
		items: &mut [T],
		body: F,
	) -> Result<(), DispatchError>
	where
		T: Send,
		F: Fn(usize, &mut T) + Send + Sync,
	{
		panic::catch_unwind(AssertUnwindSafe(|| {
			items
				.iter_mut()
				.enumerate()
				.for_each(|(i, item)| body(i, item))
		}))
		.map_err(|_| DispatchError::Panicked { pass })
	}
}

/// Runs work groups on a dedicated rayon pool.
pub struct Rayon {
	pool: rayon::ThreadPool,
}

impl Rayon {
	pub fn new(threads: Option<usize>) -> Result<Self, DispatchError> {
		let mut builder = rayon::ThreadPoolBuilder::new()
			.thread_name(|i| format!("pbd-worker-{}", i));
		if let Some(threads) = threads {
			builder = builder.num_threads(threads);
		}
		let pool = builder
			.build()
			.map_err(|e| DispatchError::ThreadPool(e.to_string()))?;
		Ok(Self { pool })
	}

	pub fn threads(&self) -> usize {
		self.pool.current_num_threads()
	}
}

impl ParallelFor for Rayon {
	fn for_each_mut<T, F>(
		&self,
		pass: &'static str,
		items: &mut [T],
		body: F,
	) -> Result<(), DispatchError>
	where
		T: Send,
		F: Fn(usize, &mut T) + Send + Sync,
	{
		// a panicking worker resurfaces from install() on this thread
		panic::catch_unwind(AssertUnwindSafe(|| {
			self.pool.install(|| {
				items.par_chunks_mut(GROUP_SIZE).enumerate().for_each(
					|(group, chunk)| {
						let base = group * GROUP_SIZE;
						for (i, item) in chunk.iter_mut().enumerate() {
							body(base + i, item);
						}
					},
				)
			})
		}))
		.map_err(|_| DispatchError::Panicked { pass })
	}
}

/// The dispatcher picked by configuration.
pub enum Dispatcher {
	Serial(Serial),
	Rayon(Rayon),
}

impl Dispatcher {
	pub fn new(kind: DispatchKind, threads: Option<usize>) -> Self {
		match kind {
			DispatchKind::Serial => Self::Serial(Serial),
			DispatchKind::Parallel => Self::parallel(threads),
			#[cfg(debug_assertions)]
			DispatchKind::Auto => Self::Serial(Serial),
			#[cfg(not(debug_assertions))]
			DispatchKind::Auto => Self::parallel(threads),
		}
	}

	fn parallel(threads: Option<usize>) -> Self {
		match Rayon::new(threads) {
			Ok(rayon) => Self::Rayon(rayon),
			Err(e) => {
				log::warn!("{}, falling back to serial dispatch", e);
				Self::Serial(Serial)
			}
		}
	}

	pub fn is_parallel(&self) -> bool {
		matches!(self, Self::Rayon(_))
	}
}

impl ParallelFor for Dispatcher {
	fn for_each_mut<T, F>(
		&self,
		pass: &'static str,
		items: &mut [T],
		body: F,
	) -> Result<(), DispatchError>
	where
		T: Send,
		F: Fn(usize, &mut T) + Send + Sync,
	{
		match self {
			Self::Serial(d) => d.for_each_mut(pass, items, body),
			Self::Rayon(d) => d.for_each_mut(pass, items, body),
		}
	}
}
