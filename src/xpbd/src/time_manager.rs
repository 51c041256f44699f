use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeModel {
	// fixed step, never sleeps
	VideoRender(f32),
	// fixed step, sleeps until the step has passed in real time
	RtFrameLock(f32),
	// measured wall clock time
	RtFrameUnlock,
}

/// Source of per-frame dt for the simulation thread.
pub struct TimeManager {
	model: TimeModel,
	max_dt: f32,
	pause_start: Option<Instant>,
	start_time: Instant,
	total_pause: Duration,
}

// lower bound so a measured step is never zero
const MIN_DT: f32 = 1e-6;

impl TimeManager {
	pub fn new(model: TimeModel, max_dt: f32) -> Self {
		Self {
			model,
			max_dt,
			pause_start: None,
			start_time: Instant::now(),
			total_pause: Duration::ZERO,
		}
	}

	pub fn is_paused(&self) -> bool {
		self.pause_start.is_some()
	}

	// paused time is excluded from the next measured step
	pub fn set(&mut self, on: bool) {
		if on != self.is_paused() {
			return;
		}
		if on {
			if let Some(start) = self.pause_start.take() {
				self.total_pause += start.elapsed();
			}
		} else {
			self.pause_start = Some(Instant::now());
		}
	}

	// NaN falls to MIN_DT, the result is always finite
	pub fn clamp(&self, dt: f32) -> f32 {
		dt.max(MIN_DT).min(self.max_dt.max(MIN_DT)).min(f32::MAX)
	}

	pub fn take_time(&mut self) -> f32 {
		let now = Instant::now();
		let passed = now.duration_since(self.start_time);
		self.start_time = now;
		let active = passed.saturating_sub(self.total_pause);
		self.total_pause = Duration::ZERO;
		let dt = match self.model {
			TimeModel::VideoRender(pft) => pft,
			TimeModel::RtFrameLock(pft) => {
				let pft = self.clamp(pft);
				let frame = Duration::try_from_secs_f32(pft)
					.unwrap_or(Duration::ZERO);
				if active < frame {
					std::thread::sleep(frame - active);
					self.start_time = Instant::now();
				}
				pft
			}
			TimeModel::RtFrameUnlock => active.as_secs_f32(),
		};
		self.clamp(dt)
	}
}
