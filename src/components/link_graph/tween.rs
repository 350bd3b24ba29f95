/// Time-based interpolation of one scalar, sampled at render time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
	from: f64,
	to: f64,
	start_ms: f64,
	duration_ms: f64,
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

impl Tween {
	pub fn fixed(value: f64) -> Self {
		Self {
			from: value,
			to: value,
			start_ms: 0.0,
			duration_ms: 0.0,
		}
	}

	pub fn value_at(&self, now_ms: f64) -> f64 {
		if self.duration_ms <= 0.0 || now_ms >= self.start_ms + self.duration_ms {
			return self.to;
		}
		let t = ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0);
		self.from + (self.to - self.from) * ease_out_cubic(t)
	}

	#[cfg(test)]
	pub fn target(&self) -> f64 {
		self.to
	}

	/// Retarget from wherever the tween currently is.
	pub fn retarget(&mut self, to: f64, now_ms: f64, duration_ms: f64) {
		if self.to == to {
			return;
		}
		self.from = self.value_at(now_ms);
		self.to = to;
		self.start_ms = now_ms;
		self.duration_ms = duration_ms;
	}

	/// Jump straight to `value`, cancelling any running animation.
	pub fn set(&mut self, value: f64) {
		*self = Self::fixed(value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fixed_is_constant() {
		let t = Tween::fixed(0.4);
		assert_eq!(t.value_at(0.0), 0.4);
		assert_eq!(t.value_at(1e9), 0.4);
	}

	#[test]
	fn retarget_interpolates_and_settles() {
		let mut t = Tween::fixed(0.0);
		t.retarget(1.0, 1000.0, 200.0);
		assert_eq!(t.value_at(1000.0), 0.0);
		let mid = t.value_at(1100.0);
		assert!(mid > 0.5 && mid < 1.0);
		assert_eq!(t.value_at(1200.0), 1.0);
		assert_eq!(t.value_at(5000.0), 1.0);
	}

	#[test]
	fn retarget_midway_starts_from_current_value() {
		let mut t = Tween::fixed(0.0);
		t.retarget(1.0, 0.0, 200.0);
		let at = t.value_at(100.0);
		t.retarget(0.2, 100.0, 200.0);
		assert_eq!(t.value_at(100.0), at);
		assert_eq!(t.target(), 0.2);
	}
}
