//! Public identifiers for jobs and properties.

use chrono::{DateTime, Utc};
use rand::Rng;

const HEX_UPPER: &[u8] = b"0123456789ABCDEF";

/// `len` characters drawn from `0-9A-F`.
pub fn random_hex(len: usize) -> String {
	let mut rng = rand::thread_rng();
	(0..len)
		.map(|_| char::from(HEX_UPPER[rng.gen_range(0..HEX_UPPER.len())]))
		.collect()
}

/// `j` + two-digit year + six hex characters, e.g. `j24A3F09C`.
pub fn generate_job_id(now: DateTime<Utc>) -> String {
	format!("j{}{}", now.format("%y"), random_hex(6))
}

/// `P` + eight hex characters, e.g. `P0A1B2C3D`.
pub fn generate_property_id() -> String {
	format!("P{}", random_hex(8))
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use rstest::rstest;
	use std::collections::HashSet;

	fn is_upper_hex(s: &str) -> bool {
		s.chars().all(|c| matches!(c, '0'..='9' | 'A'..='F'))
	}

	#[rstest]
	fn test_job_id_format() {
		let now = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();

		let job_id = generate_job_id(now);

		assert_eq!(job_id.len(), 9);
		assert!(job_id.starts_with("j24"));
		assert!(is_upper_hex(&job_id[3..]));
	}

	#[rstest]
	fn test_job_ids_rarely_collide() {
		let now = Utc::now();
		let ids: HashSet<String> = (0..10_000).map(|_| generate_job_id(now)).collect();

		// 16^6 possibilities; a handful of birthday collisions is expected,
		// the insert path retries them.
		assert!(ids.len() >= 9_990, "only {} distinct ids", ids.len());
	}

	#[rstest]
	fn test_property_id_format() {
		let property_id = generate_property_id();

		assert_eq!(property_id.len(), 9);
		assert!(property_id.starts_with('P'));
		assert!(is_upper_hex(&property_id[1..]));
	}
}
