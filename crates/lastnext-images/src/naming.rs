//! Storage names for normalized images.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::kind::ImageSpec;

const RANDOM_NAME_LEN: usize = 12;

/// `<category>/<YYYY>/<MM>/<12 alphanumeric>.<ext>` for an upload at `now`.
pub fn upload_path(spec: &ImageSpec, now: DateTime<Utc>) -> String {
	let stem: String = rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(RANDOM_NAME_LEN)
		.map(char::from)
		.collect();

	format!(
		"{}/{:04}/{:02}/{}.{}",
		spec.category,
		now.year(),
		now.month(),
		stem,
		spec.format.extension()
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ImageKind;
	use chrono::TimeZone;
	use rstest::rstest;

	#[rstest]
	#[case(ImageKind::Job, "maintenance_job_images/2024/03/", ".jpg")]
	#[case(ImageKind::Profile, "profile_images/2024/03/", ".webp")]
	fn test_upload_path_layout(
		#[case] kind: ImageKind,
		#[case] prefix: &str,
		#[case] suffix: &str,
	) {
		let now = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();

		let path = upload_path(&kind.spec(), now);

		assert!(path.starts_with(prefix), "{}", path);
		assert!(path.ends_with(suffix), "{}", path);
		let stem = &path[prefix.len()..path.len() - suffix.len()];
		assert_eq!(stem.len(), 12);
		assert!(stem.chars().all(|c| c.is_ascii_alphanumeric()));
	}

	#[rstest]
	fn test_upload_paths_differ() {
		let spec = ImageKind::Job.spec();
		let now = Utc::now();

		assert_ne!(upload_path(&spec, now), upload_path(&spec, now));
	}
}
