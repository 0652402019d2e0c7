//! Per-kind output parameters.

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
	Jpeg,
	WebP,
}

impl OutputFormat {
	pub fn extension(self) -> &'static str {
		match self {
			OutputFormat::Jpeg => "jpg",
			OutputFormat::WebP => "webp",
		}
	}

	pub fn content_type(self) -> &'static str {
		match self {
			OutputFormat::Jpeg => "image/jpeg",
			OutputFormat::WebP => "image/webp",
		}
	}
}

/// What an image is uploaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
	/// Photo attached to a maintenance job
	Job,
	/// User profile picture
	Profile,
}

/// Output parameters for an [`ImageKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSpec {
	/// Storage directory prefix
	pub category: &'static str,
	pub max_width: u32,
	pub max_height: u32,
	pub format: OutputFormat,
	/// Encoder quality, 1-100
	pub quality: u8,
}

impl ImageKind {
	pub fn spec(self) -> ImageSpec {
		match self {
			ImageKind::Job => ImageSpec {
				category: "maintenance_job_images",
				max_width: 800,
				max_height: 800,
				format: OutputFormat::Jpeg,
				quality: 85,
			},
			ImageKind::Profile => ImageSpec {
				category: "profile_images",
				max_width: 300,
				max_height: 300,
				format: OutputFormat::WebP,
				quality: 85,
			},
		}
	}
}
