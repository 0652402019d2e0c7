//! Decode, flatten, bound and re-encode.
//!
//! Everything here is CPU bound and synchronous; [`ImagePipeline`](crate::ImagePipeline)
//! runs it on the blocking thread pool.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Rgba, RgbaImage, RgbImage};
use std::io::Cursor;

use crate::error::{ImageError, Result};
use crate::kind::{ImageKind, ImageSpec, OutputFormat};
use crate::upload::UploadedFile;

/// Extensions accepted for uploads, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// An encoded image ready to be stored.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
	pub data: Vec<u8>,
	pub width: u32,
	pub height: u32,
	pub format: OutputFormat,
}

/// Check the extension of an upload against [`ALLOWED_EXTENSIONS`].
pub fn validate_extension(upload: &UploadedFile) -> Result<String> {
	let extension = upload
		.extension()
		.ok_or_else(|| ImageError::MissingExtension(upload.filename.clone()))?;

	if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
		Ok(extension)
	} else {
		Err(ImageError::UnsupportedExtension { extension })
	}
}

/// Normalize an upload for `kind`.
pub fn normalize(upload: &UploadedFile, kind: ImageKind) -> Result<NormalizedImage> {
	validate_extension(upload)?;
	let spec = kind.spec();

	let decoded = decode(&upload.data)?;
	let rgb = bound(flatten(decoded), &spec);
	let (width, height) = rgb.dimensions();
	let data = encode(rgb, &spec)?;

	Ok(NormalizedImage {
		data,
		width,
		height,
		format: spec.format,
	})
}

fn decode(data: &[u8]) -> Result<DynamicImage> {
	ImageReader::new(Cursor::new(data))
		.with_guessed_format()
		.map_err(|e| ImageError::Decode(e.to_string()))?
		.decode()
		.map_err(|e| ImageError::Decode(e.to_string()))
}

/// Composite transparent images onto opaque white, then drop to 8-bit RGB.
fn flatten(img: DynamicImage) -> RgbImage {
	if !img.color().has_alpha() {
		return img.to_rgb8();
	}

	let rgba = img.to_rgba8();
	let mut canvas = RgbaImage::from_pixel(rgba.width(), rgba.height(), Rgba([255, 255, 255, 255]));
	imageops::overlay(&mut canvas, &rgba, 0, 0);
	DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Downscale so both sides fit the bound, keeping the aspect ratio.
fn bound(rgb: RgbImage, spec: &ImageSpec) -> RgbImage {
	let (width, height) = rgb.dimensions();
	if width <= spec.max_width && height <= spec.max_height {
		return rgb;
	}

	DynamicImage::ImageRgb8(rgb)
		.resize(spec.max_width, spec.max_height, FilterType::Lanczos3)
		.to_rgb8()
}

fn encode(rgb: RgbImage, spec: &ImageSpec) -> Result<Vec<u8>> {
	match spec.format {
		OutputFormat::Jpeg => {
			let mut out = Vec::new();
			JpegEncoder::new_with_quality(&mut out, spec.quality)
				.encode_image(&rgb)
				.map_err(|e| ImageError::Encode(e.to_string()))?;
			Ok(out)
		}
		OutputFormat::WebP => {
			let img = DynamicImage::ImageRgb8(rgb);
			let encoder =
				webp::Encoder::from_image(&img).map_err(|e| ImageError::Encode(e.to_string()))?;
			Ok(encoder.encode(f32::from(spec.quality)).to_vec())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::{GenericImageView, ImageFormat};
	use rstest::rstest;

	fn png_bytes(img: DynamicImage) -> Vec<u8> {
		let mut out = Cursor::new(Vec::new());
		img.write_to(&mut out, ImageFormat::Png).unwrap();
		out.into_inner()
	}

	fn solid_rgb(width: u32, height: u32) -> Vec<u8> {
		png_bytes(DynamicImage::ImageRgb8(RgbImage::from_pixel(
			width,
			height,
			image::Rgb([40, 90, 160]),
		)))
	}

	/// Red square whose top-left quadrant is fully transparent.
	fn transparent_corner(size: u32) -> Vec<u8> {
		let img = RgbaImage::from_fn(size, size, |x, y| {
			if x < size / 2 && y < size / 2 {
				Rgba([0, 0, 0, 0])
			} else {
				Rgba([200, 0, 0, 255])
			}
		});
		png_bytes(DynamicImage::ImageRgba8(img))
	}

	// ========================================================================
	// Extension validation
	// ========================================================================

	#[rstest]
	#[case("photo.png", "png")]
	#[case("PHOTO.JPG", "jpg")]
	#[case("scan.Jpeg", "jpeg")]
	#[case("anim.gif", "gif")]
	#[case("x.webp", "webp")]
	fn test_allowed_extensions(#[case] filename: &str, #[case] expected: &str) {
		let upload = UploadedFile::new(filename, Vec::new());

		assert_eq!(validate_extension(&upload).unwrap(), expected);
	}

	#[rstest]
	#[case("doc.pdf")]
	#[case("image.bmp")]
	#[case("archive.png.zip")]
	fn test_rejected_extensions(#[case] filename: &str) {
		let upload = UploadedFile::new(filename, Vec::new());

		assert!(matches!(
			validate_extension(&upload),
			Err(ImageError::UnsupportedExtension { .. })
		));
	}

	#[rstest]
	fn test_missing_extension() {
		let upload = UploadedFile::new("README", Vec::new());

		assert!(matches!(
			validate_extension(&upload),
			Err(ImageError::MissingExtension(_))
		));
	}

	// ========================================================================
	// Normalization
	// ========================================================================

	#[rstest]
	fn test_transparent_corner_becomes_white() {
		let upload = UploadedFile::new("corner.png", transparent_corner(64));

		let normalized = normalize(&upload, ImageKind::Job).unwrap();

		let decoded = image::load_from_memory(&normalized.data).unwrap().to_rgb8();
		let corner = decoded.get_pixel(4, 4);
		assert!(corner.0.iter().all(|&c| c >= 240), "corner was {:?}", corner);
		let opaque = decoded.get_pixel(60, 60);
		assert!(opaque.0[0] > 150 && opaque.0[1] < 60, "opaque was {:?}", opaque);
	}

	#[rstest]
	#[case(1600, 1200, 800, 600)]
	#[case(1200, 1600, 600, 800)]
	#[case(2000, 500, 800, 200)]
	fn test_large_job_images_bounded(
		#[case] width: u32,
		#[case] height: u32,
		#[case] expected_width: u32,
		#[case] expected_height: u32,
	) {
		let upload = UploadedFile::new("big.png", solid_rgb(width, height));

		let normalized = normalize(&upload, ImageKind::Job).unwrap();

		assert!(normalized.width <= 800 && normalized.height <= 800);
		assert!(normalized.width.abs_diff(expected_width) <= 1);
		assert!(normalized.height.abs_diff(expected_height) <= 1);
		let decoded = image::load_from_memory(&normalized.data).unwrap();
		assert_eq!(decoded.dimensions(), (normalized.width, normalized.height));
	}

	#[rstest]
	fn test_small_images_keep_dimensions() {
		let upload = UploadedFile::new("small.png", solid_rgb(120, 80));

		let normalized = normalize(&upload, ImageKind::Job).unwrap();

		assert_eq!((normalized.width, normalized.height), (120, 80));
		assert_eq!(
			image::guess_format(&normalized.data).unwrap(),
			ImageFormat::Jpeg
		);
	}

	#[rstest]
	fn test_profile_images_are_webp_within_300() {
		let upload = UploadedFile::new("me.PNG", transparent_corner(900));

		let normalized = normalize(&upload, ImageKind::Profile).unwrap();

		assert_eq!(normalized.format, OutputFormat::WebP);
		assert_eq!((normalized.width, normalized.height), (300, 300));
		assert_eq!(
			image::guess_format(&normalized.data).unwrap(),
			ImageFormat::WebP
		);
	}

	#[rstest]
	#[case(ImageKind::Job, 800, ImageFormat::Jpeg)]
	#[case(ImageKind::Profile, 300, ImageFormat::WebP)]
	fn test_downscaled_transparency_is_white(
		#[case] kind: ImageKind,
		#[case] bound: u32,
		#[case] format: ImageFormat,
	) {
		let upload = UploadedFile::new("large.png", transparent_corner(1000));

		let normalized = normalize(&upload, kind).unwrap();

		assert_eq!((normalized.width, normalized.height), (bound, bound));
		assert_eq!(image::guess_format(&normalized.data).unwrap(), format);
		let decoded = image::load_from_memory(&normalized.data).unwrap().to_rgba8();
		assert_eq!(decoded.dimensions(), (bound, bound));
		let corner = decoded.get_pixel(bound / 10, bound / 10);
		assert!(corner.0[..3].iter().all(|&c| c >= 235), "corner was {:?}", corner);
		assert_eq!(corner.0[3], 255);
		let opaque = decoded.get_pixel(bound - bound / 10, bound - bound / 10);
		assert!(opaque.0[0] > 150 && opaque.0[1] < 60, "opaque was {:?}", opaque);
	}

	#[rstest]
	fn test_garbage_fails_to_decode() {
		let upload = UploadedFile::new("broken.jpg", b"definitely not an image".to_vec());

		let result = normalize(&upload, ImageKind::Job);

		assert!(matches!(result, Err(ImageError::Decode(_))));
		assert!(result.unwrap_err().is_processing());
	}

	#[rstest]
	fn test_content_wins_over_extension() {
		// PNG content under a .jpg name still decodes.
		let upload = UploadedFile::new("actually-png.jpg", solid_rgb(10, 10));

		assert!(normalize(&upload, ImageKind::Job).is_ok());
	}
}
