use crate::error::Result;
use crate::modules::tracker::Centroid;
use crate::modules::{Blob, EllipseFit, FilterModule};

use opencv::core::{Mat, Point, Vector};
use opencv::imgproc;
use opencv::prelude::*;

/// Fewer boundary points than this make an ellipse fit ill-posed.
pub const MIN_ELLIPSE_POINTS: usize = 5;

/// Turns a binary mask into drop candidates.
pub struct BlobExtractor {
	filters: Vec<Box<dyn FilterModule>>,
}

impl BlobExtractor {
	pub fn new(filters: Vec<Box<dyn FilterModule>>) -> Self {
		Self { filters }
	}

	/// Outer contours of `mask` that pass every filter, in contour order.
	pub fn run(&self, mask: &Mat) -> Result<Vec<Blob>> {
		let mut cnts: Vector<Vector<Point>> = Vector::new();
		imgproc::find_contours(
			mask,
			&mut cnts,
			imgproc::RETR_EXTERNAL,
			imgproc::CHAIN_APPROX_SIMPLE,
			Point::new(0, 0),
		)?;

		let mut tracked_objects = Vec::<Blob>::new();

		for cnt in cnts.iter() {
			let area = imgproc::contour_area(&cnt, false)?;
			let moments = imgproc::moments(&cnt, false)?;
			if moments.m00 == 0. {
				log::debug!("Skipping degenerate contour with {} points", cnt.len());
				continue;
			}
			let centroid = Centroid::new((moments.m10 / moments.m00) as i32, (moments.m01 / moments.m00) as i32);
			let bounding = imgproc::bounding_rect(&cnt)?;

			let mut blob = Blob {
				cnt,
				area,
				centroid,
				bounding,
				ellipse: None,
			};
			if !self.filters.iter().all(|filter| filter.run(&blob)) {
				continue;
			}
			blob.ellipse = fit_ellipse(&blob.cnt)?;
			tracked_objects.push(blob);
		}

		Ok(tracked_objects)
	}
}

/// Best-fit ellipse, or `None` when the contour is too short.
pub fn fit_ellipse(cnt: &Vector<Point>) -> Result<Option<EllipseFit>> {
	if cnt.len() < MIN_ELLIPSE_POINTS {
		return Ok(None);
	}
	let rect = imgproc::fit_ellipse(cnt)?;
	Ok(Some(EllipseFit {
		center: (rect.center.x, rect.center.y),
		major: rect.size.width,
		minor: rect.size.height,
		angle: rect.angle,
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::modules::filter::ContourArea;
	use opencv::core::{Rect, Scalar, CV_8UC1};

	fn mask() -> Mat {
		Mat::new_rows_cols_with_default(120, 120, CV_8UC1, Scalar::all(0.)).unwrap()
	}

	fn fill_rect(mask: &mut Mat, rect: Rect) {
		imgproc::rectangle(mask, rect, Scalar::all(255.), imgproc::FILLED, imgproc::LINE_8, 0).unwrap();
	}

	#[test]
	fn rectangle_blob_has_moment_centroid() {
		let mut m = mask();
		fill_rect(&mut m, Rect::new(20, 33, 11, 16));
		let blobs = BlobExtractor::new(Vec::new()).run(&m).unwrap();
		assert_eq!(blobs.len(), 1);
		assert_eq!(blobs[0].area, 150.);
		assert_eq!(blobs[0].centroid, Centroid::new(25, 40));
		assert_eq!(blobs[0].bounding, Rect::new(20, 33, 11, 16));
	}

	#[test]
	fn four_corner_contour_skips_ellipse() {
		let mut m = mask();
		fill_rect(&mut m, Rect::new(20, 33, 11, 16));
		let blobs = BlobExtractor::new(Vec::new()).run(&m).unwrap();
		assert_eq!(blobs[0].cnt.len(), 4);
		assert!(blobs[0].ellipse.is_none());
	}

	#[test]
	fn circle_gets_round_ellipse() {
		let mut m = mask();
		imgproc::circle(&mut m, Point::new(60, 60), 20, Scalar::all(255.), imgproc::FILLED, imgproc::LINE_8, 0).unwrap();
		let blobs = BlobExtractor::new(Vec::new()).run(&m).unwrap();
		let ellipse = blobs[0].ellipse.unwrap();
		assert!((ellipse.center.0 - 60.).abs() < 1.);
		assert!((ellipse.center.1 - 60.).abs() < 1.);
		assert!((ellipse.major - ellipse.minor).abs() < 2.);
		assert!((ellipse.major - 41.).abs() < 3.);
	}

	#[test]
	fn area_filter_is_applied() {
		let mut m = mask();
		fill_rect(&mut m, Rect::new(5, 5, 11, 16)); // 150 px²
		fill_rect(&mut m, Rect::new(60, 60, 5, 5)); // 16 px²
		fill_rect(&mut m, Rect::new(60, 5, 41, 41)); // 1600 px²
		let filters: Vec<Box<dyn FilterModule>> = vec![Box::new(ContourArea::new(100., 500.))];
		let blobs = BlobExtractor::new(filters).run(&m).unwrap();
		assert_eq!(blobs.len(), 1);
		assert_eq!(blobs[0].area, 150.);
	}

	#[test]
	fn single_pixel_is_degenerate() {
		let mut m = mask();
		*m.at_2d_mut::<u8>(50, 50).unwrap() = 255;
		let blobs = BlobExtractor::new(Vec::new()).run(&m).unwrap();
		assert!(blobs.is_empty());
	}
}
