/// Crop geometry conversion
///
/// DPP stores a rotated crop as though the whole image was rotated and the
/// canvas expanded to fit it; the crop origin is relative to that expanded
/// canvas. XMP instead stores the corners of a rectangle rotated within the
/// untouched original image, normalized to 0..1, with the opposite angle sign.

use cgmath::{Basis2, Rad, Rotation, Rotation2, Vector2};

use crate::error::{ConvertError, Result};
use crate::metadata::CropRect;

/// Normalized crop box in XMP convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropResult {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    /// Degrees, XMP sign convention
    pub angle: f64,
}

/// Convert a DPP crop to XMP crop coordinates
///
/// # Arguments
/// * `angle_degrees` - DPP rotation angle
/// * `crop_x`, `crop_y` - Crop origin (expanded canvas coordinates when rotated)
/// * `crop_w`, `crop_h` - Crop size in pixels, never negative
/// * `image_w`, `image_h` - Original image size in pixels
pub fn transform(
    angle_degrees: f64,
    crop_x: f64,
    crop_y: f64,
    crop_w: f64,
    crop_h: f64,
    image_w: f64,
    image_h: f64,
) -> Result<CropResult> {
    if !(image_w > 0.0 && image_h > 0.0) {
        return Err(ConvertError::InvalidCrop {
            reason: format!("image size {}x{} is not positive", image_w, image_h),
        });
    }
    if !(crop_w >= 0.0 && crop_h >= 0.0) || !crop_x.is_finite() || !crop_y.is_finite() {
        return Err(ConvertError::InvalidCrop {
            reason: format!("crop {}x{} at {},{} is out of range", crop_w, crop_h, crop_x, crop_y),
        });
    }
    if !angle_degrees.is_finite() {
        return Err(ConvertError::InvalidCrop {
            reason: format!("angle {} is not a number", angle_degrees),
        });
    }

    let (top, left, bottom, right) = if angle_degrees == 0.0 {
        (crop_y, crop_x, crop_y + crop_h, crop_x + crop_w)
    } else {
        let angle = angle_degrees.to_radians();
        let (sin, cos) = (angle.sin().abs(), angle.cos().abs());

        // Size of the expanded canvas DPP measures the origin against
        let expanded = Vector2::new(image_w * cos + image_h * sin, image_w * sin + image_h * cos);
        let center = expanded * 0.5;
        let expansion = (expanded - Vector2::new(image_w, image_h)) * 0.5;

        let unrotate = Basis2::<f64>::from_angle(Rad(-angle));

        // Rotate the origin back around the canvas center, then drop the expansion
        let origin = unrotate.rotate_vector(Vector2::new(crop_x, crop_y) - center) + center - expansion;
        let corner = unrotate.rotate_vector(Vector2::new(crop_w, crop_h)) + origin;

        (origin.y, origin.x, corner.y, corner.x)
    };

    Ok(CropResult {
        top: top / image_h,
        left: left / image_w,
        bottom: bottom / image_h,
        right: right / image_w,
        angle: if angle_degrees == 0.0 { 0.0 } else { -angle_degrees },
    })
}

/// Convert a recipe crop for an image of the given size
pub fn transform_rect(rect: &CropRect, image_w: u32, image_h: u32) -> Result<CropResult> {
    transform(
        rect.angle,
        rect.left,
        rect.top,
        rect.width,
        rect.height,
        image_w as f64,
        image_h as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    /// Inverse of `transform` for a rotated crop: place an original-image
    /// rectangle onto DPP's expanded canvas
    fn expand(angle_degrees: f64, left: f64, top: f64, image_w: f64, image_h: f64) -> (f64, f64) {
        let angle = angle_degrees.to_radians();
        let (sin, cos) = (angle.sin().abs(), angle.cos().abs());
        let expanded = Vector2::new(image_w * cos + image_h * sin, image_w * sin + image_h * cos);
        let center = expanded * 0.5;
        let expansion = (expanded - Vector2::new(image_w, image_h)) * 0.5;
        let rotate = Basis2::<f64>::from_angle(Rad(angle));
        let origin = rotate.rotate_vector(Vector2::new(left, top) + expansion - center) + center;
        (origin.x, origin.y)
    }

    #[test]
    fn test_unrotated_crop_is_normalized() {
        let result = transform(0.0, 100.0, 50.0, 800.0, 600.0, 4000.0, 3000.0).unwrap();
        assert_close(result.top, 50.0 / 3000.0);
        assert_close(result.left, 100.0 / 4000.0);
        assert_close(result.bottom, 650.0 / 3000.0);
        assert_close(result.right, 900.0 / 4000.0);
        assert_eq!(result.angle, 0.0);
    }

    #[test]
    fn test_rotated_crop_round_trip() {
        let (image_w, image_h) = (6000.0, 4000.0);
        let (left, top, w, h) = (900.0, 700.0, 3600.0, 2400.0);

        for angle in [-7.5f64, -1.0, 2.25, 10.0] {
            let (x, y) = expand(angle, left, top, image_w, image_h);
            let result = transform(angle, x, y, w, h, image_w, image_h).unwrap();

            let rad = (-angle).to_radians();
            let right = left + w * rad.cos() - h * rad.sin();
            let bottom = top + w * rad.sin() + h * rad.cos();

            assert_close(result.left * image_w, left);
            assert_close(result.top * image_h, top);
            assert_close(result.right * image_w, right);
            assert_close(result.bottom * image_h, bottom);
            assert_eq!(result.angle, -angle);
        }
    }

    #[test]
    fn test_rotated_crop_keeps_extent() {
        // The crop box keeps its pixel size under rotation
        let result = transform(5.0, 400.0, 300.0, 2000.0, 1000.0, 4000.0, 3000.0).unwrap();
        let dx = (result.right - result.left) * 4000.0;
        let dy = (result.bottom - result.top) * 3000.0;
        let diagonal = (dx * dx + dy * dy).sqrt();
        assert_close(diagonal, (2000.0f64.powi(2) + 1000.0f64.powi(2)).sqrt());
        assert_eq!(result.angle, -5.0);
    }

    #[test]
    fn test_invalid_dimensions_rejected() {
        assert!(transform(0.0, 0.0, 0.0, 10.0, 10.0, 0.0, 3000.0).is_err());
        assert!(transform(0.0, 0.0, 0.0, -10.0, 10.0, 4000.0, 3000.0).is_err());
        assert!(transform(f64::NAN, 0.0, 0.0, 10.0, 10.0, 4000.0, 3000.0).is_err());
    }
}
