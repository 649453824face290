//! Nodata and validity masking

use ndarray::{Array2, Array3, Axis, Zip};

/// Validity from a nodata value: a pixel is invalid when any channel equals it
///
/// A `NaN` nodata value matches `NaN` samples.
pub fn nodata_validity(data: &Array3<f64>, nodata: f64) -> Array2<bool> {
    let matches = |v: f64| if nodata.is_nan() { v.is_nan() } else { v == nodata };
    data.map_axis(Axis(2), |pixel| !pixel.iter().any(|v| matches(*v)))
}

/// Zeroes every channel of invalid pixels
pub fn apply_validity(data: &mut Array3<f64>, valid: &Array2<bool>) {
    Zip::from(data.lanes_mut(Axis(2))).and(valid).for_each(|mut pixel, ok| {
        if !*ok {
            pixel.fill(0.0);
        }
    });
}

/// Combines nodata and dataset-mask validity and zeroes invalid pixels
///
/// Returns the combined validity.
pub fn mask_pixels(data: &mut Array3<f64>, nodata: Option<f64>, valid: Option<&Array2<bool>>) -> Array2<bool> {
    let mut combined = match nodata {
        Some(value) => nodata_validity(data, value),
        None => Array2::from_elem((data.dim().0, data.dim().1), true),
    };
    if let Some(valid) = valid {
        Zip::from(&mut combined).and(valid).for_each(|c, v| *c &= *v);
    }
    apply_validity(data, &combined);
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn nodata_in_any_channel_zeroes_the_pixel() {
        let mut data = Array3::from_shape_vec((1, 3, 2), vec![1.0, 5.0, 7.0, 8.0, 9.0, 1.0]).unwrap();
        let valid = mask_pixels(&mut data, Some(1.0), None);
        assert_eq!(data.into_raw_vec(), vec![0.0, 0.0, 7.0, 8.0, 0.0, 0.0]);
        assert_eq!(valid, array![[false, true, false]]);
    }

    #[test]
    fn dataset_mask_and_nan_nodata() {
        let mut data = Array3::from_shape_vec((1, 3, 1), vec![f64::NAN, 2.0, 3.0]).unwrap();
        let valid = array![[true, true, false]];
        let combined = mask_pixels(&mut data, Some(f64::NAN), Some(&valid));
        assert_eq!(data.into_raw_vec(), vec![0.0, 2.0, 0.0]);
        assert_eq!(combined, array![[false, true, false]]);
    }
}
