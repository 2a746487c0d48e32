use crate::error::SampleError;

/// Wrap longitude into [-180, 180]
#[inline(always)]
pub fn wrap_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 to -180; keep the antimeridian on the side it came from
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Clamp latitude into [-90, 90]
#[inline(always)]
pub fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(-90.0, 90.0)
}

/// Reject coordinates outside the valid WGS84 range (or non-finite)
pub fn validate(latitude: f64, longitude: f64) -> Result<(), SampleError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(SampleError::Latitude(latitude));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(SampleError::Longitude(longitude));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_lon() {
        assert_eq!(wrap_lon(0.0), 0.0);
        assert_eq!(wrap_lon(190.0), -170.0);
        assert_eq!(wrap_lon(-190.0), 170.0);
        assert_eq!(wrap_lon(180.0), 180.0);
        assert_eq!(wrap_lon(-180.0), -180.0);
    }

    #[test]
    fn test_validate_bounds() {
        assert!(validate(90.0, 180.0).is_ok());
        assert!(validate(-90.0, -180.0).is_ok());
        assert!(matches!(validate(90.5, 0.0), Err(SampleError::Latitude(_))));
        assert!(matches!(validate(0.0, -180.01), Err(SampleError::Longitude(_))));
        assert!(validate(f64::NAN, 0.0).is_err());
    }
}
