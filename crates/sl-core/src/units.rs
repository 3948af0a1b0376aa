// sl-core/src/units.rs

use uom::si::f64::{AngularVelocity as UomAngularVelocity, Time as UomTime};

// Public canonical unit types (SI, f64)
pub type AngularVelocity = UomAngularVelocity;
pub type Time = UomTime;

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn rad_per_s(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::radian_per_second;
    AngularVelocity::new::<radian_per_second>(v)
}

/// Time in seconds as a plain float.
#[inline]
pub fn seconds(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

/// Angular velocity in rad/s as a plain float.
#[inline]
pub fn radians_per_second(w: AngularVelocity) -> f64 {
    use uom::si::angular_velocity::radian_per_second;
    w.get::<radian_per_second>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_return_si_values() {
        assert!((seconds(s(0.1)) - 0.1).abs() < 1e-12);
        assert!((radians_per_second(rad_per_s(2.5)) - 2.5).abs() < 1e-12);
    }
}
