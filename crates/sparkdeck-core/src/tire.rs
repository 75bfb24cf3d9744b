//! Wheel geometry
//!
//! Converts a tire specification (width / aspect ratio / rim diameter) into
//! the rolling circumference the traction-control speed derivation uses.

use std::f64::consts::PI;

const MM_PER_INCH: f64 = 25.4;

/// A tire in the usual `width/aspect Rrim` notation, e.g. 80/90 R17
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TireSpec {
    /// Tread width in millimeters
    pub width_mm: u32,
    /// Sidewall aspect ratio in percent of width
    pub aspect_pct: u32,
    /// Rim diameter in inches
    pub rim_in: u32,
}

impl TireSpec {
    pub fn new(width_mm: u32, aspect_pct: u32, rim_in: u32) -> Self {
        Self {
            width_mm,
            aspect_pct,
            rim_in,
        }
    }

    /// Sidewall height in millimeters
    pub fn sidewall_mm(&self) -> f64 {
        (self.width_mm as f64 * self.aspect_pct as f64) / 100.0
    }

    /// Overall wheel diameter (rim plus both sidewalls) in millimeters
    pub fn total_diameter_mm(&self) -> f64 {
        self.rim_in as f64 * MM_PER_INCH + 2.0 * self.sidewall_mm()
    }

    /// Rolling circumference in meters
    pub fn circumference_m(&self) -> f64 {
        PI * self.total_diameter_mm() / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_tire_circumference() {
        // 70/80 R17, the default front fitment
        let tire = TireSpec::new(70, 80, 17);
        assert!((tire.sidewall_mm() - 56.0).abs() < 1e-9);
        assert!((tire.total_diameter_mm() - 543.8).abs() < 1e-9);
        assert!((tire.circumference_m() - 1.7084).abs() < 1e-3);
    }

    #[test]
    fn test_rear_tire_larger_than_front() {
        let front = TireSpec::new(70, 80, 17);
        let rear = TireSpec::new(80, 90, 17);
        assert!(rear.circumference_m() > front.circumference_m());
    }
}
