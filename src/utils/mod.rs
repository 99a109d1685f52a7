pub mod labels;
mod structs;

pub use structs::*;

/// Points per millimeter. Every physical length on the command line is in
/// millimeters, every layout coordinate is in points.
pub const PT_PER_MM: f64 = 72.0 / 25.4;

#[cfg(test)]
mod tests {
    use super::PT_PER_MM;

    #[test]
    fn millimeter_conversion() {
        // One inch is 25.4 mm and 72 pt.
        assert!((25.4 * PT_PER_MM - 72.0).abs() < 1e-12);
    }
}
