mod sequence;
mod tone;

pub use sequence::{column_frequency, sequence};
pub use tone::synthesize;

use std::fmt;

/// Default output sample rate in Hz.
pub const SAMPLE_RATE: f64 = 44_100.0;
/// Frequency assigned to a fully black column.
pub const BASE_FREQUENCY_HZ: f64 = 20.0;
/// Hz added per unit of average column luminance.
pub const HZ_PER_LEVEL: f64 = 30.0;

/// The audible pitch derived for one column of the reduced grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnFrequency {
    pub column: usize,
    pub frequency: f64,
}

impl fmt::Display for ColumnFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Column {}: {} Hz", self.column, self.frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_line_format() {
        let cf = ColumnFrequency { column: 3, frequency: 20.0 };
        assert_eq!(cf.to_string(), "Column 3: 20 Hz");

        let cf = ColumnFrequency { column: 63, frequency: 4525.3125 };
        assert_eq!(cf.to_string(), "Column 63: 4525.3125 Hz");
    }
}
