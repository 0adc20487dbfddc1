use thiserror::Error;

/// Raised when a value that should be a single binary digit is anything else.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("invalid binary digit {0}, expected 0 or 1")]
    InvalidDigit(u32),
}

/// One binary digit of the clock. Only constructed from validated bit values, so a mesh builder
/// matching on it never has a fallthrough case.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Digit {
    Zero,
    One,
}

impl Digit {
    /// Extracts bit `bit` of `value`.
    pub fn from_bit(value: u8, bit: usize) -> Digit {
        if (value >> bit) & 1 == 1 {
            Digit::One
        } else {
            Digit::Zero
        }
    }

    pub fn value(self) -> u32 {
        match self {
            Digit::Zero => 0,
            Digit::One => 1,
        }
    }
}

impl TryFrom<u32> for Digit {
    type Error = ConfigurationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Digit::Zero),
            1 => Ok(Digit::One),
            other => Err(ConfigurationError::InvalidDigit(other)),
        }
    }
}

impl From<bool> for Digit {
    fn from(bit: bool) -> Self {
        if bit {
            Digit::One
        } else {
            Digit::Zero
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_zero_and_one() {
        assert_eq!(Digit::try_from(0), Ok(Digit::Zero));
        assert_eq!(Digit::try_from(1), Ok(Digit::One));
        assert_eq!(
            Digit::try_from(2),
            Err(ConfigurationError::InvalidDigit(2))
        );
        assert_eq!(
            Digit::try_from(u32::MAX),
            Err(ConfigurationError::InvalidDigit(u32::MAX))
        );
    }

    #[test]
    fn from_bit_reads_each_position() {
        // 0b1010
        assert_eq!(Digit::from_bit(10, 0), Digit::Zero);
        assert_eq!(Digit::from_bit(10, 1), Digit::One);
        assert_eq!(Digit::from_bit(10, 2), Digit::Zero);
        assert_eq!(Digit::from_bit(10, 3), Digit::One);
    }

    #[test]
    fn value_round_trips_through_try_from() {
        for digit in [Digit::Zero, Digit::One] {
            assert_eq!(Digit::try_from(digit.value()), Ok(digit));
        }
        assert_eq!(Digit::from(true), Digit::One);
        assert_eq!(Digit::from(false), Digit::Zero);
    }
}
