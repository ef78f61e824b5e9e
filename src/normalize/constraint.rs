use super::NormalizeError;

pub const DEFAULT_MAX_DIMENSION: u32 = 1600;
pub const DEFAULT_START_QUALITY: u8 = 95;
pub const DEFAULT_QUALITY_STEP: u8 = 5;
pub const DEFAULT_QUALITY_FLOOR: u8 = 50;

/// Largest side a baseline JPEG can store
pub const MAX_JPEG_DIMENSION: u32 = 65_535;

/// Limits the output of [`super::normalize`] must try to satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeConstraint {
    max_dimension: u32,
    max_bytes: u64,
}

impl SizeConstraint {
    pub fn new(max_dimension: u32, max_bytes: u64) -> Result<Self, NormalizeError> {
        if max_dimension == 0 {
            return Err(NormalizeError::InvalidConstraint(
                "max dimension must be greater than 0".to_string(),
            ));
        }
        if max_dimension > MAX_JPEG_DIMENSION {
            return Err(NormalizeError::InvalidConstraint(format!(
                "max dimension {max_dimension} is above the JPEG limit of {MAX_JPEG_DIMENSION}"
            )));
        }
        if max_bytes == 0 {
            return Err(NormalizeError::InvalidConstraint(
                "max bytes must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            max_dimension,
            max_bytes,
        })
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn fits(&self, encoded_len: usize) -> bool {
        encoded_len as u64 <= self.max_bytes
    }
}

/// JPEG qualities tried in order until the output fits the byte budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityLadder {
    start: u8,
    step: u8,
    floor: u8,
}

impl QualityLadder {
    pub fn new(start: u8, step: u8, floor: u8) -> Result<Self, NormalizeError> {
        if start > 100 {
            return Err(NormalizeError::InvalidLadder(format!(
                "start quality {start} is above 100"
            )));
        }
        if floor == 0 || floor > start {
            return Err(NormalizeError::InvalidLadder(format!(
                "floor {floor} must be between 1 and the start quality {start}"
            )));
        }
        if step == 0 {
            return Err(NormalizeError::InvalidLadder(
                "step must be at least 1".to_string(),
            ));
        }
        Ok(Self { start, step, floor })
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn floor(&self) -> u8 {
        self.floor
    }

    /// The quality to try after `current`, or `None` once the floor was tried
    pub fn next_after(&self, current: u8) -> Option<u8> {
        if current <= self.floor {
            None
        } else {
            Some(current.saturating_sub(self.step).max(self.floor))
        }
    }

    /// Every quality of the ladder, highest first
    pub fn qualities(&self) -> impl Iterator<Item = u8> + '_ {
        std::iter::successors(Some(self.start), move |&q| self.next_after(q))
    }

    pub fn max_attempts(&self) -> usize {
        self.qualities().count()
    }
}

impl Default for QualityLadder {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_QUALITY,
            step: DEFAULT_QUALITY_STEP,
            floor: DEFAULT_QUALITY_FLOOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_ladder() {
        let actual: Vec<u8> = QualityLadder::default().qualities().collect();
        assert_eq!(actual, vec![95, 90, 85, 80, 75, 70, 65, 60, 55, 50]);
        assert_eq!(QualityLadder::default().max_attempts(), 10);
    }

    #[test]
    fn uneven_step_ends_on_floor() {
        let ladder = QualityLadder::new(95, 10, 50).unwrap();
        let actual: Vec<u8> = ladder.qualities().collect();
        assert_eq!(actual, vec![95, 85, 75, 65, 55, 50]);
    }

    #[test]
    fn start_equal_to_floor_is_single_attempt() {
        let ladder = QualityLadder::new(70, 5, 70).unwrap();
        assert_eq!(ladder.qualities().collect::<Vec<_>>(), vec![70]);
    }

    #[rstest]
    #[case(101, 5, 50)]
    #[case(95, 0, 50)]
    #[case(95, 5, 0)]
    #[case(60, 5, 70)]
    fn rejects_invalid_ladder(#[case] start: u8, #[case] step: u8, #[case] floor: u8) {
        let actual = QualityLadder::new(start, step, floor);
        assert!(matches!(actual, Err(NormalizeError::InvalidLadder(_))));
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 0)]
    #[case(65_536, 5_000_000)]
    #[case(100_000, 5_000_000)]
    fn rejects_invalid_constraint(#[case] max_dimension: u32, #[case] max_bytes: u64) {
        let actual = SizeConstraint::new(max_dimension, max_bytes);
        assert!(matches!(actual, Err(NormalizeError::InvalidConstraint(_))));
    }

    #[test]
    fn accepts_jpeg_limit() {
        let constraint = SizeConstraint::new(MAX_JPEG_DIMENSION, 1).unwrap();
        assert_eq!(constraint.max_dimension(), 65_535);
    }

    #[test]
    fn fits_is_inclusive() {
        let constraint = SizeConstraint::new(10, 100).unwrap();
        assert!(constraint.fits(100));
        assert!(!constraint.fits(101));
    }
}
