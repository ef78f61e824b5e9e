/// Size to downscale to so the larger side equals `max_dimension`
///
/// Returns `None` when the image already fits, images are never enlarged.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let longest = width.max(height);
    if longest <= max_dimension {
        return None;
    }
    let scale = max_dimension as f64 / longest as f64;
    let scaled = |side: u32| {
        if side == longest {
            max_dimension
        } else {
            ((side as f64 * scale).round() as u32).clamp(1, max_dimension)
        }
    };
    Some((scaled(width), scaled(height)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3000, 2000, 1600, Some((1600, 1067)))]
    #[case(2000, 3000, 1600, Some((1067, 1600)))]
    #[case(4000, 4000, 1600, Some((1600, 1600)))]
    #[case(1920, 1080, 800, Some((800, 450)))]
    #[case(10000, 10, 100, Some((100, 1)))]
    #[case(1600, 900, 1600, None)]
    #[case(500, 500, 1600, None)]
    fn fit(
        #[case] width: u32,
        #[case] height: u32,
        #[case] max_dimension: u32,
        #[case] expected: Option<(u32, u32)>,
    ) {
        assert_eq!(fit_within(width, height, max_dimension), expected);
    }
}
