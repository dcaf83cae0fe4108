pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// `part / whole` as a whole percentage, rounded half away from zero.
/// Zero when `whole` is zero.
pub fn rounded_percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_single_value() {
        assert_eq!(mean(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_rounded_percent() {
        assert_eq!(rounded_percent(15, 20), 75);
        assert_eq!(rounded_percent(7, 10), 70);
        assert_eq!(rounded_percent(1, 8), 13);
        assert_eq!(rounded_percent(10, 10), 100);
    }

    #[test]
    fn test_rounded_percent_of_nothing() {
        assert_eq!(rounded_percent(0, 0), 0);
        assert_eq!(rounded_percent(5, 0), 0);
    }
}
