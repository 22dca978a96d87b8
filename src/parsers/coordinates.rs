use grounding_protocol::Coordinate;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// Read an `(x, y)` point out of free-form model output.
///
/// The first two runs of ASCII digits, in order of appearance, become `x` and
/// `y`. Digits embedded in other tokens count too (`"button2 at 40"` yields
/// `(2, 40)`). Fewer than two runs, or a run too large for `u32`, yields
/// `None`.
pub fn parse_coordinates(text: &str) -> Option<Coordinate> {
    let mut numbers = NUMBER_RE.find_iter(text);
    let x = numbers.next()?.as_str().parse().ok()?;
    let y = numbers.next()?.as_str().parse().ok()?;
    Some(Coordinate::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_in_sentence() {
        assert_eq!(
            parse_coordinates("The point is at (120, 340)"),
            Some(Coordinate::new(120, 340))
        );
    }

    #[test]
    fn test_no_numbers() {
        assert_eq!(parse_coordinates("no coordinates here"), None);
    }

    #[test]
    fn test_single_number() {
        assert_eq!(parse_coordinates("only one: 42"), None);
    }

    #[test]
    fn test_extra_numbers_are_ignored() {
        assert_eq!(
            parse_coordinates("(640, 480) with confidence 97"),
            Some(Coordinate::new(640, 480))
        );
    }

    #[test]
    fn test_embedded_digits_count() {
        assert_eq!(
            parse_coordinates("button2 is at 40"),
            Some(Coordinate::new(2, 40))
        );
    }

    #[test]
    fn test_box_tokens_in_output() {
        assert_eq!(
            parse_coordinates("click(start_box='<|box_start|>(88,19)<|box_end|>')"),
            Some(Coordinate::new(88, 19))
        );
    }

    #[test]
    fn test_overflow_is_absent() {
        assert_eq!(parse_coordinates("99999999999 1"), None);
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse_coordinates(""), None);
    }
}
