//! Lexical primitives shared by the OBJ and MTL tokenizers: signed integers, locale-independent
//! floats, and 2-/3-float tuples over a moving `&str` cursor.

use crate::model::{Vec2, Vec3};
use nom::IResult;
use nom::character::complete::{i32 as signed_i32, multispace1};
use nom::number::complete::float;

/// Parses a signed base-10 integer, leaving the cursor immediately after the last digit.
/// Fails without advancing if no digit is present.
pub fn int(input: &str) -> IResult<&str, i32> {
    signed_i32(input)
}

/// Parses a float with optional sign, integer part, fractional part and exponent.
pub fn scalar(input: &str) -> IResult<&str, f32> {
    float(input)
}

/// Parses two whitespace-separated floats.
pub fn vec2(input: &str) -> IResult<&str, Vec2> {
    let (input, x) = scalar(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = scalar(input)?;
    Ok((input, (x, y)))
}

/// Parses three whitespace-separated floats.
pub fn vec3(input: &str) -> IResult<&str, Vec3> {
    let (input, x) = scalar(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = scalar(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = scalar(input)?;
    Ok((input, (x, y, z)))
}

/// Parses zero to three whitespace-separated floats, leaving components that are absent from
/// the input at `default`. Never fails; an input with no leading float simply returns
/// `default` unchanged and does not advance the cursor.
pub fn vec3_optional(input: &str, default: Vec3) -> (&str, Vec3) {
    let mut components = [default.0, default.1, default.2];
    let mut rest = input;
    for slot in components.iter_mut() {
        let trimmed = rest.trim_start();
        match scalar(trimmed) {
            Ok((next, value)) => {
                *slot = value;
                rest = next;
            }
            Err(_) => break,
        }
    }
    (rest, (components[0], components[1], components[2]))
}

/// Consumes the remainder of the current line, trimming surrounding whitespace. Used for
/// `mtllib`/texture paths, which may legally contain interior spaces.
pub fn get_str_range(input: &str) -> &str {
    input.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_parses_optional_sign() {
        assert_eq!(int("-42 rest"), Ok((" rest", -42)));
        assert_eq!(int("7"), Ok(("", 7)));
        assert!(int("abc").is_err());
    }

    #[test]
    fn scalar_parses_float_forms() {
        assert_eq!(scalar("1"), Ok(("", 1.0)));
        assert_eq!(scalar("-1.5"), Ok(("", -1.5)));
        assert_eq!(scalar("1.5e2 rest"), Ok((" rest", 150.0)));
    }

    #[test]
    fn vec3_parses_three_whitespace_separated_floats() {
        assert_eq!(vec3("1.0 -2.0 3.5"), Ok(("", (1.0, -2.0, 3.5))));
    }

    #[test]
    fn vec3_optional_fills_missing_components_with_default() {
        let (rest, v) = vec3_optional("0.5", (0.0, 1.0, 0.0));
        assert_eq!(rest, "");
        assert_eq!(v, (0.5, 1.0, 0.0));

        let (rest, v) = vec3_optional("", (0.0, 1.0, 0.0));
        assert_eq!(rest, "");
        assert_eq!(v, (0.0, 1.0, 0.0));

        let (rest, v) = vec3_optional("0.5 0.25", (0.0, 1.0, 0.0));
        assert_eq!(rest, "");
        assert_eq!(v, (0.5, 0.25, 0.0));
    }

    #[test]
    fn get_str_range_trims_whitespace() {
        assert_eq!(get_str_range("  tex/albedo.png  "), "tex/albedo.png");
    }
}
