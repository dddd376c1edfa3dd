//! Joint pose strings such as `hip=0.5, knee=-0.78`
//!
//! Angles are radians. Entries are separated by commas; whitespace around
//! names, `=` and commas is ignored.
use nom::{
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map},
    multi::separated_list0,
    number::complete::float,
    sequence::{delimited, separated_pair},
    IResult,
};

use crate::error::PoseError;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pose {
    pub angles: Vec<(String, f32)>,
}

impl Pose {
    pub fn parse(input: &str) -> Result<Self, PoseError> {
        let (_, angles) = all_consuming(delimited(multispace0, entries, multispace0))(input)
            .map_err(|e| match e {
                nom::Err::Error(e) | nom::Err::Failure(e) => PoseError::Syntax(snippet(e.input)),
                nom::Err::Incomplete(_) => PoseError::Syntax(snippet(input)),
            })?;

        if let Some((name, _)) = angles.iter().find(|(_, angle)| !angle.is_finite()) {
            return Err(PoseError::NonFinite(name.clone()));
        }
        Ok(Self { angles })
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        // Later entries win.
        self.angles
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, angle)| *angle)
    }
}

fn snippet(rest: &str) -> String {
    rest.chars().take(16).collect()
}

fn entries(input: &str) -> IResult<&str, Vec<(String, f32)>> {
    separated_list0(delimited(multispace0, char(','), multispace0), entry)(input)
}

fn entry(input: &str) -> IResult<&str, (String, f32)> {
    separated_pair(
        map(name, str::to_string),
        delimited(multispace0, char('='), multispace0),
        float,
    )(input)
}

fn name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pose() {
        let pose = Pose::parse(" hip=0.5, knee = -0.78 ,toes=1e-1 ").unwrap();
        assert_eq!(pose.angles.len(), 3);
        assert_eq!(pose.get("hip"), Some(0.5));
        assert_eq!(pose.get("knee"), Some(-0.78));
        assert!((pose.get("toes").unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(pose.get("elbow"), None);
    }

    #[test]
    fn test_empty_pose() {
        assert!(Pose::parse("").unwrap().is_empty());
        assert!(Pose::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_later_entries_win() {
        let pose = Pose::parse("knee=1,knee=2").unwrap();
        assert_eq!(pose.get("knee"), Some(2.0));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(Pose::parse("hip"), Err(PoseError::Syntax(_))));
        assert!(matches!(Pose::parse("hip=abc"), Err(PoseError::Syntax(_))));
        assert!(matches!(Pose::parse("hip=1,"), Err(PoseError::Syntax(_))));
    }

    #[test]
    fn test_non_finite_angle() {
        assert_eq!(
            Pose::parse("hip=inf"),
            Err(PoseError::NonFinite("hip".to_string()))
        );
    }
}
