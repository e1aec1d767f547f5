use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MbtiError {
    #[error("unknown dimension '{0}', expect one of EI, SN, TF, JP")]
    UnknownDimension(String),

    #[error("unknown choice '{0}', expect A or B")]
    UnknownChoice(String),
}

/// One of the four MBTI axes. The first letter of each pair is picked by
/// choice A, the second by choice B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    EI,
    SN,
    TF,
    JP,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [Dimension::EI, Dimension::SN, Dimension::TF, Dimension::JP];

    pub fn letters(self) -> (char, char) {
        match self {
            Dimension::EI => ('E', 'I'),
            Dimension::SN => ('S', 'N'),
            Dimension::TF => ('T', 'F'),
            Dimension::JP => ('J', 'P'),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::EI => "EI",
            Dimension::SN => "SN",
            Dimension::TF => "TF",
            Dimension::JP => "JP",
        }
    }

    fn index(self) -> usize {
        match self {
            Dimension::EI => 0,
            Dimension::SN => 1,
            Dimension::TF => 2,
            Dimension::JP => 3,
        }
    }
}

impl FromStr for Dimension {
    type Err = MbtiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EI" => Ok(Dimension::EI),
            "SN" => Ok(Dimension::SN),
            "TF" => Ok(Dimension::TF),
            "JP" => Ok(Dimension::JP),
            _ => Err(MbtiError::UnknownDimension(s.to_string())),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    A,
    B,
}

impl FromStr for Choice {
    type Err = MbtiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Choice::A),
            "B" => Ok(Choice::B),
            _ => Err(MbtiError::UnknownChoice(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub dimension: Dimension,
    pub choice: Choice,
}

impl Answer {
    pub fn new(dimension: Dimension, choice: Choice) -> Self {
        Self { dimension, choice }
    }

    /// Builds an answer from its wire representation, rejecting tags outside
    /// the four known pairs.
    pub fn parse(dimension: &str, choice: &str) -> Result<Self, MbtiError> {
        Ok(Self::new(dimension.parse()?, choice.parse()?))
    }
}

/// Count for each of the eight letters. Serialized with the letters as keys,
/// e.g. `{"E": 2, "I": 1, ...}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTally {
    #[serde(rename = "E")]
    pub e: u32,
    #[serde(rename = "I")]
    pub i: u32,
    #[serde(rename = "S")]
    pub s: u32,
    #[serde(rename = "N")]
    pub n: u32,
    #[serde(rename = "T")]
    pub t: u32,
    #[serde(rename = "F")]
    pub f: u32,
    #[serde(rename = "J")]
    pub j: u32,
    #[serde(rename = "P")]
    pub p: u32,
}

impl ScoreTally {
    /// Returns the `(first, second)` letter counts of a dimension.
    pub fn pair(&self, dimension: Dimension) -> (u32, u32) {
        match dimension {
            Dimension::EI => (self.e, self.i),
            Dimension::SN => (self.s, self.n),
            Dimension::TF => (self.t, self.f),
            Dimension::JP => (self.j, self.p),
        }
    }

    fn pair_mut(&mut self, dimension: Dimension) -> (&mut u32, &mut u32) {
        match dimension {
            Dimension::EI => (&mut self.e, &mut self.i),
            Dimension::SN => (&mut self.s, &mut self.n),
            Dimension::TF => (&mut self.t, &mut self.f),
            Dimension::JP => (&mut self.j, &mut self.p),
        }
    }

    fn add(&mut self, answer: &Answer) {
        let (first, second) = self.pair_mut(answer.dimension);
        match answer.choice {
            Choice::A => *first += 1,
            Choice::B => *second += 1,
        }
    }

    /// Derives the type code. The first letter of a pair only wins with a
    /// strictly greater count, ties go to the second letter.
    pub fn mbti_type(&self) -> MbtiType {
        let mut code = ['I', 'N', 'F', 'P'];
        for dimension in Dimension::ALL {
            let (first, second) = self.pair(dimension);
            let (a, b) = dimension.letters();
            code[dimension.index()] = if first > second { a } else { b };
        }
        MbtiType(code)
    }
}

/// A four letter type code such as `ENTP`, always in EI, SN, TF, JP order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbtiType([char; 4]);

impl fmt::Display for MbtiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0 {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl Serialize for MbtiType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Tallies the answers and derives the type. Pure: the same answers always
/// produce the same result.
pub fn score(answers: &[Answer]) -> (ScoreTally, MbtiType) {
    let mut tally = ScoreTally::default();
    for answer in answers {
        tally.add(answer);
    }
    let mbti_type = tally.mbti_type();
    (tally, mbti_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(items: &[(&str, &str)]) -> Vec<Answer> {
        items
            .iter()
            .map(|(d, c)| Answer::parse(d, c).unwrap())
            .collect()
    }

    #[test]
    fn test_score() {
        let (tally, mbti_type) = score(&answers(&[("EI", "A"), ("EI", "A"), ("EI", "B")]));
        assert_eq!(tally.e, 2);
        assert_eq!(tally.i, 1);
        assert!(mbti_type.to_string().starts_with('E'));

        let (tally, mbti_type) =
            score(&answers(&[("EI", "A"), ("SN", "B"), ("TF", "A"), ("JP", "B")]));
        assert_eq!(
            tally,
            ScoreTally {
                e: 1,
                i: 0,
                s: 0,
                n: 1,
                t: 1,
                f: 0,
                j: 0,
                p: 1,
            }
        );
        assert_eq!(mbti_type.to_string(), "ENTP");

        let (tally, mbti_type) = score(&answers(&[
            ("EI", "B"),
            ("SN", "A"),
            ("SN", "A"),
            ("TF", "B"),
            ("JP", "A"),
            ("JP", "A"),
            ("JP", "B"),
        ]));
        assert_eq!(tally.pair(Dimension::SN), (2, 0));
        assert_eq!(tally.pair(Dimension::JP), (2, 1));
        assert_eq!(mbti_type.to_string(), "ISFJ");
    }

    #[test]
    fn test_ties() {
        let (tally, mbti_type) = score(&[]);
        assert_eq!(tally, ScoreTally::default());
        assert_eq!(mbti_type.to_string(), "INFP");

        let (_, mbti_type) = score(&answers(&[
            ("EI", "A"),
            ("EI", "B"),
            ("SN", "A"),
            ("SN", "B"),
            ("TF", "A"),
            ("TF", "B"),
            ("JP", "A"),
            ("JP", "B"),
        ]));
        assert_eq!(mbti_type.to_string(), "INFP");

        // only one axis answered, the rest fall back to the second letter
        let (_, mbti_type) = score(&answers(&[("TF", "A")]));
        assert_eq!(mbti_type.to_string(), "INTP");
    }

    #[test]
    fn test_axis_sums() {
        let input = answers(&[
            ("EI", "A"),
            ("TF", "B"),
            ("EI", "B"),
            ("EI", "A"),
            ("JP", "B"),
            ("TF", "B"),
        ]);
        let (tally, _) = score(&input);
        for dimension in Dimension::ALL {
            let expect = input.iter().filter(|a| a.dimension == dimension).count() as u32;
            let (first, second) = tally.pair(dimension);
            assert_eq!(first + second, expect, "axis {dimension}");
        }
    }

    #[test]
    fn test_idempotent() {
        let input = answers(&[("EI", "A"), ("SN", "B"), ("SN", "B"), ("JP", "A")]);
        assert_eq!(score(&input), score(&input));
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            Answer::parse("SN", "B").unwrap(),
            Answer::new(Dimension::SN, Choice::B)
        );
        assert_eq!(
            Answer::parse("XY", "A"),
            Err(MbtiError::UnknownDimension(String::from("XY")))
        );
        assert_eq!(
            Answer::parse("ei", "A"),
            Err(MbtiError::UnknownDimension(String::from("ei")))
        );
        assert_eq!(
            Answer::parse("EI", "C"),
            Err(MbtiError::UnknownChoice(String::from("C")))
        );
    }

    #[test]
    fn test_json() {
        let (tally, mbti_type) = score(&answers(&[("EI", "A"), ("SN", "B")]));
        let json = serde_json::to_value(tally).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"E": 1, "I": 0, "S": 0, "N": 1, "T": 0, "F": 0, "J": 0, "P": 0})
        );
        assert_eq!(serde_json::to_value(mbti_type).unwrap(), "ENFP");
    }
}
