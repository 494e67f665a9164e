use chrono::Weekday;
use nom::{
    character::complete::{alpha1, char},
    combinator::{all_consuming, map_res, opt},
    sequence::delimited,
    IResult,
};
use crate::parser::lexer::{unsigned, ws};

/// A date written as `month/day/year`, optionally followed by `(Weekday)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashDate {
    pub month: u32,
    pub day: u32,
    pub year: i32,
    pub weekday: Option<Weekday>,
}

fn weekday_name(input: &str) -> IResult<&str, Weekday> {
    map_res(alpha1, |s: &str| s.parse::<Weekday>())(input)
}

fn weekday_suffix(input: &str) -> IResult<&str, Weekday> {
    delimited(ws(char('(')), weekday_name, ws(char(')')))(input)
}

/// Parse `3/1/2024 (Friday)` or `3/1/2024`. The whole input must be consumed.
pub fn parse_slash_date(input: &str) -> IResult<&str, SlashDate> {
    all_consuming(slash_date)(input)
}

fn slash_date(input: &str) -> IResult<&str, SlashDate> {
    let (input, month) = ws(unsigned)(input)?;
    let (input, _) = char('/')(input)?;
    let (input, day) = ws(unsigned)(input)?;
    let (input, _) = char('/')(input)?;
    let (input, year) = ws(unsigned)(input)?;
    let (input, weekday) = opt(weekday_suffix)(input)?;

    Ok((input, SlashDate { month, day, year: year as i32, weekday }))
}
