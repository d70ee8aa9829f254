use super::common::{identifier, keyword, value, ws};
use super::queries::condition;
use super::statement::Statement;
use nom::{
    character::complete::char,
    combinator::opt,
    multi::separated_list1,
    sequence::{delimited, pair, preceded, separated_pair},
    IResult,
};

pub fn insert(input: &str) -> IResult<&str, Statement> {
    let (input, _) = pair(keyword("INSERT"), keyword("INTO"))(input)?;
    let (input, table) = ws(identifier)(input)?;
    let (input, columns) = opt(delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), ws(identifier)),
        ws(char(')')),
    ))(input)?;
    let (input, _) = keyword("VALUES")(input)?;
    let (input, rows) = separated_list1(
        ws(char(',')),
        delimited(
            ws(char('(')),
            separated_list1(ws(char(',')), ws(value)),
            ws(char(')')),
        ),
    )(input)?;

    Ok((
        input,
        Statement::Insert {
            table,
            columns,
            rows,
        },
    ))
}

pub fn update(input: &str) -> IResult<&str, Statement> {
    let (input, _) = keyword("UPDATE")(input)?;
    let (input, table) = ws(identifier)(input)?;
    let (input, _) = keyword("SET")(input)?;
    let (input, assignments) = separated_list1(
        ws(char(',')),
        separated_pair(ws(identifier), ws(char('=')), ws(value)),
    )(input)?;
    let (input, filter) = opt(preceded(keyword("WHERE"), condition))(input)?;

    Ok((
        input,
        Statement::Update {
            table,
            assignments,
            filter,
        },
    ))
}

pub fn delete(input: &str) -> IResult<&str, Statement> {
    let (input, _) = pair(keyword("DELETE"), keyword("FROM"))(input)?;
    let (input, from) = ws(identifier)(input)?;
    let (input, filter) = opt(preceded(keyword("WHERE"), condition))(input)?;

    Ok((input, Statement::Delete { from, filter }))
}
