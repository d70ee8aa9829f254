use super::common::{identifier, keyword, string_literal, unsigned, value, ws};
use super::statement::{
    AggregateFunction, Condition, CountTarget, SelectColumn, SelectStatement, SortOrder, Statement,
};
use crate::types::Value;
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::char,
    combinator::{map, opt, value as constant},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, tuple},
    IResult,
};

enum PredicateTail {
    IsNull(bool),
    Between(bool, Value, Value),
    Like(bool, String),
    In(bool, Vec<Value>),
    Compare(&'static str, Value),
}

fn negatable(input: &str) -> IResult<&str, bool> {
    map(opt(keyword("NOT")), |n| n.is_some())(input)
}

fn comparison_operator(input: &str) -> IResult<&str, &'static str> {
    ws(alt((
        constant(">=", tag(">=")),
        constant("<=", tag("<=")),
        constant("!=", tag("!=")),
        constant("!=", tag("<>")),
        constant("=", tag("=")),
        constant(">", tag(">")),
        constant("<", tag("<")),
    )))(input)
}

fn like_pattern(input: &str) -> IResult<&str, String> {
    alt((string_literal, map(value, |v| v.to_string())))(input)
}

fn predicate_tail(input: &str) -> IResult<&str, PredicateTail> {
    alt((
        map(
            delimited(keyword("IS"), negatable, keyword("NULL")),
            PredicateTail::IsNull,
        ),
        map(
            tuple((
                negatable,
                preceded(keyword("BETWEEN"), ws(value)),
                preceded(keyword("AND"), ws(value)),
            )),
            |(negated, low, high)| PredicateTail::Between(negated, low, high),
        ),
        map(
            pair(negatable, preceded(keyword("LIKE"), ws(like_pattern))),
            |(negated, pattern)| PredicateTail::Like(negated, pattern),
        ),
        map(
            pair(
                negatable,
                preceded(
                    keyword("IN"),
                    delimited(
                        ws(char('(')),
                        separated_list1(ws(char(',')), ws(value)),
                        ws(char(')')),
                    ),
                ),
            ),
            |(negated, values)| PredicateTail::In(negated, values),
        ),
        map(pair(comparison_operator, ws(value)), |(op, v)| {
            PredicateTail::Compare(op, v)
        }),
    ))(input)
}

fn negate_if(negated: bool, condition: Condition) -> Condition {
    if negated {
        Condition::Not(Box::new(condition))
    } else {
        condition
    }
}

fn predicate(input: &str) -> IResult<&str, Condition> {
    let (input, column) = ws(column_ref)(input)?;
    let (input, tail) = predicate_tail(input)?;

    let condition = match tail {
        PredicateTail::IsNull(true) => Condition::IsNotNull(column),
        PredicateTail::IsNull(false) => Condition::IsNull(column),
        PredicateTail::Between(negated, low, high) => {
            negate_if(negated, Condition::Between(column, low, high))
        }
        PredicateTail::Like(negated, pattern) => {
            negate_if(negated, Condition::Like(column, pattern))
        }
        PredicateTail::In(negated, values) => negate_if(negated, Condition::In(column, values)),
        PredicateTail::Compare(op, v) => match op {
            "=" => Condition::Equals(column, v),
            "!=" => Condition::NotEquals(column, v),
            ">" => Condition::GreaterThan(column, v),
            "<" => Condition::LessThan(column, v),
            ">=" => Condition::GreaterThanOrEqual(column, v),
            _ => Condition::LessThanOrEqual(column, v),
        },
    };
    Ok((input, condition))
}

fn condition_term(input: &str) -> IResult<&str, Condition> {
    alt((
        delimited(ws(char('(')), condition, ws(char(')'))),
        map(preceded(keyword("NOT"), condition_term), |c| {
            Condition::Not(Box::new(c))
        }),
        predicate,
    ))(input)
}

// AND binds tighter than OR; both fold left so evaluation runs left to right
fn condition_and(input: &str) -> IResult<&str, Condition> {
    let (input, first) = condition_term(input)?;
    let (input, rest) = many0(preceded(keyword("AND"), condition_term))(input)?;
    let folded = rest
        .into_iter()
        .fold(first, |acc, next| Condition::And(Box::new(acc), Box::new(next)));
    Ok((input, folded))
}

pub fn condition(input: &str) -> IResult<&str, Condition> {
    let (input, first) = condition_and(input)?;
    let (input, rest) = many0(preceded(keyword("OR"), condition_and))(input)?;
    let folded = rest
        .into_iter()
        .fold(first, |acc, next| Condition::Or(Box::new(acc), Box::new(next)));
    Ok((input, folded))
}

// Parse aggregate functions: COUNT(*), COUNT(col), SUM(col), AVG(col), MIN(col), MAX(col)
fn aggregate_function(input: &str) -> IResult<&str, AggregateFunction> {
    let column_arg = |name: &'static str| {
        preceded(
            ws(tag_no_case(name)),
            delimited(ws(char('(')), ws(identifier), ws(char(')'))),
        )
    };
    alt((
        map(
            preceded(
                ws(tag_no_case("COUNT")),
                delimited(
                    ws(char('(')),
                    alt((
                        map(ws(char('*')), |_| CountTarget::All),
                        map(ws(identifier), CountTarget::Column),
                    )),
                    ws(char(')')),
                ),
            ),
            AggregateFunction::Count,
        ),
        map(column_arg("SUM"), AggregateFunction::Sum),
        map(column_arg("AVG"), AggregateFunction::Avg),
        map(column_arg("MIN"), AggregateFunction::Min),
        map(column_arg("MAX"), AggregateFunction::Max),
    ))(input)
}

/// Column name or aggregate call, as it appears in HAVING and ORDER BY.
pub fn column_ref(input: &str) -> IResult<&str, String> {
    alt((map(aggregate_function, |f| f.to_string()), identifier))(input)
}

fn alias(input: &str) -> IResult<&str, Option<String>> {
    opt(preceded(keyword("AS"), ws(identifier)))(input)
}

fn select_column(input: &str) -> IResult<&str, SelectColumn> {
    alt((
        map(ws(char('*')), |_| SelectColumn::All),
        map(pair(aggregate_function, alias), |(function, alias)| {
            SelectColumn::Aggregate { function, alias }
        }),
        map(pair(ws(identifier), alias), |(name, alias)| {
            SelectColumn::Regular { name, alias }
        }),
    ))(input)
}

fn identifier_list(input: &str) -> IResult<&str, Vec<String>> {
    separated_list1(ws(char(',')), ws(identifier))(input)
}

fn order_item(input: &str) -> IResult<&str, (String, SortOrder)> {
    pair(
        ws(column_ref),
        map(
            opt(alt((
                constant(SortOrder::Asc, keyword("ASC")),
                constant(SortOrder::Desc, keyword("DESC")),
            ))),
            Option::unwrap_or_default,
        ),
    )(input)
}

/// `LIMIT n`, `LIMIT offset, n` or `LIMIT n OFFSET m`, as (offset, count).
fn limit_clause(input: &str) -> IResult<&str, (Option<usize>, usize)> {
    preceded(
        keyword("LIMIT"),
        alt((
            map(
                separated_pair(ws(unsigned), ws(char(',')), ws(unsigned)),
                |(offset, count)| (Some(offset), count),
            ),
            map(
                separated_pair(ws(unsigned), keyword("OFFSET"), ws(unsigned)),
                |(count, offset)| (Some(offset), count),
            ),
            map(ws(unsigned), |count| (None, count)),
        )),
    )(input)
}

pub fn select(input: &str) -> IResult<&str, Statement> {
    let (input, _) = keyword("SELECT")(input)?;
    let (input, distinct) = map(opt(keyword("DISTINCT")), |d| d.is_some())(input)?;
    let (input, columns) = separated_list1(ws(char(',')), select_column)(input)?;
    let (input, _) = keyword("FROM")(input)?;
    let (input, from) = identifier_list(input)?;
    let (input, filter) = opt(preceded(keyword("WHERE"), condition))(input)?;
    let (input, group_by) = opt(preceded(
        pair(keyword("GROUP"), keyword("BY")),
        identifier_list,
    ))(input)?;
    let (input, having) = opt(preceded(keyword("HAVING"), condition))(input)?;
    let (input, order_by) = opt(preceded(
        pair(keyword("ORDER"), keyword("BY")),
        separated_list1(ws(char(',')), order_item),
    ))(input)?;
    let (input, limit) = opt(limit_clause)(input)?;

    Ok((
        input,
        Statement::Select(SelectStatement {
            distinct,
            columns,
            from,
            filter,
            group_by: group_by.unwrap_or_default(),
            having,
            order_by: order_by.unwrap_or_default(),
            offset: limit.and_then(|(offset, _)| offset),
            limit: limit.map(|(_, count)| count),
        }),
    ))
}
