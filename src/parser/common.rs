use crate::types::Value;
use indexmap::IndexMap;
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while},
    character::complete::{alpha1, char, digit1, multispace0, satisfy},
    combinator::{map, map_res, not, peek, recognize, verify},
    error::{Error, ErrorKind},
    multi::separated_list0,
    number::complete::recognize_float,
    sequence::{delimited, pair, separated_pair, terminated},
    IResult,
};

/// Words that can never be bare identifiers.
pub const RESERVED: &[&str] = &[
    "SELECT", "DISTINCT", "FROM", "WHERE", "AND", "OR", "NOT", "IN", "IS", "NULL", "LIKE",
    "BETWEEN", "GROUP", "BY", "HAVING", "ORDER", "LIMIT", "OFFSET", "AS", "ASC", "DESC",
    "INSERT", "INTO", "VALUES", "UPDATE", "SET", "DELETE", "TRUE", "FALSE",
];

#[must_use]
pub fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(word))
}

pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Case-insensitive keyword that must end at a word boundary.
pub fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    ws(terminated(
        tag_no_case(word),
        not(peek(satisfy(|c: char| c.is_alphanumeric() || c == '_'))),
    ))
}

fn bare_identifier(input: &str) -> IResult<&str, String> {
    map(
        verify(
            recognize(pair(
                alt((alpha1, tag("_"))),
                take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '.'),
            )),
            |s: &str| !is_reserved(s),
        ),
        str::to_string,
    )(input)
}

/// `` `any text` `` with doubled backticks as escapes.
fn quoted_identifier(input: &str) -> IResult<&str, String> {
    quoted(input, '`')
}

pub fn identifier(input: &str) -> IResult<&str, String> {
    alt((quoted_identifier, bare_identifier))(input)
}

fn quoted(input: &str, quote: char) -> IResult<&str, String> {
    let (mut rest, _) = char(quote)(input)?;
    let mut out = String::new();
    loop {
        let Some(pos) = rest.find(quote) else {
            return Err(nom::Err::Error(Error::new(rest, ErrorKind::Char)));
        };
        out.push_str(&rest[..pos]);
        let after = &rest[pos + quote.len_utf8()..];
        match after.strip_prefix(quote) {
            Some(escaped) => {
                out.push(quote);
                rest = escaped;
            }
            None => return Ok((after, out)),
        }
    }
}

/// `'text'`, where `''` stands for a single quote.
pub fn string_literal(input: &str) -> IResult<&str, String> {
    quoted(input, '\'')
}

fn number(input: &str) -> IResult<&str, Value> {
    map_res(recognize_float, |s: &str| -> Result<Value, String> {
        if s.contains(['.', 'e', 'E']) {
            s.parse::<f64>().map(Value::Float).map_err(|e| e.to_string())
        } else {
            match s.parse::<i64>() {
                Ok(i) => Ok(Value::Integer(i)),
                Err(_) => s.parse::<f64>().map(Value::Float).map_err(|e| e.to_string()),
            }
        }
    })(input)
}

fn list(input: &str) -> IResult<&str, Value> {
    map(
        delimited(
            ws(char('[')),
            separated_list0(ws(char(',')), ws(value)),
            ws(char(']')),
        ),
        Value::List,
    )(input)
}

fn object(input: &str) -> IResult<&str, Value> {
    map(
        delimited(
            ws(char('{')),
            separated_list0(
                ws(char(',')),
                separated_pair(ws(string_literal), ws(char(':')), ws(value)),
            ),
            ws(char('}')),
        ),
        |entries| Value::Map(entries.into_iter().collect::<IndexMap<_, _>>()),
    )(input)
}

pub fn value(input: &str) -> IResult<&str, Value> {
    alt((
        map(keyword("NULL"), |_| Value::Null),
        map(keyword("TRUE"), |_| Value::Boolean(true)),
        map(keyword("FALSE"), |_| Value::Boolean(false)),
        map(string_literal, Value::Text),
        number,
        list,
        object,
    ))(input)
}

pub fn unsigned(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>)(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("users rest"), Ok((" rest", "users".to_string())));
        assert_eq!(identifier("t.col"), Ok(("", "t.col".to_string())));
        assert_eq!(identifier("`first name`"), Ok(("", "first name".to_string())));
        assert!(identifier("FROM").is_err());
        assert!(identifier("1abc").is_err());
    }

    #[test]
    fn test_keyword_boundary() {
        assert!(keyword("OR")("order").is_err());
        assert!(keyword("OR")(" or x").is_ok());
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal("'O''Brien' x"), Ok((" x", "O'Brien".to_string())));
        assert_eq!(string_literal("''"), Ok(("", String::new())));
        assert!(string_literal("'open").is_err());
    }

    #[test]
    fn test_values() {
        assert_eq!(value("NULL").unwrap().1, Value::Null);
        assert_eq!(value("true").unwrap().1, Value::Boolean(true));
        assert_eq!(value("-42").unwrap().1, Value::Integer(-42));
        assert_eq!(value("2.5").unwrap().1, Value::Float(2.5));
        assert_eq!(
            value("[1, 'a']").unwrap().1,
            Value::List(vec![Value::Integer(1), Value::from("a")])
        );
        let Value::Map(map) = value("{'k': 1}").unwrap().1 else { panic!("expected map") };
        assert_eq!(map["k"], Value::Integer(1));
    }
}
