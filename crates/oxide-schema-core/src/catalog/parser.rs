//! Parsers for stored `CREATE TABLE` and `CREATE INDEX` statements.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::cursor::{split_top_level, Cursor};
use super::ParseError;
use crate::item::Named;
use crate::model::{Column, Constraint, Index, Table};

static WITHOUT_TIME_ZONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s+without\s+time\s+zone\b").expect("valid time zone pattern")
});
static WITH_TIME_ZONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s+with\s+time\s+zone\b").expect("valid time zone pattern")
});
static ARRAY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*\[\s*\])+").expect("valid array pattern"));

/// Parses a stored `CREATE TABLE` statement into a table descriptor.
///
/// # Errors
///
/// Returns a [`ParseError`] for the first construct that cannot be read.
/// No partial table is returned.
pub fn parse_create_table(sql: &str) -> Result<Table, ParseError> {
    let mut cursor = Cursor::new(sql);
    cursor.expect_keyword("CREATE", "create table")?;
    if !cursor.eat_keyword("TEMP") {
        cursor.eat_keyword("TEMPORARY");
    }
    cursor.expect_keyword("TABLE", "create table")?;
    skip_if_not_exists(&mut cursor)?;
    let name = cursor.name("table name")?;

    let Some((offset, body)) = cursor.enclosed('(', ')')? else {
        return Err(cursor.error("column list", "expected '(' after table name"));
    };

    let mut table = Table::new(name.clone());
    for (start, part) in split_top_level(body) {
        if part.trim().is_empty() {
            continue;
        }
        let mut part_cursor = Cursor::with_offset(part, offset + start);
        if is_table_constraint(&mut part_cursor) {
            table = table.with_constraint(parse_constraint(&mut part_cursor, &name)?);
        } else {
            table = table.with_column(parse_column(&mut part_cursor)?);
        }
    }

    table.normalize_rowid_alias();
    Ok(table)
}

/// Parses a stored `CREATE [UNIQUE] INDEX` statement into an index
/// descriptor.
///
/// # Errors
///
/// Returns a [`ParseError`] if the statement is not a plain index over
/// named columns.
pub fn parse_create_index(sql: &str) -> Result<Index, ParseError> {
    let mut cursor = Cursor::new(sql);
    cursor.expect_keyword("CREATE", "create index")?;
    let unique = cursor.eat_keyword("UNIQUE");
    cursor.expect_keyword("INDEX", "create index")?;
    skip_if_not_exists(&mut cursor)?;
    let name = cursor.name("index name")?;
    cursor.expect_keyword("ON", "create index")?;
    let table = cursor.name("indexed table")?;

    let columns = name_list(&mut cursor, "indexed columns")?;
    Ok(Index::new(name).on(table, columns).with_unique(unique))
}

fn skip_if_not_exists(cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
    if cursor.eat_keyword("IF") {
        cursor.expect_keyword("NOT", "if not exists")?;
        cursor.expect_keyword("EXISTS", "if not exists")?;
    }
    Ok(())
}

fn is_table_constraint(cursor: &mut Cursor<'_>) -> bool {
    let word = cursor.peek_word();
    ["CONSTRAINT", "PRIMARY", "FOREIGN", "UNIQUE", "CHECK"]
        .iter()
        .any(|k| word.eq_ignore_ascii_case(k))
}

/// Reads `(<name>, ...)`, ignoring anything after each name.
fn name_list(cursor: &mut Cursor<'_>, matcher: &'static str) -> Result<Vec<String>, ParseError> {
    let Some((offset, inner)) = cursor.enclosed('(', ')')? else {
        return Err(cursor.error(matcher, "expected '('"));
    };
    let mut names = Vec::new();
    for (start, part) in split_top_level(inner) {
        let mut part_cursor = Cursor::with_offset(part, offset + start);
        names.push(part_cursor.name(matcher)?);
    }
    Ok(names)
}

fn single_name(cursor: &mut Cursor<'_>, matcher: &'static str) -> Result<String, ParseError> {
    let position = cursor.position();
    let mut names = name_list(cursor, matcher)?;
    if names.len() != 1 {
        return Err(ParseError::new(
            matcher,
            format!("expected one column, found {}", names.len()),
            position,
        ));
    }
    Ok(names.remove(0))
}

fn parse_constraint(cursor: &mut Cursor<'_>, table: &str) -> Result<Constraint, ParseError> {
    let name = if cursor.eat_keyword("CONSTRAINT") {
        Some(cursor.name("constraint name")?)
    } else {
        None
    };

    let keyword = cursor.word().to_ascii_uppercase();
    let constraint = match keyword.as_str() {
        "PRIMARY" => {
            cursor.expect_keyword("KEY", "primary key")?;
            let columns = name_list(cursor, "primary key columns")?;
            Constraint::primary_key(table, columns)
        }
        "UNIQUE" => {
            let column = single_name(cursor, "unique column")?;
            Constraint::unique_key(table, column)
        }
        "FOREIGN" => {
            cursor.expect_keyword("KEY", "foreign key")?;
            let column = single_name(cursor, "foreign key column")?;
            cursor.expect_keyword("REFERENCES", "foreign key")?;
            let ref_table = cursor.name("referenced table")?;
            let ref_column = single_name(cursor, "referenced column")?;
            Constraint::foreign_key(table, column, ref_table, ref_column)
        }
        _ => {
            return Err(cursor.error(
                "constraint kind",
                format!("unsupported constraint '{keyword}'"),
            ))
        }
    };

    Ok(match name {
        Some(name) => rename_constraint(constraint, name),
        None => constraint,
    })
}

fn rename_constraint(constraint: Constraint, name: String) -> Constraint {
    match constraint {
        Constraint::PrimaryKey { columns, .. } => Constraint::PrimaryKey { name, columns },
        Constraint::UniqueKey { column, .. } => Constraint::UniqueKey { name, column },
        Constraint::ForeignKey {
            column,
            ref_table,
            ref_column,
            ..
        } => Constraint::ForeignKey {
            name,
            column,
            ref_table,
            ref_column,
        },
    }
}

fn parse_column(cursor: &mut Cursor<'_>) -> Result<Column, ParseError> {
    let name = cursor.name("column name")?;
    let data_type = parse_type_name(cursor)?;
    let mut column = Column::new(name, data_type).with_nullable(true);

    loop {
        let mark = cursor.mark();
        let word = cursor.word().to_ascii_uppercase();
        match word.as_str() {
            "NULL" => column = column.with_nullable(true),
            "NOT" => {
                cursor.expect_keyword("NULL", "not null")?;
                column = column.with_nullable(false);
            }
            "DEFAULT" => column = column.with_default(cursor.value()?),
            _ => {
                cursor.reset(mark);
                break;
            }
        }
    }

    if !cursor.is_at_end() {
        debug!(
            column = column.name(),
            rest = cursor.rest().trim(),
            "Ignoring column constraint text"
        );
    }
    Ok(column)
}

/// Reads a type name, normalizing the multi-word forms.
fn parse_type_name(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let base = cursor
        .name("type name")
        .map_err(|e| ParseError::new("type name", "column type not specified", e.position))?;
    let lower = base.to_ascii_lowercase();

    let data_type = match lower.as_str() {
        "character" | "bit" => {
            let mark = cursor.mark();
            if cursor.word().eq_ignore_ascii_case("varying") {
                cursor.enclosed('(', ')')?;
                format!("{lower} varying")
            } else {
                cursor.reset(mark);
                cursor.enclosed('(', ')')?;
                base
            }
        }
        "double" => {
            cursor.expect_keyword("PRECISION", "double precision")?;
            cursor.enclosed('(', ')')?;
            "double precision".to_string()
        }
        "time" | "timestamp" => {
            if cursor.enclosed('(', ')')?.is_some() {
                debug!(data_type = %lower, "Ignoring precision");
            }
            if cursor.regex(&WITHOUT_TIME_ZONE).is_some() {
                lower
            } else if cursor.regex(&WITH_TIME_ZONE).is_some() {
                format!("{lower}tz")
            } else {
                lower
            }
        }
        "numeric" | "interval" => {
            cursor.enclosed('(', ')')?;
            lower
        }
        _ => {
            cursor.enclosed('(', ')')?;
            match cursor.regex(&ARRAY_SUFFIX) {
                Some(suffix) => {
                    let dimensions = suffix.matches('[').count();
                    format!("{base}{}", "[]".repeat(dimensions))
                }
                None => base,
            }
        }
    };
    Ok(data_type)
}
