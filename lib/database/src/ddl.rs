//! DDL construction from caller-supplied names.

use crate::error::DdlError;

/// Longest identifier MySQL accepts.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Checks that `name` is a plain identifier, optionally back-quoted.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_$]*` of at most [`MAX_IDENTIFIER_LEN`]
/// characters.
///
/// # Errors
///
/// Returns [`DdlError::InvalidIdentifier`] naming `kind` otherwise.
pub fn validate_identifier(kind: &'static str, name: &str) -> Result<(), DdlError> {
    let bare = name
        .strip_prefix('`')
        .and_then(|n| n.strip_suffix('`'))
        .unwrap_or(name);

    let mut chars = bare.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            bare.len() <= MAX_IDENTIFIER_LEN
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DdlError::InvalidIdentifier {
            kind,
            value: name.to_string(),
        })
    }
}

/// Checks that a column type cannot end the statement or open a comment.
///
/// # Errors
///
/// Returns [`DdlError::InvalidColumnType`] if it can.
pub fn validate_column_type(column: &str, data_type: &str) -> Result<(), DdlError> {
    let forbidden = [";", "--", "/*", "*/", "#"];
    if data_type.trim().is_empty() || forbidden.iter().any(|f| data_type.contains(f)) {
        return Err(DdlError::InvalidColumnType {
            column: column.to_string(),
            value: data_type.to_string(),
        });
    }
    Ok(())
}

/// Builds `CREATE TABLE {table} ({col} {type}, ...)`.
///
/// Columns keep the order given. With `validate` off, names and types are
/// spliced in unchecked.
///
/// # Errors
///
/// Returns an error if there are no columns, or if `validate` is on and a
/// name or type fails the checks above.
pub fn create_table_statement<'a, I>(
    table: &str,
    columns: I,
    validate: bool,
) -> Result<String, DdlError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if validate {
        validate_identifier("table", table)?;
    }

    let mut clauses = Vec::new();
    for (name, data_type) in columns {
        if validate {
            validate_identifier("column", name)?;
            validate_column_type(name, data_type)?;
        }
        clauses.push(format!("{name} {data_type}"));
    }
    if clauses.is_empty() {
        return Err(DdlError::NoColumns);
    }

    Ok(format!("CREATE TABLE {table} ({})", clauses.join(", ")))
}
