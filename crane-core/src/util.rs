use std::collections::HashSet;

/// Writes `values` into `out` with `f`, putting `separator` between the items that produced some output.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Parameter names of a statement binding `bases` once per row, `result[row][i]` binds `bases[i]` of `row`.
///
/// The first row keeps the plain names, row `n` appends `_{n}`. A name already issued (case insensitive) gets
/// another `_{n}` until it is free. Names only depend on the rows before, the first rows of a longer batch are
/// named like a shorter one.
pub fn batch_parameters<S: AsRef<str>>(bases: &[S], rows: usize) -> Vec<Vec<String>> {
    let mut issued = HashSet::new();
    (0..rows.max(1))
        .map(|row| {
            bases
                .iter()
                .map(|base| {
                    let base = base.as_ref();
                    let mut name = if row == 0 {
                        base.to_string()
                    } else {
                        format!("{base}_{row}")
                    };
                    while !issued.insert(name.to_ascii_lowercase()) {
                        name = format!("{name}_{}", row.max(1));
                    }
                    name
                })
                .collect()
        })
        .collect()
}

/// Turns an arbitrary column name into a string usable as a parameter name.
pub fn sanitize_parameter(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[macro_export]
macro_rules! possibly_parenthesized {
    ($buff:ident, $cond:expr, $v:expr) => {
        if $cond {
            $buff.push('(');
            $v;
            $buff.push(')');
        } else {
            $v;
        }
    };
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$query
                .char_indices()
                .map(|(i, _)| i)
                .nth(497)
                .unwrap_or($query.len())]
                .trim_end(),
            if $query.chars().nth(497).is_some() {
                "..."
            } else {
                ""
            },
        )
    };
}
