use crate::column::ColumnRef;

/// One element of a WHERE or DO UPDATE SET token stream.
///
/// Tokens render separated by a single space. Raw fragments are trimmed and
/// emitted verbatim: they are the only way to write operators and
/// placeholders (`"= $1"`) and are never escaped or validated, so they must
/// not carry untrusted input. Bind untrusted values through placeholders.
#[derive(Debug, Clone)]
pub enum Token {
    Raw(String),
    Column(ColumnRef),
    Int(i64),
    Bool(bool),
}

/// How column tokens are qualified when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnStyle {
    /// `alias.column`
    Alias,
    /// `column`
    Bare,
    /// `table.column`, by physical table name
    TableName,
}

impl Token {
    pub(crate) fn render(&self, style: ColumnStyle, out: &mut String) {
        match self {
            Token::Raw(fragment) => out.push_str(fragment.trim()),
            Token::Column(column) => match style {
                ColumnStyle::Alias => out.push_str(&column.name_with_alias()),
                ColumnStyle::Bare => out.push_str(column.name_only()),
                ColumnStyle::TableName => {
                    out.push_str(column.table_name());
                    out.push('.');
                    out.push_str(column.name_only());
                }
            },
            Token::Int(v) => out.push_str(&v.to_string()),
            Token::Bool(true) => out.push_str("TRUE"),
            Token::Bool(false) => out.push_str("FALSE"),
        }
    }
}

/// Append every token, each preceded by a space.
pub(crate) fn render_tokens(tokens: &[Token], style: ColumnStyle, out: &mut String) {
    for token in tokens {
        out.push(' ');
        token.render(style, out);
    }
}

impl From<&str> for Token {
    fn from(v: &str) -> Self {
        Token::Raw(v.to_string())
    }
}

impl From<String> for Token {
    fn from(v: String) -> Self {
        Token::Raw(v)
    }
}

impl From<ColumnRef> for Token {
    fn from(v: ColumnRef) -> Self {
        Token::Column(v)
    }
}

impl From<&ColumnRef> for Token {
    fn from(v: &ColumnRef) -> Self {
        Token::Column(v.clone())
    }
}

impl From<bool> for Token {
    fn from(v: bool) -> Self {
        Token::Bool(v)
    }
}

macro_rules! impl_from_int_for_token {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Token {
                fn from(v: $ty) -> Self {
                    Token::Int(v.into())
                }
            }
        )*
    };
}

impl_from_int_for_token!(i8, i16, i32, i64, u8, u16, u32);

/// Build a `Vec<Token>` from mixed raw fragments, columns and literals.
///
/// ```ignore
/// builder.r#where(tokens![t1.col("amount"), "= $1"]).args([100])
/// ```
#[macro_export]
macro_rules! tokens {
    ($($token:expr),* $(,)?) => {
        vec![$($crate::Token::from($token)),*]
    };
}
