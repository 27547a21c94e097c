use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpType {
    Negative,
    Not,
}

impl Display for UnaryOpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOpType::Negative => "-",
            UnaryOpType::Not => "!",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpType {
    Multiplication,
    Division,
    Remainder,
    Addition,
    Subtraction,
    ShiftLeft,
    ShiftRight,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOpType {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOpType::Equal
                | BinaryOpType::NotEqual
                | BinaryOpType::Less
                | BinaryOpType::Greater
                | BinaryOpType::LessEqual
                | BinaryOpType::GreaterEqual
        )
    }
}

impl Display for BinaryOpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOpType::Multiplication => "*",
            BinaryOpType::Division => "/",
            BinaryOpType::Remainder => "%",
            BinaryOpType::Addition => "+",
            BinaryOpType::Subtraction => "-",
            BinaryOpType::ShiftLeft => "<<",
            BinaryOpType::ShiftRight => ">>",
            BinaryOpType::BitwiseAnd => "&",
            BinaryOpType::BitwiseOr => "|",
            BinaryOpType::BitwiseXor => "^",
            BinaryOpType::Equal => "==",
            BinaryOpType::NotEqual => "!=",
            BinaryOpType::Less => "<",
            BinaryOpType::Greater => ">",
            BinaryOpType::LessEqual => "<=",
            BinaryOpType::GreaterEqual => ">=",
            BinaryOpType::And => "&&",
            BinaryOpType::Or => "||",
        })
    }
}
