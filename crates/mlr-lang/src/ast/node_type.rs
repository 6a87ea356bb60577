use std::fmt;

#[cfg(feature = "ast-json")]
use serde::{Deserialize, Serialize};

macro_rules! node_types {
    ($($variant:ident => $name:literal,)*) => {
        /// Kind tag of a generic syntax-tree node, named as the parser names it.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "ast-json", derive(Serialize, Deserialize))]
        pub enum NodeType {
            $(
                #[cfg_attr(feature = "ast-json", serde(rename = $name))]
                $variant,
            )*
        }

        impl NodeType {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(NodeType::$variant => $name,)*
                }
            }
        }
    };
}

node_types! {
    // Literals and leaves
    StringLiteral => "string literal",
    IntLiteral => "int literal",
    FloatLiteral => "float literal",
    BooleanLiteral => "boolean literal",
    ArrayLiteral => "array literal",
    MapLiteral => "map literal",
    MapLiteralKeyValuePair => "map-literal key-value pair",
    ContextVariable => "context variable",
    Constant => "mathematical constant",
    LocalVariable => "local variable",
    TypeDeclaration => "type declaration",

    // Access
    ArrayOrMapIndexAccess => "array or map index access",
    ArraySliceAccess => "array-slice access",
    ArraySliceEmptyLowerIndex => "array-slice empty lower index",
    ArraySliceEmptyUpperIndex => "array-slice empty upper index",
    DirectFieldValue => "direct field value",
    IndirectFieldValue => "indirect field value",
    PositionalFieldName => "positional field name",
    PositionalFieldValue => "positional field value",
    FullRecord => "full record",
    DirectOosvarValue => "direct oosvar value",
    IndirectOosvarValue => "indirect oosvar value",
    FullOosvar => "full oosvar",
    EnvironmentVariable => "environment variable",

    // Calls
    Operator => "operator",
    DotOperator => "dot operator",
    FunctionCallsite => "function callsite",

    // Statements
    StatementBlock => "statement block",
    Assignment => "assignment",
    OperatorAssignment => "operator assignment",
    LocalVariableDefinition => "local variable definition",
    Unset => "unset statement",
    BareBoolean => "bare boolean",
    FilterStatement => "filter statement",
    PatternActionBlock => "pattern-action block",
    IfChain => "if chain",
    IfItem => "if item",
    WhileLoop => "while loop",
    DoWhileLoop => "do-while loop",
    SingleVariableForLoop => "single-variable for-loop",
    KeyValueForLoop => "key-value for-loop",
    TripleForLoop => "triple-for loop",
    Break => "break",
    Continue => "continue",
    NamedFunctionDefinition => "named function definition",
    ParameterList => "parameter list",
    Parameter => "parameter",
    ReturnType => "return type",
    Return => "return",
    BeginBlock => "begin block",
    EndBlock => "end block",
    Print => "print statement",
    Printn => "printn statement",
    Eprint => "eprint statement",
    Emit => "emit statement",
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
