use crate::ast::Expr;
use crate::lexer::Position;

/// A compiled unit: the wrapped query and its helper members.
#[derive(Debug, Clone)]
pub struct Unit {
    /// Unit name from the `unit Name { ... }` header
    pub name: String,

    /// Members in declaration order
    pub members: Vec<Member>,
}

/// Top-level member of a unit.
#[derive(Debug, Clone)]
pub enum Member {
    /// Helper function (the entry point is one of these)
    Function(FnDecl),

    /// Field initialised when the unit is loaded
    Field(FieldDecl),

    /// Record type declaration
    Record(RecordDecl),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Function(f) => &f.name,
            Member::Field(f) => &f.name,
            Member::Record(r) => &r.name,
        }
    }

    pub fn pos(&self) -> Position {
        match self {
            Member::Function(f) => f.pos,
            Member::Field(f) => f.pos,
            Member::Record(r) => r.pos,
        }
    }
}

/// Function declaration.
///
/// # Examples
/// ```text
/// fn is_blank(l) = l.trim().len() == 0;
/// fn label(l) { return "[" + l + "]"; }
/// ```
#[derive(Debug, Clone)]
pub struct FnDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
    pub pos: Position,
}

/// Field declaration.
///
/// # Example
/// ```text
/// let limit = 80;
/// ```
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub value: Expr,
    pub pos: Position,
}

/// Record type declaration.
///
/// # Example
/// ```text
/// record Entry(level, text) {
///     fn display(self) = "[" + self.level + "] " + self.text;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RecordDecl {
    pub name: String,
    pub fields: Vec<String>,
    pub methods: Vec<FnDecl>,
    pub pos: Position,
}

impl RecordDecl {
    pub fn method(&self, name: &str) -> Option<&FnDecl> {
        self.methods.iter().find(|m| m.name == name)
    }
}
