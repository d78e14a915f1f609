//! Member declarations and the signatures the VM binds them by.
//!
//! Wren identifies a foreign method by a signature string built from the
//! member's name and shape, not its parameter types:
//!
//! ```text
//! foo(a, b)     -> foo(_,_)
//! foo           -> foo            (getter)
//! foo=(value)   -> foo=(_)        (setter)
//! [i, j]        -> [_,_]          (subscript getter)
//! [i]=(value)   -> [_]=(_)        (subscript setter)
//! +(other)      -> +(_)           (infix operator)
//! -             -> -              (prefix operator)
//! new(a, b)     -> init new(_,_)  (constructor)
//! ```
//!
//! A [`Declaration`] is parsed from the member's source form; its signature
//! is derived from that form, so what gets emitted and what gets bound can
//! never drift apart.

use std::borrow::Borrow;
use std::fmt;

use crate::error::DeclarationError;

/// Operators usable with one operand.
pub const INFIX_OPERATORS: &[&str] = &[
    "...", "..", "<<", ">>", "<=", ">=", "==", "!=", "+", "-", "*", "/", "%", "<", ">", "&",
    "|", "^", "is",
];

/// Operators usable without operands.
pub const PREFIX_OPERATORS: &[&str] = &["-", "!", "~"];

/// A method signature as the VM spells it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(String);

impl Signature {
    fn placeholders(arity: usize) -> String {
        vec!["_"; arity].join(",")
    }

    /// `name(_,_)`
    pub fn method(name: &str, arity: usize) -> Self {
        Self(format!("{}({})", name, Self::placeholders(arity)))
    }

    /// `name`
    pub fn getter(name: &str) -> Self {
        Self(name.to_string())
    }

    /// `name=(_)`
    pub fn setter(name: &str) -> Self {
        Self(format!("{}=(_)", name))
    }

    /// `[_,_]`
    pub fn subscript_getter(arity: usize) -> Self {
        Self(format!("[{}]", Self::placeholders(arity)))
    }

    /// `[_]=(_)`; `arity` counts the index parameters only.
    pub fn subscript_setter(arity: usize) -> Self {
        Self(format!("[{}]=(_)", Self::placeholders(arity)))
    }

    /// `+(_)`
    pub fn infix(op: &str) -> Self {
        Self(format!("{}(_)", op))
    }

    /// `-`
    pub fn prefix(op: &str) -> Self {
        Self(op.to_string())
    }

    /// `init new(_,_)`
    pub fn constructor(name: &str, arity: usize) -> Self {
        Self(format!("init {}", Self::method(name, arity).0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Signature {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Signature {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Shape of a member as it appears in a class body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Constructor,
    Method,
    Getter,
    Setter,
    SubscriptGetter,
    SubscriptSetter,
    InfixOperator,
    PrefixOperator,
}

impl MemberKind {
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            MemberKind::InfixOperator
                | MemberKind::PrefixOperator
                | MemberKind::SubscriptGetter
                | MemberKind::SubscriptSetter
        )
    }
}

/// Parsed form of a member declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclForm {
    /// `name`: a getter or, with parameters supplied by the callable, a call
    Bare { name: String },
    /// `name(a, b)`
    Call { name: String, params: Vec<String> },
    /// `name=(value)`
    Setter { name: String, param: String },
    /// `[i, j]`
    Subscript { params: Vec<String> },
    /// `[i]=(value)`
    SubscriptSetter { params: Vec<String>, value: String },
    /// `+(other)`
    Infix { op: String, param: String },
    /// `-`
    Prefix { op: String },
}

/// A member declaration written in the VM's own member syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub text: String,
    pub form: DeclForm,
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Declaration {
    /// Parse a member declaration.
    pub fn parse(decl: &str) -> Result<Self, DeclarationError> {
        let text = decl.trim();
        if text.is_empty() {
            return Err(DeclarationError::Empty);
        }

        let form = if text.starts_with('[') {
            Self::parse_subscript(text)?
        } else if let Some(op) = Self::leading_operator(text) {
            Self::parse_operator(text, op)?
        } else {
            Self::parse_named(text)?
        };

        Ok(Self {
            text: text.to_string(),
            form,
        })
    }

    fn leading_operator(text: &str) -> Option<&'static str> {
        // `is` is only an operator when nothing identifier-like follows it
        let symbolic = INFIX_OPERATORS
            .iter()
            .chain(PREFIX_OPERATORS)
            .filter(|op| **op != "is")
            .copied()
            .filter(|op| text.starts_with(op))
            .max_by_key(|op| op.len());
        if symbolic.is_some() {
            return symbolic;
        }
        let rest = text.strip_prefix("is")?;
        match rest.chars().next() {
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => None,
            _ => Some("is"),
        }
    }

    fn parse_params(decl: &str, inner: &str) -> Result<Vec<String>, DeclarationError> {
        let inner = inner.trim();
        if inner.is_empty() {
            return Ok(Vec::new());
        }
        inner
            .split(',')
            .map(|p| {
                let p = p.trim();
                if is_identifier(p) {
                    Ok(p.to_string())
                } else {
                    Err(DeclarationError::InvalidParameter {
                        decl: decl.to_string(),
                        name: p.to_string(),
                    })
                }
            })
            .collect()
    }

    /// Split `(...)rest` into the parenthesised contents and what follows.
    fn parens<'a>(decl: &str, text: &'a str) -> Result<(&'a str, &'a str), DeclarationError> {
        let body = text
            .strip_prefix('(')
            .ok_or_else(|| DeclarationError::Unbalanced {
                decl: decl.to_string(),
            })?;
        let close = body.find(')').ok_or_else(|| DeclarationError::Unbalanced {
            decl: decl.to_string(),
        })?;
        Ok((&body[..close], &body[close + 1..]))
    }

    fn expect_end(decl: &str, rest: &str) -> Result<(), DeclarationError> {
        if rest.trim().is_empty() {
            Ok(())
        } else {
            Err(DeclarationError::TrailingInput {
                decl: decl.to_string(),
                rest: rest.trim().to_string(),
            })
        }
    }

    fn single_param(decl: &str, inner: &str) -> Result<String, DeclarationError> {
        let mut params = Self::parse_params(decl, inner)?;
        if params.len() != 1 {
            return Err(DeclarationError::SetterArity {
                decl: decl.to_string(),
            });
        }
        Ok(params.remove(0))
    }

    fn parse_subscript(text: &str) -> Result<DeclForm, DeclarationError> {
        let body = &text[1..];
        let close = body.find(']').ok_or_else(|| DeclarationError::Unbalanced {
            decl: text.to_string(),
        })?;
        let params = Self::parse_params(text, &body[..close])?;
        if params.is_empty() {
            return Err(DeclarationError::OperatorArity {
                decl: text.to_string(),
            });
        }

        let rest = body[close + 1..].trim_start();
        if let Some(after_eq) = rest.strip_prefix('=') {
            let (inner, tail) = Self::parens(text, after_eq.trim_start())?;
            Self::expect_end(text, tail)?;
            let value = Self::single_param(text, inner)?;
            Ok(DeclForm::SubscriptSetter { params, value })
        } else {
            Self::expect_end(text, rest)?;
            Ok(DeclForm::Subscript { params })
        }
    }

    fn parse_operator(text: &str, op: &'static str) -> Result<DeclForm, DeclarationError> {
        let rest = text[op.len()..].trim_start();
        if rest.is_empty() {
            if PREFIX_OPERATORS.contains(&op) {
                return Ok(DeclForm::Prefix { op: op.to_string() });
            }
            return Err(DeclarationError::OperatorArity {
                decl: text.to_string(),
            });
        }

        if !INFIX_OPERATORS.contains(&op) {
            return Err(DeclarationError::OperatorArity {
                decl: text.to_string(),
            });
        }
        let (inner, tail) = Self::parens(text, rest)?;
        Self::expect_end(text, tail)?;
        let params = Self::parse_params(text, inner)?;
        match <[String; 1]>::try_from(params) {
            Ok([param]) => Ok(DeclForm::Infix {
                op: op.to_string(),
                param,
            }),
            Err(_) => Err(DeclarationError::OperatorArity {
                decl: text.to_string(),
            }),
        }
    }

    fn parse_named(text: &str) -> Result<DeclForm, DeclarationError> {
        let end = text
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(text.len());
        let name = &text[..end];
        if !is_identifier(name) {
            return Err(DeclarationError::InvalidName {
                name: name.to_string(),
            });
        }
        let name = name.to_string();
        let rest = text[end..].trim_start();

        if rest.is_empty() {
            return Ok(DeclForm::Bare { name });
        }
        if let Some(after_eq) = rest.strip_prefix('=') {
            let (inner, tail) = Self::parens(text, after_eq.trim_start())?;
            Self::expect_end(text, tail)?;
            let param = Self::single_param(text, inner)?;
            return Ok(DeclForm::Setter { name, param });
        }

        let (inner, tail) = Self::parens(text, rest)?;
        Self::expect_end(text, tail)?;
        let params = Self::parse_params(text, inner)?;
        Ok(DeclForm::Call { name, params })
    }

    /// Member name; operators and subscripts report their symbol.
    pub fn name(&self) -> &str {
        match &self.form {
            DeclForm::Bare { name }
            | DeclForm::Call { name, .. }
            | DeclForm::Setter { name, .. } => name,
            DeclForm::Subscript { .. } | DeclForm::SubscriptSetter { .. } => "[]",
            DeclForm::Infix { op, .. } | DeclForm::Prefix { op } => op,
        }
    }

    /// Number of values the member receives, if the declaration fixes it.
    ///
    /// A bare name leaves the arity to the bound callable.
    pub fn declared_arity(&self) -> Option<usize> {
        match &self.form {
            DeclForm::Bare { .. } => None,
            DeclForm::Call { params, .. } => Some(params.len()),
            DeclForm::Setter { .. } | DeclForm::Infix { .. } => Some(1),
            DeclForm::Subscript { params } => Some(params.len()),
            DeclForm::SubscriptSetter { params, .. } => Some(params.len() + 1),
            DeclForm::Prefix { .. } => Some(0),
        }
    }

    /// Kind of member this declaration produces for a callable of `arity`.
    pub fn kind(&self, arity: usize) -> MemberKind {
        match &self.form {
            DeclForm::Bare { .. } if arity == 0 => MemberKind::Getter,
            DeclForm::Bare { .. } | DeclForm::Call { .. } => MemberKind::Method,
            DeclForm::Setter { .. } => MemberKind::Setter,
            DeclForm::Subscript { .. } => MemberKind::SubscriptGetter,
            DeclForm::SubscriptSetter { .. } => MemberKind::SubscriptSetter,
            DeclForm::Infix { .. } => MemberKind::InfixOperator,
            DeclForm::Prefix { .. } => MemberKind::PrefixOperator,
        }
    }

    /// Parameter names for a callable of `arity`.
    ///
    /// Bare names get positional `arg0, arg1, ...`; they are cosmetic, only
    /// the count reaches the signature.
    pub fn param_names(&self, arity: usize) -> Vec<String> {
        match &self.form {
            DeclForm::Bare { .. } => (0..arity).map(|i| format!("arg{}", i)).collect(),
            DeclForm::Call { params, .. } | DeclForm::Subscript { params } => params.clone(),
            DeclForm::Setter { param, .. } | DeclForm::Infix { param, .. } => {
                vec![param.clone()]
            }
            DeclForm::SubscriptSetter { params, value } => {
                let mut all = params.clone();
                all.push(value.clone());
                all
            }
            DeclForm::Prefix { .. } => Vec::new(),
        }
    }

    /// Signature the VM will ask for when calling this member.
    pub fn signature(&self, arity: usize) -> Signature {
        match &self.form {
            DeclForm::Bare { name } if arity == 0 => Signature::getter(name),
            DeclForm::Bare { name } => Signature::method(name, arity),
            DeclForm::Call { name, params } => Signature::method(name, params.len()),
            DeclForm::Setter { name, .. } => Signature::setter(name),
            DeclForm::Subscript { params } => Signature::subscript_getter(params.len()),
            DeclForm::SubscriptSetter { params, .. } => Signature::subscript_setter(params.len()),
            DeclForm::Infix { op, .. } => Signature::infix(op),
            DeclForm::Prefix { op } => Signature::prefix(op),
        }
    }

    /// Constructor signature for this declaration.
    ///
    /// Constructors always use the call form, even with no parameters.
    pub fn constructor_signature(&self, arity: usize) -> Signature {
        Signature::constructor(self.name(), arity)
    }
}
