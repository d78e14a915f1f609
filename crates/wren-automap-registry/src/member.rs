//! One bound member: its signature, its source fragment and its trampoline.

use wren_automap_core::{
    CallContext, DeclForm, Declaration, MemberKind, NativeError, NativeFn, Signature,
};

use crate::error::RegistrationError;

/// A constructor, method, accessor or operator of a foreign class.
///
/// Immutable once built; the fragment and the signature both come from the
/// same parsed [`Declaration`].
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    kind: MemberKind,
    signature: Signature,
    source: String,
    is_static: bool,
    arity: usize,
    native: NativeFn,
}

impl MemberDescriptor {
    /// Describe a non-constructor member.
    ///
    /// `arity` is the number of arguments the bound callable reads. It must
    /// agree with the declaration unless the declaration is a bare name.
    pub fn new(
        decl: &Declaration,
        arity: usize,
        is_static: bool,
        native: NativeFn,
    ) -> Result<Self, RegistrationError> {
        if let Some(expected) = decl.declared_arity() {
            if expected != arity {
                return Err(RegistrationError::ArityMismatch {
                    decl: decl.text.clone(),
                    expected,
                    actual: arity,
                });
            }
        }

        let kind = decl.kind(arity);
        if is_static && kind.is_operator() {
            return Err(RegistrationError::StaticOperator {
                decl: decl.text.clone(),
            });
        }

        let body = Self::body(decl, arity);
        let source = if is_static {
            format!("foreign static {}", body)
        } else {
            format!("foreign {}", body)
        };

        Ok(Self {
            kind,
            signature: decl.signature(arity),
            source,
            is_static,
            arity,
            native,
        })
    }

    /// Describe a constructor.
    ///
    /// Constructors are named like methods (`new`, `new(x, y)`, `fromList(items)`)
    /// and emitted as `construct` declarations with an empty body; the
    /// allocator does the actual work.
    pub fn constructor(
        decl: &Declaration,
        arity: usize,
        native: NativeFn,
    ) -> Result<Self, RegistrationError> {
        if !matches!(decl.form, DeclForm::Bare { .. } | DeclForm::Call { .. }) {
            return Err(RegistrationError::InvalidConstructor {
                decl: decl.text.clone(),
            });
        }
        if let Some(expected) = decl.declared_arity() {
            if expected != arity {
                return Err(RegistrationError::ArityMismatch {
                    decl: decl.text.clone(),
                    expected,
                    actual: arity,
                });
            }
        }

        let source = format!(
            "construct {}({}) {{ }}",
            decl.name(),
            decl.param_names(arity).join(", ")
        );

        Ok(Self {
            kind: MemberKind::Constructor,
            signature: decl.constructor_signature(arity),
            source,
            is_static: false,
            arity,
            native,
        })
    }

    fn body(decl: &Declaration, arity: usize) -> String {
        let params = decl.param_names(arity).join(", ");
        match &decl.form {
            DeclForm::Bare { name } if arity == 0 => name.clone(),
            DeclForm::Bare { name } | DeclForm::Call { name, .. } => {
                format!("{}({})", name, params)
            }
            DeclForm::Setter { name, param } => format!("{}=({})", name, param),
            DeclForm::Subscript { .. } => format!("[{}]", params),
            DeclForm::SubscriptSetter { params, value } => {
                format!("[{}]=({})", params.join(", "), value)
            }
            DeclForm::Infix { op, param } => format!("{}({})", op, param),
            DeclForm::Prefix { op } => op.clone(),
        }
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The member's line in the generated class body.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// The trampoline handed to the VM.
    pub fn trampoline(&self) -> NativeFn {
        self.native.clone()
    }

    /// Run the trampoline directly.
    pub fn invoke(&self, ctx: &mut CallContext) -> Result<(), NativeError> {
        self.native.call(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> NativeFn {
        NativeFn::new(|_: &mut CallContext| Ok(()))
    }

    fn member(decl: &str, arity: usize, is_static: bool) -> MemberDescriptor {
        let decl = Declaration::parse(decl).unwrap();
        MemberDescriptor::new(&decl, arity, is_static, noop()).unwrap()
    }

    #[test]
    fn method_fragment_and_signature() {
        let m = member("foo(a)", 1, false);
        assert_eq!(m.source(), "foreign foo(a)");
        assert_eq!(m.signature().as_str(), "foo(_)");
        assert_eq!(m.kind(), MemberKind::Method);
    }

    #[test]
    fn bare_name_is_getter_at_zero_arity() {
        let m = member("count", 0, false);
        assert_eq!(m.source(), "foreign count");
        assert_eq!(m.signature().as_str(), "count");
        assert_eq!(m.kind(), MemberKind::Getter);
    }

    #[test]
    fn bare_name_with_arguments_gets_positional_names() {
        let m = member("lerp", 2, true);
        assert_eq!(m.source(), "foreign static lerp(arg0, arg1)");
        assert_eq!(m.signature().as_str(), "lerp(_,_)");
    }

    #[test]
    fn explicit_empty_call() {
        let m = member("reset()", 0, false);
        assert_eq!(m.source(), "foreign reset()");
        assert_eq!(m.signature().as_str(), "reset()");
    }

    #[test]
    fn accessor_and_operator_fragments() {
        assert_eq!(member("x=(value)", 1, false).source(), "foreign x=(value)");
        assert_eq!(member("[i, j]", 2, false).source(), "foreign [i, j]");
        assert_eq!(member("[i]=(v)", 2, false).source(), "foreign [i]=(v)");
        assert_eq!(member("+(other)", 1, false).source(), "foreign +(other)");
        assert_eq!(member("-", 0, false).source(), "foreign -");
    }

    #[test]
    fn arity_mismatch() {
        let decl = Declaration::parse("foo(a, b)").unwrap();
        let err = MemberDescriptor::new(&decl, 1, false, noop()).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::ArityMismatch {
                decl: "foo(a, b)".into(),
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn static_operator_rejected() {
        let decl = Declaration::parse("*(other)").unwrap();
        assert!(matches!(
            MemberDescriptor::new(&decl, 1, true, noop()),
            Err(RegistrationError::StaticOperator { .. })
        ));
    }

    #[test]
    fn constructor_fragment() {
        let decl = Declaration::parse("new(x, y)").unwrap();
        let c = MemberDescriptor::constructor(&decl, 2, noop()).unwrap();
        assert_eq!(c.source(), "construct new(x, y) { }");
        assert_eq!(c.signature().as_str(), "init new(_,_)");
        assert_eq!(c.kind(), MemberKind::Constructor);

        let decl = Declaration::parse("new").unwrap();
        let c = MemberDescriptor::constructor(&decl, 0, noop()).unwrap();
        assert_eq!(c.source(), "construct new() { }");
    }

    #[test]
    fn constructor_must_be_named() {
        let decl = Declaration::parse("+(other)").unwrap();
        assert!(matches!(
            MemberDescriptor::constructor(&decl, 1, noop()),
            Err(RegistrationError::InvalidConstructor { .. })
        ));
    }
}
