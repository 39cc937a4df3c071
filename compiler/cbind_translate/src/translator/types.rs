//! Raw type expressions to model type references.

use cbind_ir::{ConstValue, Scalar, Signature, TypeRef};

use super::Translator;
use crate::consts::eval_text;
use crate::ctype::{parse_type, BaseSpec, CType};

impl Translator {
    /// Parse and resolve a raw type expression.
    ///
    /// The error is a message for a skipped-declaration diagnostic.
    pub(super) fn resolve_type_text(&self, text: &str) -> Result<TypeRef, String> {
        let ctype = parse_type(text).map_err(|err| err.to_string())?;
        self.resolve_ctype(&ctype)
    }

    fn resolve_ctype(&self, ctype: &CType) -> Result<TypeRef, String> {
        match ctype {
            CType::Base { spec, .. } => self.resolve_base(spec),
            CType::Pointer { to, .. } => {
                if let CType::Function { .. } = **to {
                    return self.resolve_ctype(to);
                }
                Ok(TypeRef::pointer(self.resolve_ctype(to)?, pointee_const(to)))
            }
            CType::Array { elem, len } => {
                let len = match len {
                    Some(text) => Some(self.array_len(text)?),
                    None => None,
                };
                Ok(TypeRef::array(self.resolve_ctype(elem)?, len))
            }
            CType::Function {
                ret,
                params,
                variadic,
            } => {
                let params = params
                    .iter()
                    .map(|p| self.resolve_ctype(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypeRef::Func(Box::new(Signature {
                    ret: self.resolve_ctype(ret)?,
                    params,
                    variadic: *variadic,
                })))
            }
        }
    }

    fn resolve_base(&self, spec: &BaseSpec) -> Result<TypeRef, String> {
        match spec {
            BaseSpec::Void => Ok(TypeRef::Void),
            BaseSpec::Words(words) => Scalar::from_words(words.iter().map(String::as_str))
                .map(TypeRef::Scalar)
                .ok_or_else(|| format!("unsupported scalar `{}`", words.join(" "))),
            BaseSpec::Tagged { keyword, tag } => {
                let key = format!("{keyword} {tag}");
                Ok(match self.model.lookup(&key) {
                    Some(id) => TypeRef::Decl(id),
                    None => TypeRef::Unresolved(key),
                })
            }
            BaseSpec::Named(name) => Ok(match self.model.lookup(name) {
                Some(id) => TypeRef::Decl(id),
                None => match Scalar::from_words([name.as_str()]) {
                    Some(scalar) => TypeRef::Scalar(scalar),
                    None => TypeRef::Unresolved(name.clone()),
                },
            }),
        }
    }

    fn array_len(&self, text: &str) -> Result<u64, String> {
        match eval_text(text, &self.known) {
            Ok(ConstValue::Int(len)) => {
                u64::try_from(len).map_err(|_| format!("negative array length `{text}`"))
            }
            Ok(_) => Err(format!("non-integer array length `{text}`")),
            Err(err) => Err(format!("array length `{text}`: {err}")),
        }
    }
}

/// Whether the pointed-to type is const-qualified.
fn pointee_const(to: &CType) -> bool {
    match to {
        CType::Base { is_const, .. } | CType::Pointer { is_const, .. } => *is_const,
        CType::Array { .. } | CType::Function { .. } => false,
    }
}
