//! Decides which parameter positions play the streaming `dst` and `src`
//! roles, by name-then-type rules.

use crate::classify::Classifier;
use crate::types::Signature;

/// `src`/`dst` positions into the parameter tuple. Both absent, or `src`
/// present with `dst` optionally alongside; `dst` never binds alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleAssignment {
    pub dst: Option<usize>,
    pub src: Option<usize>,
}

impl RoleAssignment {
    pub fn bound(&self) -> bool {
        self.src.is_some()
    }
}

/// Scans parameters left to right. A parameter named `dst` whose type has a
/// destination handler takes the `dst` role (the last such position wins);
/// otherwise the first position whose type has a source handler takes the
/// `src` role. Without a source there is nothing to feed a sink, so a lone
/// `dst` yields no assignment at all.
pub fn resolve_roles(cls: &Classifier<'_>, sig: &Signature) -> RoleAssignment {
    let mut dst = None;
    let mut src = None;
    for (pos, param) in sig.params.iter().enumerate() {
        match param.name.as_str() {
            "dst" => {
                if cls.is_dst_candidate(param.ty) {
                    dst = Some(pos);
                }
            }
            _ => {
                if src.is_none() && cls.is_src_candidate(param.ty) {
                    src = Some(pos);
                }
            }
        }
    }
    if src.is_some() {
        RoleAssignment { dst, src }
    } else {
        RoleAssignment::default()
    }
}
