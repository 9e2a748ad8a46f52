//! Package universe: embedded manifests plus manifest roots, interned into
//! a per-synthesis type table, and target lookup over package scopes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::error::GenError;
use crate::manifest::{
    self, MethodDecl, PackageManifest, ParamDecl, ResultDecl, TypeRef, TypeShape,
};
use crate::types::{
    Field, MethodSig, NamedType, Param, Prim, ResultSlot, Signature, TypeId, TypeKind, TypeTable,
};
use crate::Target;

/// Packages every universe carries; the catalog sentinels live here.
const AMBIENT_PACKAGES: &[&str] = &["io", "bytes"];

const BUILTIN_PACKAGES: &[&str] = &[
    "io",
    "bytes",
    "math",
    "encoding/json",
    "encoding/base64",
    "net/http",
    "time",
    "strings",
    "crypto/md5",
];

fn builtin_manifest_source(package: &str) -> Option<&'static str> {
    match package {
        "io" => Some(include_str!("../assets/io.gorram.json")),
        "bytes" => Some(include_str!("../assets/bytes.gorram.json")),
        "math" => Some(include_str!("../assets/math.gorram.json")),
        "encoding/json" => Some(include_str!("../assets/encoding_json.gorram.json")),
        "encoding/base64" => Some(include_str!("../assets/encoding_base64.gorram.json")),
        "net/http" => Some(include_str!("../assets/net_http.gorram.json")),
        "time" => Some(include_str!("../assets/time.gorram.json")),
        "strings" => Some(include_str!("../assets/strings.gorram.json")),
        "crypto/md5" => Some(include_str!("../assets/crypto_md5.gorram.json")),
        _ => None,
    }
}

static BUILTIN_MANIFESTS: OnceCell<BTreeMap<&'static str, PackageManifest>> = OnceCell::new();

/// One-time parse of the embedded manifest set. Immutable afterwards; safe
/// to share across synthesis calls.
fn builtin_manifests() -> Result<&'static BTreeMap<&'static str, PackageManifest>, GenError> {
    BUILTIN_MANIFESTS.get_or_try_init(|| {
        let mut out = BTreeMap::new();
        for &pkg in BUILTIN_PACKAGES {
            let src = builtin_manifest_source(pkg).ok_or_else(|| {
                GenError::invariant(format!("no embedded manifest for builtin package {pkg:?}"))
            })?;
            let m = manifest::parse_manifest_json(src.as_bytes())
                .map_err(|e| GenError::invariant(format!("embedded manifest {pkg:?}: {e}")))?;
            out.insert(pkg, m);
        }
        Ok(out)
    })
}

#[derive(Debug, Clone)]
pub enum Symbol {
    Func { public: bool, sig: Signature },
    Var { public: bool, ty: TypeId },
    Type { public: bool, id: TypeId },
}

#[derive(Debug, Clone)]
pub struct Package {
    pub path: String,
    pub name: String,
    scope: BTreeMap<String, Symbol>,
}

impl Package {
    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.scope.get(name)
    }
}

/// The target callable, fully resolved.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub package_path: String,
    pub package_name: String,
    pub global_var: Option<String>,
    pub function: String,
    pub sig: Signature,
}

#[derive(Debug)]
pub struct Universe {
    pub table: TypeTable,
    packages: BTreeMap<String, Package>,
}

impl Universe {
    /// Loads the ambient packages and the target package into a fresh table.
    pub fn load(target_package: &str, roots: &[PathBuf]) -> Result<Self, GenError> {
        let mut u = Universe {
            table: TypeTable::new(),
            packages: BTreeMap::new(),
        };
        for pkg in AMBIENT_PACKAGES {
            u.load_package(pkg, roots)?;
        }
        u.load_package(target_package, roots)?;
        Ok(u)
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    /// Short name a package is imported under in emitted code.
    pub fn short_name(&self, path: &str) -> String {
        match self.packages.get(path) {
            Some(p) => p.name.clone(),
            None => path.rsplit('/').next().unwrap_or(path).to_string(),
        }
    }

    pub fn load_package(&mut self, path: &str, roots: &[PathBuf]) -> Result<(), GenError> {
        if self.packages.contains_key(path) {
            return Ok(());
        }
        validate_package_path(path)?;
        // Embedded packages win; roots are searched after, like module roots.
        let m = match builtin_manifests()?.get(path) {
            Some(m) => m.clone(),
            None => read_manifest_from_roots(path, roots)?,
        };
        self.intern_package(&m)
    }

    fn intern_package(&mut self, m: &PackageManifest) -> Result<(), GenError> {
        let mut pkg = Package {
            path: m.package.clone(),
            name: m.name.clone(),
            scope: BTreeMap::new(),
        };
        for t in &m.types {
            let (underlying, methods) = match &t.shape {
                TypeShape::Struct(fields) => {
                    let mut fs = Vec::new();
                    for f in fields {
                        fs.push(Field {
                            name: f.name.clone(),
                            ty: self.resolve_ref(&f.ty, &pkg)?,
                            public: f.public,
                        });
                    }
                    let u = self.table.intern(TypeKind::Struct(fs));
                    (u, self.resolve_methods(&t.methods, &pkg)?)
                }
                TypeShape::Interface => {
                    let ms = self.resolve_methods(&t.methods, &pkg)?;
                    let u = self.table.intern(TypeKind::Interface(ms.clone()));
                    (u, ms)
                }
                TypeShape::Alias(r) => {
                    let u = self.resolve_ref(r, &pkg)?;
                    (u, self.resolve_methods(&t.methods, &pkg)?)
                }
            };
            let id = self.table.intern(TypeKind::Named(Box::new(NamedType {
                package: m.package.clone(),
                name: t.name.clone(),
                underlying,
                methods,
            })));
            pkg.scope.insert(
                t.name.clone(),
                Symbol::Type {
                    public: t.public,
                    id,
                },
            );
        }
        for v in &m.vars {
            let ty = self.resolve_ref(&v.ty, &pkg)?;
            pkg.scope.insert(
                v.name.clone(),
                Symbol::Var {
                    public: v.public,
                    ty,
                },
            );
        }
        for f in &m.funcs {
            let sig = Signature {
                params: self.resolve_params(&f.params, &pkg)?,
                results: self.resolve_results(&f.results, &pkg)?,
            };
            pkg.scope.insert(
                f.name.clone(),
                Symbol::Func {
                    public: f.public,
                    sig,
                },
            );
        }
        self.packages.insert(m.package.clone(), pkg);
        Ok(())
    }

    fn resolve_methods(
        &mut self,
        decls: &[MethodDecl],
        local: &Package,
    ) -> Result<Vec<MethodSig>, GenError> {
        let mut out = Vec::new();
        for d in decls {
            out.push(MethodSig {
                name: d.name.clone(),
                public: d.public,
                params: self.resolve_params(&d.params, local)?,
                results: self.resolve_results(&d.results, local)?,
            });
        }
        Ok(out)
    }

    fn resolve_params(
        &mut self,
        decls: &[ParamDecl],
        local: &Package,
    ) -> Result<Vec<Param>, GenError> {
        let mut out = Vec::new();
        for d in decls {
            out.push(Param {
                name: d.name.clone(),
                ty: self.resolve_ref(&d.ty, local)?,
            });
        }
        Ok(out)
    }

    fn resolve_results(
        &mut self,
        decls: &[ResultDecl],
        local: &Package,
    ) -> Result<Vec<ResultSlot>, GenError> {
        let mut out = Vec::new();
        for d in decls {
            out.push(ResultSlot {
                name: d.name.clone(),
                ty: self.resolve_ref(&d.ty, local)?,
            });
        }
        Ok(out)
    }

    fn resolve_ref(&mut self, r: &TypeRef, local: &Package) -> Result<TypeId, GenError> {
        match r {
            TypeRef::Name(n) => {
                if let Some(p) = Prim::parse_named(n) {
                    return Ok(self.table.intern_prim(p));
                }
                match n.as_str() {
                    "error" => return Ok(self.table.intern(TypeKind::Error)),
                    "bytes" => {
                        let u8 = self.table.intern_prim(Prim::U8);
                        return Ok(self.table.intern(TypeKind::Slice(u8)));
                    }
                    _ => {}
                }
                if let Some((qualifier, ty_name)) = n.rsplit_once('.') {
                    let pkg = if qualifier == local.name {
                        local
                    } else {
                        self.packages
                            .values()
                            .find(|p| p.name == qualifier)
                            .ok_or_else(|| {
                                GenError::lookup(format!(
                                    "unknown package {qualifier:?} in type {n:?} (package {})",
                                    local.path
                                ))
                            })?
                    };
                    return match pkg.scope.get(ty_name) {
                        Some(Symbol::Type { id, .. }) => Ok(*id),
                        _ => Err(GenError::lookup(format!(
                            "unknown type {n:?} (package {})",
                            local.path
                        ))),
                    };
                }
                match local.scope.get(n) {
                    Some(Symbol::Type { id, .. }) => Ok(*id),
                    _ => Err(GenError::lookup(format!(
                        "unknown type {n:?} (package {})",
                        local.path
                    ))),
                }
            }
            TypeRef::Slice(elem) => {
                let e = self.resolve_ref(elem, local)?;
                Ok(self.table.intern(TypeKind::Slice(e)))
            }
            TypeRef::Array(n, elem) => {
                let e = self.resolve_ref(elem, local)?;
                Ok(self.table.intern(TypeKind::Array(*n, e)))
            }
            TypeRef::Ptr(elem) => {
                let e = self.resolve_ref(elem, local)?;
                Ok(self.table.intern(TypeKind::Ptr(e)))
            }
        }
    }

    /// Resolves the invocation target to its signature, surfacing the
    /// user-facing lookup errors.
    pub fn lookup_target(
        &self,
        package: &str,
        target: &Target,
    ) -> Result<ResolvedTarget, GenError> {
        let pkg = self
            .packages
            .get(package)
            .ok_or_else(|| GenError::lookup(format!("unknown package: {package:?}")))?;

        let Some(var) = &target.global_var else {
            let f = &target.function;
            return match pkg.scope.get(f) {
                None => Err(GenError::lookup(format!("{package}.{f} not found"))),
                Some(Symbol::Func { public, sig }) => {
                    if !*public {
                        return Err(GenError::lookup(format!("{package}.{f} is not exported")));
                    }
                    Ok(ResolvedTarget {
                        package_path: pkg.path.clone(),
                        package_name: pkg.name.clone(),
                        global_var: None,
                        function: f.clone(),
                        sig: sig.clone(),
                    })
                }
                Some(_) => Err(GenError::lookup(format!("{package}.{f} is not a function"))),
            };
        };

        let (var_public, var_ty) = match pkg.scope.get(var) {
            None => return Err(GenError::lookup(format!("{package}.{var} not found"))),
            Some(Symbol::Var { public, ty }) => (*public, *ty),
            Some(_) => {
                return Err(GenError::lookup(format!(
                    "{package}.{var} is not a global variable"
                )))
            }
        };
        if !var_public {
            return Err(GenError::lookup(format!("{package}.{var} is not exported")));
        }

        let f = &target.function;
        match self
            .table
            .method_set(var_ty)
            .iter()
            .find(|m| m.name == *f)
        {
            Some(m) if !m.public => Err(GenError::lookup(format!(
                "{package}.{var}.{f} is not exported"
            ))),
            Some(m) => Ok(ResolvedTarget {
                package_path: pkg.path.clone(),
                package_name: pkg.name.clone(),
                global_var: Some(var.clone()),
                function: f.clone(),
                sig: Signature {
                    params: m.params.clone(),
                    results: m.results.clone(),
                },
            }),
            None => {
                // A struct field by that name is selectable but not callable.
                if self.field_exists(var_ty, f) {
                    Err(GenError::lookup(format!(
                        "{package}.{var}.{f} is not a method"
                    )))
                } else {
                    Err(GenError::lookup(format!("{package}.{var}.{f} not found")))
                }
            }
        }
    }

    fn field_exists(&self, ty: TypeId, name: &str) -> bool {
        let mut t = ty;
        if let TypeKind::Ptr(elem) = self.table.kind(t) {
            t = *elem;
        }
        match self.table.kind(self.table.underlying(t)) {
            TypeKind::Struct(fields) => fields.iter().any(|f| f.name == name),
            _ => false,
        }
    }
}

fn validate_package_path(path: &str) -> Result<(), GenError> {
    let valid = !path.is_empty()
        && path.split('/').all(|seg| {
            !seg.is_empty()
                && seg != "."
                && seg != ".."
                && seg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        });
    if valid {
        Ok(())
    } else {
        Err(GenError::lookup(format!("invalid package path: {path:?}")))
    }
}

fn read_manifest_from_roots(
    package: &str,
    roots: &[PathBuf],
) -> Result<PackageManifest, GenError> {
    let mut rel = PathBuf::new();
    for seg in package.split('/') {
        rel.push(seg);
    }
    let rel = rel.with_extension("gorram.json");

    let mut hits: Vec<PathBuf> = Vec::new();
    for root in roots {
        let cand = root.join(&rel);
        if cand.is_file() {
            hits.push(cand);
        }
    }
    match hits.len() {
        0 => Err(GenError::lookup(format!(
            "unknown package: {package:?} (searched: {})",
            rel.display()
        ))),
        1 => read_manifest_file(package, &hits[0]),
        _ => Err(GenError::lookup(format!(
            "package {package:?} is ambiguous across manifest roots: {hits:?}"
        ))),
    }
}

fn read_manifest_file(package: &str, path: &Path) -> Result<PackageManifest, GenError> {
    let bytes = std::fs::read(path)
        .map_err(|e| GenError::io(format!("read manifest {}: {e}", path.display())))?;
    let m = manifest::parse_manifest_json(&bytes)
        .map_err(|e| GenError::lookup(format!("manifest {}: {e}", path.display())))?;
    if m.package != package {
        return Err(GenError::lookup(format!(
            "manifest {} declares package {:?}, expected {package:?}",
            path.display(),
            m.package
        )));
    }
    Ok(m)
}
