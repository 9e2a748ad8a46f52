//! Package interface manifests.
//!
//! A manifest is a JSON document describing one package's exported surface:
//! named types (shape plus method set), global variables, and functions.
//! Manifests are the resolved-signature source the synthesizer consumes;
//! the ambient set ships embedded in the binary and user packages are
//! discovered under manifest roots as `<root>/<import path>.gorram.json`.
//!
//! Within one document, a type must be declared before it is referenced.
//! Foreign references use the dot-qualified form (`io.Reader`) and resolve
//! against packages loaded earlier.

use std::fmt::Display;

use serde_json::Value;

pub const MANIFEST_SCHEMA_VERSIONS_SUPPORTED: &[&str] = &["1"];

#[derive(Debug, Clone)]
pub struct ManifestError {
    pub message: String,
    pub ptr: String,
}

impl std::error::Error for ManifestError {}

impl Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ptr.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} at {}", self.message, self.ptr)
        }
    }
}

fn err(message: impl Into<String>, ptr: impl Into<String>) -> ManifestError {
    ManifestError {
        message: message.into(),
        ptr: ptr.into(),
    }
}

#[derive(Debug, Clone)]
pub struct PackageManifest {
    pub package: String,
    pub name: String,
    pub types: Vec<TypeDecl>,
    pub vars: Vec<VarDecl>,
    pub funcs: Vec<FuncDecl>,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub public: bool,
    pub shape: TypeShape,
    /// For interface declarations this is the interface method set; for
    /// struct and alias declarations it is the named type's method set.
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone)]
pub enum TypeShape {
    Struct(Vec<FieldDecl>),
    Interface,
    Alias(TypeRef),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub public: bool,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub public: bool,
    pub params: Vec<ParamDecl>,
    pub results: Vec<ResultDecl>,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone)]
pub struct ResultDecl {
    pub name: Option<String>,
    pub ty: TypeRef,
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub public: bool,
    pub ty: TypeRef,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    pub public: bool,
    pub params: Vec<ParamDecl>,
    pub results: Vec<ResultDecl>,
}

/// A structured type reference.
///
/// A bare string names a primitive, `error`, the `bytes` shorthand, a local
/// type, or a dot-qualified foreign type. List forms build composites:
/// `["slice", T]`, `["array", N, T]`, `["ptr", T]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Name(String),
    Slice(Box<TypeRef>),
    Array(u64, Box<TypeRef>),
    Ptr(Box<TypeRef>),
}

pub fn parse_manifest_json(bytes: &[u8]) -> Result<PackageManifest, ManifestError> {
    let doc: Value = serde_json::from_slice(bytes).map_err(|e| err(e.to_string(), ""))?;
    parse_manifest_value(&doc)
}

fn parse_manifest_value(root: &Value) -> Result<PackageManifest, ManifestError> {
    let obj = root
        .as_object()
        .ok_or_else(|| err("manifest root must be an object", ""))?;

    let schema_version = required_string(obj, "", "schema_version")?;
    if !MANIFEST_SCHEMA_VERSIONS_SUPPORTED
        .iter()
        .any(|&v| v == schema_version)
    {
        return Err(err(
            format!(
                "unsupported schema_version: got {schema_version:?} (supported: {})",
                MANIFEST_SCHEMA_VERSIONS_SUPPORTED.join(", ")
            ),
            "/schema_version",
        ));
    }

    let package = required_string(obj, "", "package")?;
    if package.is_empty() {
        return Err(err("package must be non-empty", "/package"));
    }
    let name = match obj.get("name") {
        Some(v) => as_string(v, "/name")?,
        // Default short name: the last import-path segment.
        None => package.rsplit('/').next().unwrap_or(&package).to_string(),
    };

    let mut types = Vec::new();
    if let Some(v) = obj.get("types") {
        let arr = as_array(v, "/types")?;
        for (i, t) in arr.iter().enumerate() {
            types.push(parse_type_decl(t, &format!("/types/{i}"))?);
        }
    }

    let mut vars = Vec::new();
    if let Some(v) = obj.get("vars") {
        let arr = as_array(v, "/vars")?;
        for (i, t) in arr.iter().enumerate() {
            vars.push(parse_var_decl(t, &format!("/vars/{i}"))?);
        }
    }

    let mut funcs = Vec::new();
    if let Some(v) = obj.get("funcs") {
        let arr = as_array(v, "/funcs")?;
        for (i, t) in arr.iter().enumerate() {
            funcs.push(parse_func_decl(t, &format!("/funcs/{i}"))?);
        }
    }

    Ok(PackageManifest {
        package,
        name,
        types,
        vars,
        funcs,
    })
}

fn parse_type_decl(v: &Value, ptr: &str) -> Result<TypeDecl, ManifestError> {
    let obj = as_object(v, ptr)?;
    let name = required_string(obj, ptr, "name")?;
    let public = optional_bool(obj, ptr, "pub")?.unwrap_or(true);
    let kind = required_string(obj, ptr, "kind")?;

    let shape = match kind.as_str() {
        "struct" => {
            let mut fields = Vec::new();
            if let Some(fv) = obj.get("fields") {
                let arr = as_array(fv, &format!("{ptr}/fields"))?;
                for (i, f) in arr.iter().enumerate() {
                    fields.push(parse_field_decl(f, &format!("{ptr}/fields/{i}"))?);
                }
            }
            TypeShape::Struct(fields)
        }
        "interface" => TypeShape::Interface,
        "alias" => {
            let tv = obj
                .get("type")
                .ok_or_else(|| err("alias type is missing \"type\"", ptr))?;
            TypeShape::Alias(parse_type_ref(tv, &format!("{ptr}/type"))?)
        }
        other => {
            return Err(err(
                format!("invalid type kind: expected \"struct\", \"interface\" or \"alias\" got {other:?}"),
                ptr,
            ))
        }
    };

    let mut methods = Vec::new();
    if let Some(mv) = obj.get("methods") {
        let arr = as_array(mv, &format!("{ptr}/methods"))?;
        for (i, m) in arr.iter().enumerate() {
            methods.push(parse_method_decl(m, &format!("{ptr}/methods/{i}"))?);
        }
    }

    Ok(TypeDecl {
        name,
        public,
        shape,
        methods,
    })
}

fn parse_field_decl(v: &Value, ptr: &str) -> Result<FieldDecl, ManifestError> {
    let obj = as_object(v, ptr)?;
    Ok(FieldDecl {
        name: required_string(obj, ptr, "name")?,
        public: optional_bool(obj, ptr, "pub")?.unwrap_or(true),
        ty: parse_type_ref(
            obj.get("type")
                .ok_or_else(|| err("field is missing \"type\"", ptr))?,
            &format!("{ptr}/type"),
        )?,
    })
}

fn parse_method_decl(v: &Value, ptr: &str) -> Result<MethodDecl, ManifestError> {
    let obj = as_object(v, ptr)?;
    Ok(MethodDecl {
        name: required_string(obj, ptr, "name")?,
        public: optional_bool(obj, ptr, "pub")?.unwrap_or(true),
        params: parse_params(obj.get("params"), &format!("{ptr}/params"))?,
        results: parse_results(obj.get("results"), &format!("{ptr}/results"))?,
    })
}

fn parse_var_decl(v: &Value, ptr: &str) -> Result<VarDecl, ManifestError> {
    let obj = as_object(v, ptr)?;
    Ok(VarDecl {
        name: required_string(obj, ptr, "name")?,
        public: optional_bool(obj, ptr, "pub")?.unwrap_or(true),
        ty: parse_type_ref(
            obj.get("type")
                .ok_or_else(|| err("var is missing \"type\"", ptr))?,
            &format!("{ptr}/type"),
        )?,
    })
}

fn parse_func_decl(v: &Value, ptr: &str) -> Result<FuncDecl, ManifestError> {
    let obj = as_object(v, ptr)?;
    Ok(FuncDecl {
        name: required_string(obj, ptr, "name")?,
        public: optional_bool(obj, ptr, "pub")?.unwrap_or(true),
        params: parse_params(obj.get("params"), &format!("{ptr}/params"))?,
        results: parse_results(obj.get("results"), &format!("{ptr}/results"))?,
    })
}

fn parse_params(v: Option<&Value>, ptr: &str) -> Result<Vec<ParamDecl>, ManifestError> {
    let Some(v) = v else { return Ok(Vec::new()) };
    let arr = as_array(v, ptr)?;
    let mut out = Vec::new();
    for (i, p) in arr.iter().enumerate() {
        let pptr = format!("{ptr}/{i}");
        let obj = as_object(p, &pptr)?;
        out.push(ParamDecl {
            name: required_string(obj, &pptr, "name")?,
            ty: parse_type_ref(
                obj.get("type")
                    .ok_or_else(|| err("param is missing \"type\"", &pptr))?,
                &format!("{pptr}/type"),
            )?,
        });
    }
    Ok(out)
}

fn parse_results(v: Option<&Value>, ptr: &str) -> Result<Vec<ResultDecl>, ManifestError> {
    let Some(v) = v else { return Ok(Vec::new()) };
    let arr = as_array(v, ptr)?;
    let mut out = Vec::new();
    for (i, r) in arr.iter().enumerate() {
        let rptr = format!("{ptr}/{i}");
        let obj = as_object(r, &rptr)?;
        let name = match obj.get("name") {
            Some(n) => Some(as_string(n, &format!("{rptr}/name"))?),
            None => None,
        };
        out.push(ResultDecl {
            name,
            ty: parse_type_ref(
                obj.get("type")
                    .ok_or_else(|| err("result is missing \"type\"", &rptr))?,
                &format!("{rptr}/type"),
            )?,
        });
    }
    Ok(out)
}

fn parse_type_ref(v: &Value, ptr: &str) -> Result<TypeRef, ManifestError> {
    match v {
        Value::String(s) => {
            if s.is_empty() {
                return Err(err("type name must be non-empty", ptr));
            }
            Ok(TypeRef::Name(s.clone()))
        }
        Value::Array(items) => {
            let head = items
                .first()
                .and_then(|h| h.as_str())
                .ok_or_else(|| err("type list must start with a string head", ptr))?;
            match head {
                "slice" => {
                    if items.len() != 2 {
                        return Err(err("slice type takes one element type", ptr));
                    }
                    let elem = parse_type_ref(&items[1], &format!("{ptr}/1"))?;
                    Ok(TypeRef::Slice(Box::new(elem)))
                }
                "array" => {
                    if items.len() != 3 {
                        return Err(err("array type takes a length and an element type", ptr));
                    }
                    let len = items[1]
                        .as_u64()
                        .ok_or_else(|| err("array length must be a non-negative integer", &format!("{ptr}/1")))?;
                    let elem = parse_type_ref(&items[2], &format!("{ptr}/2"))?;
                    Ok(TypeRef::Array(len, Box::new(elem)))
                }
                "ptr" => {
                    if items.len() != 2 {
                        return Err(err("ptr type takes one element type", ptr));
                    }
                    let elem = parse_type_ref(&items[1], &format!("{ptr}/1"))?;
                    Ok(TypeRef::Ptr(Box::new(elem)))
                }
                other => Err(err(
                    format!("invalid type head: expected \"slice\", \"array\" or \"ptr\" got {other:?}"),
                    ptr,
                )),
            }
        }
        _ => Err(err("type must be a string or a list", ptr)),
    }
}

fn as_object<'a>(
    v: &'a Value,
    ptr: &str,
) -> Result<&'a serde_json::Map<String, Value>, ManifestError> {
    v.as_object().ok_or_else(|| err("expected an object", ptr))
}

fn as_array<'a>(v: &'a Value, ptr: &str) -> Result<&'a Vec<Value>, ManifestError> {
    v.as_array().ok_or_else(|| err("expected an array", ptr))
}

fn as_string(v: &Value, ptr: &str) -> Result<String, ManifestError> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| err("expected a string", ptr))
}

fn required_string(
    obj: &serde_json::Map<String, Value>,
    ptr: &str,
    key: &str,
) -> Result<String, ManifestError> {
    let v = obj
        .get(key)
        .ok_or_else(|| err(format!("missing required key {key:?}"), ptr))?;
    as_string(v, &format!("{ptr}/{key}"))
}

fn optional_bool(
    obj: &serde_json::Map<String, Value>,
    ptr: &str,
    key: &str,
) -> Result<Option<bool>, ManifestError> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| err("expected a bool", format!("{ptr}/{key}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_manifest() {
        let m = parse_manifest_json(
            br#"{
                "schema_version": "1",
                "package": "math",
                "funcs": [
                    { "name": "Sqrt",
                      "params": [ { "name": "x", "type": "f64" } ],
                      "results": [ { "type": "f64" } ] }
                ]
            }"#,
        )
        .expect("parse");
        assert_eq!(m.package, "math");
        assert_eq!(m.name, "math");
        assert_eq!(m.funcs.len(), 1);
        assert_eq!(m.funcs[0].params[0].ty, TypeRef::Name("f64".to_string()));
    }

    #[test]
    fn short_name_defaults_to_last_path_segment() {
        let m = parse_manifest_json(
            br#"{ "schema_version": "1", "package": "encoding/json" }"#,
        )
        .expect("parse");
        assert_eq!(m.name, "json");
    }

    #[test]
    fn composite_type_refs() {
        let m = parse_manifest_json(
            br#"{
                "schema_version": "1",
                "package": "p",
                "funcs": [
                    { "name": "F",
                      "params": [
                        { "name": "dst", "type": ["ptr", "bytes.Buffer"] },
                        { "name": "sum", "type": ["array", 16, "u8"] },
                        { "name": "data", "type": ["slice", "u8"] }
                      ] }
                ]
            }"#,
        )
        .expect("parse");
        let params = &m.funcs[0].params;
        assert_eq!(
            params[0].ty,
            TypeRef::Ptr(Box::new(TypeRef::Name("bytes.Buffer".to_string())))
        );
        assert_eq!(
            params[1].ty,
            TypeRef::Array(16, Box::new(TypeRef::Name("u8".to_string())))
        );
        assert_eq!(
            params[2].ty,
            TypeRef::Slice(Box::new(TypeRef::Name("u8".to_string())))
        );
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let e = parse_manifest_json(br#"{ "schema_version": "9", "package": "p" }"#)
            .expect_err("must fail");
        assert_eq!(e.ptr, "/schema_version");
    }

    #[test]
    fn error_carries_json_pointer() {
        let e = parse_manifest_json(
            br#"{
                "schema_version": "1",
                "package": "p",
                "funcs": [ { "name": "F", "params": [ { "name": "x" } ] } ]
            }"#,
        )
        .expect_err("must fail");
        assert_eq!(e.ptr, "/funcs/0/params/0");
        assert!(e.message.contains("missing \"type\""), "message={}", e.message);
    }

    #[test]
    fn rejects_bad_type_head() {
        let e = parse_manifest_json(
            br#"{
                "schema_version": "1",
                "package": "p",
                "vars": [ { "name": "V", "type": ["map", "u8"] } ]
            }"#,
        )
        .expect_err("must fail");
        assert!(e.message.contains("invalid type head"), "message={}", e.message);
    }
}
