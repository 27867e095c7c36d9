use crate::codegen::shared::code::CodeNode;
use crate::codegen::shared::layout::{MAX_EMPTY_ELEMENTS, Scalar};

use super::helpers::scalar_to_rust_type;

/* Error type and bounds-checked little-endian primitives of the generated module */
const RUNTIME: &str = r#"#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    OutOfBounds { offset: usize, need: usize, len: usize },
    InvalidUtf8 { offset: usize },
    CountLimit { offset: usize, count: usize, limit: usize },
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::OutOfBounds { offset, need, len } => write!(
                f,
                "read of {} bytes at offset {} exceeds buffer of {} bytes",
                need, offset, len
            ),
            CodecError::InvalidUtf8 { offset } => {
                write!(f, "invalid UTF-8 in string at offset {}", offset)
            }
            CodecError::CountLimit { offset, count, limit } => write!(
                f,
                "count {} at offset {} exceeds the limit of {} zero-width elements",
                count, offset, limit
            ),
        }
    }
}

impl std::error::Error for CodecError {}

/// Fixed-width little-endian wire scalar.
pub trait Scalar: Copy {
    const WIDTH: usize;
    fn put_le(self, b: &mut [u8]);
    fn get_le(b: &[u8]) -> Self;
}

fn check(b: &[u8], n: usize, need: usize) -> Result<(), CodecError> {
    if n > b.len() || b.len() - n < need {
        return Err(CodecError::OutOfBounds { offset: n, need, len: b.len() });
    }
    Ok(())
}

pub fn put<T: Scalar>(b: &mut [u8], n: usize, v: T) -> usize {
    v.put_le(&mut b[n..n + T::WIDTH]);
    n + T::WIDTH
}

pub fn get<T: Scalar>(b: &[u8], n: &mut usize) -> Result<T, CodecError> {
    check(b, *n, T::WIDTH)?;
    let v = T::get_le(&b[*n..*n + T::WIDTH]);
    *n += T::WIDTH;
    Ok(v)
}

pub fn put_opt<T: Scalar>(b: &mut [u8], n: usize, v: Option<T>) -> usize {
    match v {
        Some(v) => {
            let n = put(b, n, true);
            put(b, n, v)
        }
        None => put(b, n, false),
    }
}

pub fn get_opt<T: Scalar>(b: &[u8], n: &mut usize) -> Result<Option<T>, CodecError> {
    if get::<bool>(b, n)? {
        Ok(Some(get::<T>(b, n)?))
    } else {
        Ok(None)
    }
}

pub fn put_len(b: &mut [u8], n: usize, len: usize) -> usize {
    put(b, n, len as u32)
}

pub fn get_len(b: &[u8], n: &mut usize) -> Result<usize, CodecError> {
    Ok(get::<u32>(b, n)? as usize)
}

/// Element count of a list or map whose entries occupy at least `width` bytes each.
pub fn get_count(b: &[u8], n: &mut usize, width: usize) -> Result<usize, CodecError> {
    let offset = *n;
    let count = get_len(b, n)?;
    if width == 0 {
        if count > MAX_EMPTY_ELEMENTS {
            return Err(CodecError::CountLimit { offset, count, limit: MAX_EMPTY_ELEMENTS });
        }
        return Ok(count);
    }
    check(b, *n, count.saturating_mul(width))?;
    Ok(count)
}

pub fn put_block(b: &mut [u8], n: usize, v: &[u8], len: usize) -> usize {
    let k = v.len().min(len);
    b[n..n + k].copy_from_slice(&v[..k]);
    n + len
}

pub fn get_block(b: &[u8], n: &mut usize, len: usize) -> Result<Vec<u8>, CodecError> {
    check(b, *n, len)?;
    let v = b[*n..*n + len].to_vec();
    *n += len;
    Ok(v)
}

pub fn put_bytes(b: &mut [u8], n: usize, v: &[u8]) -> usize {
    let n = put_len(b, n, v.len());
    put_block(b, n, v, v.len())
}

pub fn get_bytes(b: &[u8], n: &mut usize) -> Result<Vec<u8>, CodecError> {
    let len = get_len(b, n)?;
    get_block(b, n, len)
}

pub fn put_str(b: &mut [u8], n: usize, v: &str) -> usize {
    put_bytes(b, n, v.as_bytes())
}

pub fn get_str(b: &[u8], n: &mut usize) -> Result<String, CodecError> {
    let offset = *n;
    let raw = get_bytes(b, n)?;
    String::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8 { offset })
}"#;

/* Lines of verbatim source as code nodes; relative indentation is kept */
pub fn raw_lines(text: &str) -> Vec<CodeNode> {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                CodeNode::Blank
            } else {
                CodeNode::line(line)
            }
        })
        .collect()
}

fn scalar_impl(scalar: Scalar) -> CodeNode {
    let ty = scalar_to_rust_type(scalar);
    let width = scalar.width();
    let (put, get) = match scalar {
        Scalar::Bool => (
            "b[0] = self as u8;".to_string(),
            "b[0] != 0".to_string(),
        ),
        _ => (
            format!("b[..{}].copy_from_slice(&self.to_le_bytes());", width),
            format!(
                "let mut a = [0u8; {w}];\n    a.copy_from_slice(&b[..{w}]);\n    {ty}::from_le_bytes(a)",
                w = width,
                ty = ty
            ),
        ),
    };
    let mut get_body = Vec::new();
    for line in get.lines() {
        get_body.push(CodeNode::line(line.trim()));
    }
    CodeNode::block(
        format!("impl Scalar for {}", ty),
        vec![
            CodeNode::line(format!("const WIDTH: usize = {};", width)),
            CodeNode::block("fn put_le(self, b: &mut [u8])", vec![CodeNode::line(put)]),
            CodeNode::block("fn get_le(b: &[u8]) -> Self", get_body),
        ],
    )
}

pub fn emit_runtime() -> Vec<CodeNode> {
    let mut out = vec![
        CodeNode::line(format!("pub const MAX_EMPTY_ELEMENTS: usize = {};", MAX_EMPTY_ELEMENTS)),
        CodeNode::Blank,
    ];
    out.extend(raw_lines(RUNTIME));
    for scalar in Scalar::ALL {
        out.push(CodeNode::Blank);
        out.push(scalar_impl(scalar));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::code::render;

    #[test]
    fn runtime_covers_every_scalar() {
        let text = render(&emit_runtime(), "    ").unwrap();
        for scalar in Scalar::ALL {
            assert!(text.contains(&format!("impl Scalar for {} {{", scalar_to_rust_type(scalar))));
        }
        assert!(text.contains("        f32::from_le_bytes(a)"));
        assert!(text.contains("pub fn get_str(b: &[u8], n: &mut usize) -> Result<String, CodecError> {"));
        assert!(text.starts_with("pub const MAX_EMPTY_ELEMENTS: usize = 65536;\n"));
        assert!(text.contains("    check(b, *n, count.saturating_mul(width))?;"));
    }

    #[test]
    fn raw_lines_keep_relative_indent() {
        let nodes = raw_lines("a {\n    b\n\n}");
        assert_eq!(
            render(&nodes, "  ").unwrap(),
            "a {\n    b\n\n}\n"
        );
        let nested = vec![CodeNode::block("mod m", nodes)];
        assert_eq!(render(&nested, "  ").unwrap(), "mod m {\n  a {\n      b\n\n  }\n}\n");
    }
}
