/* Little-endian runtime helpers emitted into every generated C# class */

use crate::codegen::shared::code::CodeNode;
use crate::codegen::shared::layout::{LENGTH_PREFIX_WIDTH, MAX_EMPTY_ELEMENTS, Scalar};

use super::types::scalar_type;

/* Name fragment of the Put/Get helper pair for a scalar */
pub fn scalar_suffix(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "Bool",
        Scalar::I8 => "Int8",
        Scalar::U8 => "Uint8",
        Scalar::I16 => "Int16",
        Scalar::U16 => "Uint16",
        Scalar::I32 => "Int32",
        Scalar::U32 => "Uint32",
        Scalar::I64 => "Int64",
        Scalar::U64 => "Uint64",
        Scalar::F32 => "Float32",
        Scalar::F64 => "Float64",
    }
}

fn lines(text: &[&str]) -> Vec<CodeNode> {
    text.iter().map(|l| CodeNode::line(*l)).collect()
}

/* Raw bit pattern of a scalar value as ulong, and back */
fn to_bits(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "v ? 1UL : 0UL",
        Scalar::I8 => "unchecked((ulong)(byte)v)",
        Scalar::I16 => "unchecked((ulong)(ushort)v)",
        Scalar::I32 => "unchecked((ulong)(uint)v)",
        Scalar::I64 => "unchecked((ulong)v)",
        Scalar::U8 | Scalar::U16 | Scalar::U32 | Scalar::U64 => "(ulong)v",
        Scalar::F32 => "(ulong)BitConverter.ToUInt32(BitConverter.GetBytes(v), 0)",
        Scalar::F64 => "unchecked((ulong)BitConverter.DoubleToInt64Bits(v))",
    }
}

fn from_bits(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "bits != 0",
        Scalar::I8 => "unchecked((sbyte)(byte)bits)",
        Scalar::U8 => "unchecked((byte)bits)",
        Scalar::I16 => "unchecked((short)(ushort)bits)",
        Scalar::U16 => "unchecked((ushort)bits)",
        Scalar::I32 => "unchecked((int)(uint)bits)",
        Scalar::U32 => "unchecked((uint)bits)",
        Scalar::I64 => "unchecked((long)bits)",
        Scalar::U64 => "bits",
        Scalar::F32 => "BitConverter.ToSingle(BitConverter.GetBytes(unchecked((uint)bits)), 0)",
        Scalar::F64 => "BitConverter.Int64BitsToDouble(unchecked((long)bits))",
    }
}

fn scalar_helpers(scalar: Scalar) -> Vec<CodeNode> {
    let suffix = scalar_suffix(scalar);
    let ty = scalar_type(scalar);
    let width = scalar.width();
    vec![
        CodeNode::block(
            format!("public static int Put{}(byte[] b, int n, {} v)", suffix, ty),
            vec![CodeNode::line(format!(
                "return PutBits(b, n, {}, {});",
                to_bits(scalar),
                width
            ))],
        ),
        CodeNode::block(
            format!("public static {} Get{}(byte[] b, ref int n)", ty, suffix),
            vec![
                CodeNode::line(format!("ulong bits = GetBits(b, ref n, {});", width)),
                CodeNode::line(format!("return {};", from_bits(scalar))),
            ],
        ),
    ]
}

/* OutOfBoundsException plus the static Put/Get family */
pub fn emit_runtime_helpers() -> Vec<CodeNode> {
    let prefix = LENGTH_PREFIX_WIDTH;
    let mut out = vec![
        CodeNode::block(
            "public class OutOfBoundsException : Exception",
            vec![CodeNode::block(
                "public OutOfBoundsException(int offset, long need, int length) : base(\"read of \" + need + \" bytes at offset \" + offset + \" exceeds buffer of \" + length + \" bytes\")",
                vec![],
            )],
        ),
        CodeNode::block(
            "public class CountLimitException : Exception",
            vec![CodeNode::block(
                "public CountLimitException(int offset, int count, int limit) : base(\"count \" + count + \" at offset \" + offset + \" exceeds the limit of \" + limit + \" zero-width elements\")",
                vec![],
            )],
        ),
        CodeNode::Blank,
        CodeNode::line(format!("public const int MaxEmptyElements = {};", MAX_EMPTY_ELEMENTS)),
        CodeNode::Blank,
        CodeNode::block(
            "public static void Check(byte[] b, int n, long need)",
            vec![CodeNode::block(
                "if (n < 0 || need < 0 || n > b.Length || b.Length - n < need)",
                lines(&["throw new OutOfBoundsException(n, need, b.Length);"]),
            )],
        ),
        CodeNode::Blank,
        CodeNode::block(
            "public static int PutBits(byte[] b, int n, ulong v, int width)",
            vec![
                CodeNode::block(
                    "for (int i = 0; i < width; i++)",
                    lines(&["b[n + i] = (byte)(v >> (8 * i));"]),
                ),
                CodeNode::line("return n + width;"),
            ],
        ),
        CodeNode::Blank,
        CodeNode::block(
            "public static ulong GetBits(byte[] b, ref int n, int width)",
            vec![
                CodeNode::line("Check(b, n, width);"),
                CodeNode::line("ulong v = 0;"),
                CodeNode::block(
                    "for (int i = 0; i < width; i++)",
                    lines(&["v |= (ulong)b[n + i] << (8 * i);"]),
                ),
                CodeNode::line("n += width;"),
                CodeNode::line("return v;"),
            ],
        ),
    ];

    for scalar in Scalar::ALL {
        out.push(CodeNode::Blank);
        out.extend(scalar_helpers(scalar));
    }

    out.extend([
        CodeNode::Blank,
        CodeNode::block(
            "public static int PutCount(byte[] b, int n, int count)",
            lines(&["return PutBits(b, n, (ulong)count, 4);"]),
        ),
        CodeNode::block(
            "public static int GetCount(byte[] b, ref int n)",
            vec![
                CodeNode::line(format!("ulong count = GetBits(b, ref n, {});", prefix)),
                CodeNode::block(
                    "if (count > int.MaxValue)",
                    lines(&["throw new OutOfBoundsException(n, (long)count, b.Length);"]),
                ),
                CodeNode::line("return (int)count;"),
            ],
        ),
        CodeNode::block(
            "public static int GetElementCount(byte[] b, ref int n, int width)",
            vec![
                CodeNode::line("int offset = n;"),
                CodeNode::line("int count = GetCount(b, ref n);"),
                CodeNode::block(
                    "if (width == 0 && count > MaxEmptyElements)",
                    lines(&["throw new CountLimitException(offset, count, MaxEmptyElements);"]),
                ),
                CodeNode::line("Check(b, n, (long)count * width);"),
                CodeNode::line("return count;"),
            ],
        ),
        CodeNode::Blank,
        CodeNode::block(
            "public static int StringSize(string v)",
            lines(&["return v == null ? 0 : Encoding.UTF8.GetByteCount(v);"]),
        ),
        CodeNode::block(
            "public static int PutString(byte[] b, int n, string v)",
            vec![
                CodeNode::line("byte[] s = v == null ? new byte[0] : Encoding.UTF8.GetBytes(v);"),
                CodeNode::line("return PutBytes(b, n, s);"),
            ],
        ),
        CodeNode::block(
            "public static string GetString(byte[] b, ref int n)",
            vec![
                CodeNode::line("int len = GetCount(b, ref n);"),
                CodeNode::line("Check(b, n, len);"),
                CodeNode::line("string v = Encoding.UTF8.GetString(b, n, len);"),
                CodeNode::line("n += len;"),
                CodeNode::line("return v;"),
            ],
        ),
        CodeNode::Blank,
        CodeNode::block(
            "public static int BytesSize(byte[] v)",
            lines(&["return v == null ? 0 : v.Length;"]),
        ),
        CodeNode::block(
            "public static int PutBytes(byte[] b, int n, byte[] v)",
            vec![
                CodeNode::line("int len = BytesSize(v);"),
                CodeNode::line("n = PutCount(b, n, len);"),
                CodeNode::block(
                    "if (len > 0)",
                    lines(&["Buffer.BlockCopy(v, 0, b, n, len);"]),
                ),
                CodeNode::line("return n + len;"),
            ],
        ),
        CodeNode::block(
            "public static byte[] GetBytes(byte[] b, ref int n)",
            vec![
                CodeNode::line("int len = GetCount(b, ref n);"),
                CodeNode::line("return GetBlock(b, ref n, len);"),
            ],
        ),
        CodeNode::block(
            "public static int PutBlock(byte[] b, int n, byte[] v, int len)",
            vec![
                CodeNode::block(
                    "if (v != null)",
                    lines(&["Buffer.BlockCopy(v, 0, b, n, Math.Min(v.Length, len));"]),
                ),
                CodeNode::line("return n + len;"),
            ],
        ),
        CodeNode::block(
            "public static byte[] GetBlock(byte[] b, ref int n, int len)",
            vec![
                CodeNode::line("Check(b, n, len);"),
                CodeNode::line("byte[] v = new byte[len];"),
                CodeNode::line("Buffer.BlockCopy(b, n, v, 0, len);"),
                CodeNode::line("n += len;"),
                CodeNode::line("return v;"),
            ],
        ),
    ]);
    out
}
