/* Wirebuf Reflection Library
 *
 * This library executes the wire layout of a schema at runtime, encoding
 * and decoding dynamic values without any generated code. It is the
 * executable reference the generated back-ends are checked against.
 */

pub mod codec;
pub mod errors;
pub mod value;

pub use codec::Codec;
pub use errors::{ReflectError, ReflectResult};
pub use value::Value;
