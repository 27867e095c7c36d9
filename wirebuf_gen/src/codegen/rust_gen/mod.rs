pub mod codec;
pub mod dispatch;
pub mod helpers;
pub mod runtime;
pub mod types;

/* Re-export main public functions */
pub use codec::{emit_codec_impl, emit_marshal_fn, emit_size_fn, emit_unmarshal_fn};
pub use dispatch::{emit_client, emit_handlers, emit_message_enum, emit_service_id, emit_transport};
pub use runtime::emit_runtime;
pub use types::{check_supported, emit_struct, rust_type};
