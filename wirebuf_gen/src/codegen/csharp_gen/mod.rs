pub mod codec;
pub mod dispatch;
pub mod helpers;
pub mod types;

/* Re-export main public functions */
pub use codec::{emit_marshal_fn, emit_size_fn, emit_unmarshal_fn};
pub use dispatch::{
    emit_constructor, emit_handler_slots, emit_handlers, emit_message_enum, emit_senders,
};
pub use helpers::emit_runtime_helpers;
pub use types::{emit_class, type_name};
