pub mod builder;
pub mod code;
pub mod ir;
pub mod ir_proto;
pub mod layout;
pub mod messages;
pub mod naming;
pub mod serialization;
