//! Code generation for wirebuf message schemas.
//!
//! A schema [`Document`](wirebuf_types::Document) is loaded and validated by
//! [`loader`], every field type is classified into a wire layout by
//! [`codegen::shared::layout`], the size/marshal/unmarshal emitters in
//! [`codegen::shared::builder`] turn those layouts into a language-agnostic
//! codec IR, and a back-end ([`codegen::csharp`], [`codegen::rust`]) renders
//! the IR plus the message dispatch scaffold into source text.

pub mod cmds;
pub mod codegen;
pub mod loader;

pub use wirebuf_types as types;
