use crate::codegen::shared::code::CodeNode;
use crate::codegen::shared::messages::MessageCatalog;
use crate::codegen::shared::naming::title;

use super::helpers::method_suffix;
use super::runtime::raw_lines;

const TRANSPORT: &str = r#"/// Network client the generated dispatch layer talks to.
pub trait Transport {
    fn register(
        &mut self,
        service_id: u8,
        message_id: u8,
        handler: Box<dyn FnMut(&[u8]) -> Result<(), CodecError>>,
    );
    fn send(&mut self, service_id: u8, message_id: u8, payload: Vec<u8>);
}"#;

pub fn emit_message_enum(catalog: &MessageCatalog) -> Vec<CodeNode> {
    let variants = catalog
        .ids
        .iter()
        .map(|(name, id)| CodeNode::line(format!("{} = {},", name, id)))
        .collect();
    let mut out = Vec::new();
    /* repr is rejected on an empty enum */
    if !catalog.ids.is_empty() {
        out.push(CodeNode::line("#[repr(u8)]"));
    }
    out.push(CodeNode::line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]"));
    out.push(CodeNode::block("pub enum MessageId", variants));
    out
}

/* Service ID constant, resolved against the collaborator in the parent module */
pub fn emit_service_id(catalog: &MessageCatalog) -> CodeNode {
    CodeNode::line(format!(
        "pub const SERVICE_ID: u8 = super::{} as u8;",
        catalog.service_id_name()
    ))
}

/* Local trait, or a re-export of an external one */
pub fn emit_transport(transport_path: Option<&str>) -> Vec<CodeNode> {
    match transport_path {
        Some(path) => vec![CodeNode::line(format!("pub use {} as Transport;", path))],
        None => raw_lines(TRANSPORT),
    }
}

/* Handler slots plus one decode-and-dispatch routine per response */
pub fn emit_handlers(catalog: &MessageCatalog) -> Vec<CodeNode> {
    let slots = catalog
        .responses
        .iter()
        .map(|rsp| {
            CodeNode::line(format!(
                "{}: RefCell<Option<Box<dyn FnMut({})>>>,",
                method_suffix(&rsp.struct_name),
                rsp.struct_name
            ))
        })
        .collect();

    let routines = catalog
        .responses
        .iter()
        .map(|rsp| {
            let var = method_suffix(&rsp.struct_name);
            CodeNode::block(
                format!(
                    "pub fn handle_{}(&self, content: &[u8]) -> Result<(), CodecError>",
                    var
                ),
                vec![
                    CodeNode::line(format!("let mut {} = {}::default();", var, rsp.struct_name)),
                    CodeNode::line(format!("{}.unmarshal(content, 0)?;", var)),
                    /* The slot is released while the handler runs, so it may re-register */
                    CodeNode::line(format!("let taken = self.{}.borrow_mut().take();", var)),
                    CodeNode::block(
                        "if let Some(mut handler) = taken",
                        vec![
                            CodeNode::line(format!("handler({});", var)),
                            CodeNode::line(format!("let mut slot = self.{}.borrow_mut();", var)),
                            CodeNode::block("if slot.is_none()", vec![CodeNode::line("*slot = Some(handler);")]),
                        ],
                    ),
                    CodeNode::line("Ok(())"),
                ],
            )
        })
        .collect();

    vec![
        CodeNode::line("#[derive(Default)]"),
        CodeNode::block("pub struct Handlers", slots),
        CodeNode::Blank,
        CodeNode::block("impl Handlers", routines),
    ]
}

/* `<Package><T: Transport>` with new/on_<rsp>/send_<req> */
pub fn emit_client(catalog: &MessageCatalog) -> Vec<CodeNode> {
    let client = title(&catalog.package);

    let mut new_body = vec![CodeNode::line("let handlers = Rc::new(Handlers::default());")];
    for rsp in &catalog.responses {
        let var = method_suffix(&rsp.struct_name);
        new_body.push(CodeNode::Block {
            header: "{".to_string(),
            body: vec![
                CodeNode::line("let handlers = Rc::clone(&handlers);"),
                CodeNode::line("transport.register("),
                CodeNode::line("    SERVICE_ID,"),
                CodeNode::line(format!("    MessageId::{} as u8,", rsp.logical_name)),
                CodeNode::line(format!(
                    "    Box::new(move |content: &[u8]| handlers.handle_{}(content)),",
                    var
                )),
                CodeNode::line(");"),
            ],
            close: "}".to_string(),
        });
    }
    new_body.push(CodeNode::line("Self { transport, handlers }"));

    let mut methods = vec![
        CodeNode::block(
            format!(
                "pub fn new({}transport: T) -> Self",
                if catalog.responses.is_empty() { "" } else { "mut " }
            ),
            new_body,
        ),
        CodeNode::Blank,
        CodeNode::block(
            "pub fn transport(&self) -> &T",
            vec![CodeNode::line("&self.transport")],
        ),
        CodeNode::Blank,
        CodeNode::block(
            "pub fn transport_mut(&mut self) -> &mut T",
            vec![CodeNode::line("&mut self.transport")],
        ),
    ];

    for rsp in &catalog.responses {
        let var = method_suffix(&rsp.struct_name);
        methods.push(CodeNode::Blank);
        methods.push(CodeNode::block(
            format!(
                "pub fn on_{}(&self, handler: impl FnMut({}) + 'static)",
                var, rsp.struct_name
            ),
            vec![CodeNode::line(format!(
                "*self.handlers.{}.borrow_mut() = Some(Box::new(handler));",
                var
            ))],
        ));
    }

    for req in &catalog.requests {
        let var = method_suffix(&req.struct_name);
        methods.push(CodeNode::Blank);
        methods.push(CodeNode::block(
            format!("pub fn send_{var}(&mut self, {var}: &{})", req.struct_name, var = var),
            vec![
                CodeNode::line(format!("let mut b = vec![0u8; {}.size()];", var)),
                CodeNode::line(format!("{}.marshal(&mut b, 0);", var)),
                CodeNode::line(format!(
                    "self.transport.send(SERVICE_ID, MessageId::{} as u8, b);",
                    req.logical_name
                )),
            ],
        ));
    }

    vec![
        CodeNode::block(
            format!("pub struct {}<T: Transport>", client),
            vec![
                CodeNode::line("transport: T,"),
                CodeNode::line("handlers: Rc<Handlers>,"),
            ],
        ),
        CodeNode::Blank,
        CodeNode::block(format!("impl<T: Transport> {}<T>", client), methods),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::code::render;
    use crate::codegen::shared::messages::MessageIdAllocator;
    use wirebuf_types::{Document, Field, Kind, StructDef};

    fn catalog() -> MessageCatalog {
        let doc = Document::new(
            "module1",
            vec![
                StructDef::new("PingReq", vec![Field::new("Seq", Kind::Int32)]),
                StructDef::new("PingRsp", vec![Field::new("Seq", Kind::Int32)]),
            ],
        );
        MessageCatalog::build(&doc, &mut MessageIdAllocator::new())
    }

    #[test]
    fn client_registers_and_sends() {
        let text = render(&emit_client(&catalog()), "    ").unwrap();
        assert!(text.contains("pub struct Module1<T: Transport> {"));
        assert!(text.contains("pub fn new(mut transport: T) -> Self {"));
        assert!(text.contains("MessageId::Ping as u8,"));
        assert!(text.contains("handlers.handle_ping_rsp(content)"));
        assert!(text.contains("pub fn on_ping_rsp(&self, handler: impl FnMut(PingRsp) + 'static) {"));
        assert!(text.contains("pub fn send_ping_req(&mut self, ping_req: &PingReq) {"));
        assert!(text.contains("self.transport.send(SERVICE_ID, MessageId::Ping as u8, b);"));
    }

    #[test]
    fn handler_slot_is_released_during_dispatch() {
        let text = render(&emit_handlers(&catalog()), "    ").unwrap();
        assert!(text.contains("    ping_rsp: RefCell<Option<Box<dyn FnMut(PingRsp)>>>,"));
        let take = text.find("let taken = self.ping_rsp.borrow_mut().take();").expect("take");
        let call = text.find("        handler(ping_rsp);").expect("call");
        let restore = text.find("            *slot = Some(handler);").expect("restore");
        assert!(take < call && call < restore);
        assert!(text.contains("        if slot.is_none() {"));
        assert!(!text.contains(".as_mut()"));
    }

    #[test]
    fn enum_and_service_id() {
        let cat = catalog();
        let text = render(&emit_message_enum(&cat), "    ").unwrap();
        assert!(text.contains("#[repr(u8)]"));
        assert!(text.contains("    Ping = 0,"));
        let line = render(&[emit_service_id(&cat)], "    ").unwrap();
        assert_eq!(line, "pub const SERVICE_ID: u8 = super::ServiceID_Module1 as u8;\n");
    }

    #[test]
    fn external_transport_is_reexported() {
        let text = render(&emit_transport(Some("crate::net::Client")), "    ").unwrap();
        assert_eq!(text, "pub use crate::net::Client as Transport;\n");
        let local = render(&emit_transport(None), "    ").unwrap();
        assert!(local.contains("pub trait Transport {"));
    }
}
