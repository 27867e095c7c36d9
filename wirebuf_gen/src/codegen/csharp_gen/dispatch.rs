/* Message ID enum and the handler/send scaffold of the generated C# class */

use crate::codegen::csharp::CSharpCodeGeneratorOptions;
use crate::codegen::shared::code::CodeNode;
use crate::codegen::shared::messages::MessageCatalog;
use crate::codegen::shared::naming::{lc_first, title};

pub fn emit_message_enum(catalog: &MessageCatalog) -> CodeNode {
    let body = catalog
        .ids
        .iter()
        .map(|(name, id)| CodeNode::line(format!("MsgID_{} = {},", name, id)))
        .collect();
    CodeNode::block("public enum MessageID : byte", body)
}

fn route(catalog: &MessageCatalog, logical_name: &str) -> String {
    format!(
        "(byte)ServiceID.{}, (byte)MessageID.MsgID_{}",
        catalog.service_id_name(),
        logical_name
    )
}

/* Delegate type plus mutable handler slot per response */
pub fn emit_handler_slots(catalog: &MessageCatalog) -> Vec<CodeNode> {
    catalog
        .responses
        .iter()
        .flat_map(|rsp| {
            let var = lc_first(&rsp.struct_name);
            [
                CodeNode::line(format!(
                    "public delegate void {name}Handler({name} {var});",
                    name = rsp.struct_name,
                    var = var
                )),
                CodeNode::line(format!("public {}Handler {}Handle;", rsp.struct_name, var)),
            ]
        })
        .collect()
}

pub fn emit_constructor(
    catalog: &MessageCatalog,
    options: &CSharpCodeGeneratorOptions,
) -> CodeNode {
    let mut body = vec![CodeNode::line("this.client = c;")];
    body.extend(catalog.responses.iter().map(|rsp| {
        CodeNode::line(format!(
            "this.client.{}({}, this.handle{});",
            options.register_method,
            route(catalog, &rsp.logical_name),
            rsp.struct_name
        ))
    }));
    CodeNode::block(
        format!("public {}({} c)", title(&catalog.package), options.client_type),
        body,
    )
}

/* Decode-and-dispatch routine per response */
pub fn emit_handlers(catalog: &MessageCatalog) -> Vec<CodeNode> {
    catalog
        .responses
        .iter()
        .map(|rsp| {
            let var = lc_first(&rsp.struct_name);
            CodeNode::block(
                format!("public void handle{}(byte[] content)", rsp.struct_name),
                vec![
                    CodeNode::line(format!(
                        "{name} {var} = new {name}();",
                        name = rsp.struct_name,
                        var = var
                    )),
                    CodeNode::line(format!("{}.Unmarshal(content, 0);", var)),
                    CodeNode::block(
                        format!("if ({}Handle != null)", var),
                        vec![CodeNode::line(format!("{var}Handle({var});", var = var))],
                    ),
                ],
            )
        })
        .collect()
}

/* Size, allocate, marshal, send per request */
pub fn emit_senders(catalog: &MessageCatalog, options: &CSharpCodeGeneratorOptions) -> Vec<CodeNode> {
    catalog
        .requests
        .iter()
        .map(|req| {
            let var = lc_first(&req.struct_name);
            CodeNode::block(
                format!(
                    "public void Send{name}({name} {var})",
                    name = req.struct_name,
                    var = var
                ),
                vec![
                    CodeNode::line(format!("byte[] b = new byte[{}.Size()];", var)),
                    CodeNode::line(format!("{}.Marshal(b, 0);", var)),
                    CodeNode::line(format!(
                        "client.{}({}, b);",
                        options.send_method,
                        route(catalog, &req.logical_name)
                    )),
                ],
            )
        })
        .collect()
}
