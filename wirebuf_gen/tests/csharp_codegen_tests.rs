/* C# Code Generation Tests
 *
 * Golden substring checks over complete generated C# files for the ping
 * scenario and a schema exercising every wire strategy.
 */

use std::path::Path;
use wirebuf_gen::codegen::CodeGenerator;
use wirebuf_gen::codegen::csharp::{CSharpCodeGenerator, CSharpCodeGeneratorOptions};
use wirebuf_gen::loader::load_file;
use wirebuf_gen::types::{Document, Field, Kind, StructDef, TypeDescriptor};

fn fixture(name: &str) -> Document {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    load_file(&path, None).expect("fixture should load")
}

fn generate(doc: &Document) -> String {
    CSharpCodeGenerator::new(CSharpCodeGeneratorOptions::default())
        .generate(doc)
        .expect("generation should succeed")
}

#[test]
fn test_ping_module_layout() {
    let code = generate(&fixture("module1.json"));

    assert!(code.starts_with("using System;\nusing System.Collections.Generic;\nusing System.Text;\n"));
    assert!(code.contains("namespace FastNet {\n\tclass Module1 {\n"));
    assert!(code.contains("\t\tprivate FastClient client;\n"));
    assert!(code.contains("\t\tpublic enum MessageID : byte {\n\t\t\tMsgID_Ping = 0,\n\t\t}\n"));

    /* The marker struct gets neither a class nor an enum entry */
    assert!(!code.contains("public class Module1"));
    assert!(!code.contains("MsgID_Module1"));
}

#[test]
fn test_ping_dispatch_scaffold() {
    let code = generate(&fixture("module1.json"));

    assert!(code.contains("public delegate void PingRspHandler(PingRsp pingRsp);"));
    assert!(code.contains("public PingRspHandler pingRspHandle;"));
    assert!(code.contains(
        "this.client.registHandle((byte)ServiceID.ServiceID_Module1, (byte)MessageID.MsgID_Ping, this.handlePingRsp);"
    ));
    assert!(code.contains("public void handlePingRsp(byte[] content) {"));
    assert!(code.contains("pingRsp.Unmarshal(content, 0);"));
    assert!(code.contains("if (pingRspHandle != null) {"));

    assert!(code.contains("public void SendPingReq(PingReq pingReq) {"));
    assert!(code.contains("byte[] b = new byte[pingReq.Size()];"));
    assert!(code.contains("client.Send((byte)ServiceID.ServiceID_Module1, (byte)MessageID.MsgID_Ping, b);"));

    /* Requests are never registered, responses are never sent */
    assert!(!code.contains("this.handlePingReq"));
    assert!(!code.contains("SendPingRsp"));
}

#[test]
fn test_ping_codecs() {
    let code = generate(&fixture("module1.json"));

    assert!(code.contains("public class PingRsp {"));
    assert!(code.contains("public int Seq;"));
    assert!(code.contains("public bool Ok;"));
    assert!(code.contains("n = PutInt32(b, n, this.Seq);"));
    assert!(code.contains("n = PutBool(b, n, this.Ok);"));
    assert!(code.contains("this.Seq = GetInt32(b, ref n);"));
    assert!(code.contains("this.Ok = GetBool(b, ref n);"));
    assert!(code.contains("public int Size() {"));
    assert!(code.contains("public int Marshal(byte[] b, int n) {"));
    assert!(code.contains("public int Unmarshal(byte[] b, int n) {"));
}

#[test]
fn test_runtime_helpers_present_once() {
    let code = generate(&fixture("module1.json"));
    assert_eq!(code.matches("class OutOfBoundsException").count(), 1);
    assert_eq!(code.matches("public static int GetCount(byte[] b, ref int n) {").count(), 1);
}

#[test]
fn test_every_wire_strategy() {
    let code = generate(&fixture("inventory.yaml"));

    /* Field declarations and initializers */
    assert!(code.contains("public Nullable<float> Weight;"));
    assert!(code.contains("public ushort[] Slots = new ushort[3];"));
    assert!(code.contains("public List<Item> Items = new List<Item>();"));
    assert!(code.contains("public Dictionary<string, long> Counts = new Dictionary<string, long>();"));
    assert!(code.contains("public byte[] Digest = new byte[8];"));
    assert!(code.contains("public byte[] Blob;"));
    assert!(code.contains("public Item Best = new Item();"));
    assert!(code.contains("public List<sbyte>[] Grid = new List<sbyte>[2];"));
    assert!(code.contains("public Nullable<ulong> Quantity;"));

    /* Size */
    assert!(code.contains("size += StringSize(this.Label);"));
    assert!(code.contains("if (this.Weight.HasValue) {"));
    assert!(code.contains("size += 6;"));
    assert!(code.contains("size += BytesSize(this.Blob);"));
    assert!(code.contains("size += this.Best.Size();"));

    /* Marshal */
    assert!(code.contains("n = PutCount(b, n, this.Items.Count);"));
    assert!(code.contains("n = PutBlock(b, n, this.Digest, 8);"));
    assert!(code.contains("n = PutBytes(b, n, this.Blob);"));
    assert!(code.contains("n = PutFloat32(b, n, this.Weight.Value);"));
    assert!(code.contains("n = this.Item.Marshal(b, n);"));

    /* Unmarshal */
    assert!(code.contains("this.Digest = GetBlock(b, ref n, 8);"));
    assert!(code.contains("this.Blob = GetBytes(b, ref n);"));
    assert!(code.contains("this.Weight = null;"));
    assert!(code.contains("this.Best = new Item();"));
    assert!(code.contains("n = this.Best.Unmarshal(b, n);"));
}

#[test]
fn test_message_ids_follow_first_declaration() {
    let code = generate(&fixture("inventory.yaml"));
    assert!(code.contains("MsgID_Load = 0,"));
    assert!(code.contains("MsgID_Store = 1,"));
    assert!(!code.contains("MsgID_Item"));
}

#[test]
fn test_sibling_containers_do_not_share_locals() {
    let doc = Document::new(
        "pair",
        vec![StructDef::new(
            "TwoLists",
            vec![
                Field::new("A", TypeDescriptor::array(TypeDescriptor::new(Kind::Int32), 0)),
                Field::new("B", TypeDescriptor::array(TypeDescriptor::new(Kind::Int32), 0)),
            ],
        )],
    );
    let code = generate(&doc);
    assert!(code.contains("int count0 = GetElementCount(b, ref n, 4);"));
    assert!(code.contains("int count4 = GetElementCount(b, ref n, 4);"));
    assert!(code.contains("this.A = list1;"));
    assert!(code.contains("this.B = list5;"));
}

#[test]
fn test_custom_namespace_and_client() {
    let options = CSharpCodeGeneratorOptions {
        namespace: "Game.Net".to_string(),
        client_type: "TcpClient".to_string(),
        ..CSharpCodeGeneratorOptions::default()
    };
    let code = CSharpCodeGenerator::new(options)
        .generate(&fixture("module1.json"))
        .unwrap();
    assert!(code.contains("namespace Game.Net {"));
    assert!(code.contains("public Module1(TcpClient c) {"));
}
