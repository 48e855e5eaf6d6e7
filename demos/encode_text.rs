use huffpack::{CodeTable, Decoder, Encoder, FrequencyTable, HuffmanTree};

fn main() -> huffpack::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let s = String::from("Hello my name is Sam!");
    let table = FrequencyTable::from_bytes(s.as_bytes());
    let tree = HuffmanTree::build(&table)?;
    let codes = CodeTable::derive(&tree);
    print!("{}", codes);

    let out = Encoder::new(codes).encode(s.bytes())?;
    let dec = Decoder::new(&table)?.decode(&out)?;

    println!("{} bits: {:?}", out.len(), String::from_utf8(dec));
    Ok(())
}
