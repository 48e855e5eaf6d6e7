use std::env;
use std::fs;
use std::path::PathBuf;

use huffpack::CodecPaths;
use tracing::info;

fn main() -> huffpack::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let fp = PathBuf::from(
        env::args()
            .nth(1)
            .expect("Please provide path to input file as first argument."),
    );

    let encoded = fp.with_extension("huff");
    let freq = fp.with_extension("freq");
    let decoded = fp.with_extension("decoded");

    // encode - writes the packed bits and the frequency table
    CodecPaths::new(&fp, &encoded, &freq).encode()?;

    // decode - reads both back
    CodecPaths::new(&encoded, &decoded, &freq).decode()?;

    let before = fs::metadata(&fp)?.len();
    let after = fs::metadata(&encoded)?.len() + fs::metadata(&freq)?.len();
    info!(before, after, "wrote {}", decoded.display());

    Ok(())
}
