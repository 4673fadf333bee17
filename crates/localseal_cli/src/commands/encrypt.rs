//! Encrypt command implementation.

use localseal_core::StreamCipherCodec;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::Path;

/// Runs the encrypt command.
///
/// Ciphertext is written to a temporary file next to `output` and renamed
/// into place only after the stream has been finished. On any failure no
/// output file is left behind.
pub fn run(
    codec: &StreamCipherCodec,
    input: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(input)?);

    let mut tmp_name = output.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let (copied, passthrough) = match write_sealed(codec, reader, tmp_path) {
        Ok(result) => result,
        Err(e) => {
            let _ = fs::remove_file(tmp_path);
            return Err(e);
        }
    };
    fs::rename(tmp_path, output)?;

    if passthrough {
        println!(
            "Platform level {} has no local encryption support; copied {} bytes unencrypted",
            codec.keys().host().platform_level,
            copied
        );
    } else {
        println!("Encrypted {} bytes to {}", copied, output.display());
    }
    Ok(())
}

fn write_sealed<R: Read>(
    codec: &StreamCipherCodec,
    mut source: R,
    path: &Path,
) -> Result<(u64, bool), Box<dyn std::error::Error>> {
    let writer = BufWriter::new(File::create(path)?);
    let mut stream = codec.wrap_encrypt(writer)?;
    let passthrough = stream.is_passthrough();
    let copied = io::copy(&mut source, &mut stream)?;
    let writer = stream.finish()?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok((copied, passthrough))
}
