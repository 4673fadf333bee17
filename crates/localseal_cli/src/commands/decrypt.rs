//! Decrypt command implementation.

use localseal_core::StreamCipherCodec;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

/// Runs the decrypt command.
///
/// Plaintext is written to a temporary file next to `output` and renamed
/// into place only after authentication succeeds.
pub fn run(
    codec: &StreamCipherCodec,
    input: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(input)?);
    let mut stream = codec.wrap_decrypt(reader).map_err(|e| {
        if e.is_corrupt_header() {
            format!("{} is not a LocalSeal stream: {e}", input.display())
        } else {
            e.to_string()
        }
    })?;

    let mut tmp_name = output.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let copied = match write_plaintext(&mut stream, tmp_path) {
        Ok(copied) => copied,
        Err(e) => {
            let _ = fs::remove_file(tmp_path);
            if e.kind() == io::ErrorKind::InvalidData {
                return Err(format!("{} failed authentication: {e}", input.display()).into());
            }
            return Err(e.into());
        }
    };
    fs::rename(tmp_path, output)?;

    println!("Decrypted {} bytes to {}", copied, output.display());
    Ok(())
}

fn write_plaintext<R: Read>(stream: &mut R, path: &Path) -> io::Result<u64> {
    let mut file = File::create(path)?;
    let copied = io::copy(stream, &mut file)?;
    file.flush()?;
    file.sync_all()?;
    Ok(copied)
}
