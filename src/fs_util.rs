use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::FromfileError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn file_size(path: &Path) -> Result<u64, FromfileError> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|err| FromfileError::Filesystem(format!("stat {}: {err}", path.display())))
}

/// One filename per line; blank lines are skipped.
pub fn read_file_list(path: &Path) -> Result<Vec<String>, FromfileError> {
    let content = fs::read_to_string(path)
        .map_err(|err| FromfileError::Filesystem(format!("read {}: {err}", path.display())))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Opens a file, transparently decompressing gzip content.
pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, FromfileError> {
    let open_err =
        |err: io::Error| FromfileError::Filesystem(format!("open {}: {err}", path.display()));
    let mut file = File::open(path).map_err(open_err)?;
    let mut magic = [0u8; 2];
    let n = file.read(&mut magic).map_err(open_err)?;
    let file = File::open(path).map_err(open_err)?;
    if n == 2 && magic == GZIP_MAGIC {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Text of the first FASTA header line, without the leading `>`.
pub fn first_header(path: &Path) -> Result<Option<String>, FromfileError> {
    let reader = open_maybe_gz(path)?;
    for line in reader.lines() {
        let line = line
            .map_err(|err| FromfileError::Filesystem(format!("read {}: {err}", path.display())))?;
        if let Some(header) = line.strip_prefix('>') {
            return Ok(Some(header.trim().to_string()));
        }
    }
    Ok(None)
}
