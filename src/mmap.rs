use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use bstr::ByteSlice;
use memmap::Mmap;

use crate::overlap::OverlapRecord;
use crate::ovl::{parse_overlaps, ReadLengths};

/// A memory mapped overlap dump. Iterating doesn't consume anything,
/// so the same file can feed construction and a later containment
/// rebuild.
pub struct MmapOverlaps {
    mmap: Option<Mmap>,
}

impl MmapOverlaps {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open overlaps {}", path.display()))?;
        let len = file.metadata()?.len();

        // an empty file can't be mapped
        let mmap = if len == 0 {
            None
        } else {
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self { mmap })
    }

    pub fn get_ref(&self) -> &[u8] {
        match &self.mmap {
            Some(mmap) => mmap.as_ref(),
            None => &[],
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.get_ref().lines()
    }

    pub fn records<'a>(
        &'a self,
        lengths: &'a ReadLengths,
    ) -> impl Iterator<Item = OverlapRecord> + 'a {
        parse_overlaps(self.lines(), lengths)
    }
}

/// Load a read length table, failing if it names no reads at all.
pub fn load_read_lengths<P: AsRef<Path>>(path: P) -> Result<ReadLengths> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open read lengths {}", path.display()))?;
    let lengths = ReadLengths::from_reader(std::io::BufReader::new(file))?;

    if lengths.num_reads() == 0 {
        bail!("No read lengths found in {}", path.display());
    }

    Ok(lengths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::read::ReadId;

    fn temp_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn records_can_be_read_twice() {
        let lens = temp_file("1 200\n2 210\n3 100\n");
        let ovls = temp_file("1 2 50 60 N 1.00\n1 3 20 -80 N 0.50\n");

        let lengths = load_read_lengths(lens.path()).unwrap();
        assert_eq!(3, lengths.num_reads());

        let mmap = MmapOverlaps::open(ovls.path()).unwrap();
        let first: Vec<OverlapRecord> = mmap.records(&lengths).collect();
        let second: Vec<OverlapRecord> = mmap.records(&lengths).collect();
        assert_eq!(2, first.len());
        assert_eq!(first, second);
        assert_eq!(Some(ReadId(3)), first[1].containee());
    }

    #[test]
    fn empty_overlap_file() {
        let ovls = temp_file("");
        let mmap = MmapOverlaps::open(ovls.path()).unwrap();
        assert_eq!(0, mmap.lines().count());
    }

    #[test]
    fn missing_or_empty_inputs_fail() {
        assert!(MmapOverlaps::open("/nonexistent/overlaps.ovl").is_err());
        let lens = temp_file("# nothing here\n");
        assert!(load_read_lengths(lens.path()).is_err());
    }
}
