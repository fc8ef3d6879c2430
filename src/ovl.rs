//! Reader for condensed overlap dumps, one overlap per line:
//!
//! ```text
//!  aIID  bIID  aHang  bHang  orient  pctError
//!     1     2     50     60  N        1.25
//! ```
//!
//! and for the matching read length tables (`iid length`). Each
//! overlap is normalized and turned into an `OverlapRecord` with
//! `OverlapRecord::from_hangs`.

use std::io::BufRead;

use bstr::io::BufReadExt;
use bstr::ByteSlice;
use log::warn;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{digit1, space0, space1},
    combinator::{map, map_res, opt, recognize},
    number::complete::double,
    sequence::{pair, preceded},
    IResult,
};

use crate::error::{BogError, BogResult};
use crate::overlap::OverlapRecord;
use crate::read::ReadId;

/// Relative orientation of the two reads, as written in the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orient {
    /// `N`: both forward
    Normal,
    /// `A`: both reverse
    Anti,
    /// `I`: B reversed, 3' ends facing
    Innie,
    /// `O`: B reversed, 5' ends facing
    Outtie,
}

impl Orient {
    fn parse(i: &[u8]) -> IResult<&[u8], Orient> {
        use Orient::*;

        alt((
            map(tag("N"), |_| Normal),
            map(tag("A"), |_| Anti),
            map(tag("I"), |_| Innie),
            map(tag("O"), |_| Outtie),
        ))(i)
    }

    /// Whether B aligns reverse-complemented once the record is
    /// rewritten with A forward.
    pub fn is_flipped(&self) -> bool {
        matches!(self, Orient::Innie | Orient::Outtie)
    }
}

/// One parsed line of an overlap dump, hangs as written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OvlLine {
    pub a: ReadId,
    pub b: ReadId,
    pub a_hang: i32,
    pub b_hang: i32,
    pub orient: Orient,
    /// Percent error, 0 to 100
    pub pct_error: f64,
}

fn parse_u32(i: &[u8]) -> IResult<&[u8], u32> {
    map_res(map_res(digit1, std::str::from_utf8), |s: &str| {
        s.parse::<u32>()
    })(i)
}

fn parse_i32(i: &[u8]) -> IResult<&[u8], i32> {
    let signed = recognize(pair(opt(alt((tag("-"), tag("+")))), digit1));
    map_res(map_res(signed, std::str::from_utf8), |s: &str| {
        s.parse::<i32>()
    })(i)
}

impl OvlLine {
    fn parse_fields(i: &[u8]) -> IResult<&[u8], OvlLine> {
        let (i, _) = space0(i)?;
        let (i, a) = parse_u32(i)?;
        let (i, b) = preceded(space1, parse_u32)(i)?;
        let (i, a_hang) = preceded(space1, parse_i32)(i)?;
        let (i, b_hang) = preceded(space1, parse_i32)(i)?;
        let (i, orient) = preceded(space1, Orient::parse)(i)?;
        let (i, pct_error) = preceded(space1, double)(i)?;
        let (i, _) = space0(i)?;

        Ok((
            i,
            OvlLine {
                a: ReadId(a),
                b: ReadId(b),
                a_hang,
                b_hang,
                orient,
                pct_error,
            },
        ))
    }

    pub fn parse(line: &[u8]) -> BogResult<OvlLine> {
        let line = line.trim_end_with(|c| c.is_ascii_whitespace());
        match Self::parse_fields(line) {
            Ok((rest, ovl)) if rest.is_empty() => {
                if !(0.0..=100.0).contains(&ovl.pct_error) {
                    return Err(BogError::invalid_line(line, "error percentage out of range"));
                }
                if ovl.normalized().is_none() {
                    return Err(BogError::invalid_line(line, "hang out of range"));
                }
                Ok(ovl)
            }
            Ok(_) => Err(BogError::invalid_line(line, "trailing characters")),
            Err(_) => Err(BogError::invalid_line(line, "expected 'aIID bIID aHang bHang orient pctError'")),
        }
    }

    /// Hangs and flip with A forward. Anti and outtie overlaps are
    /// the reverse of a normal and an innie one, which swaps and
    /// negates the hangs. `None` when a hang has no negation.
    pub fn normalized(&self) -> Option<(i32, i32, bool)> {
        let flipped = self.orient.is_flipped();
        match self.orient {
            Orient::Normal | Orient::Innie => Some((self.a_hang, self.b_hang, flipped)),
            Orient::Anti | Orient::Outtie => {
                Some((self.b_hang.checked_neg()?, self.a_hang.checked_neg()?, flipped))
            }
        }
    }

    pub fn erate(&self) -> f64 {
        self.pct_error / 100.0
    }

    /// `None` if either read has no known length, or the hangs can't
    /// be normalized.
    pub fn to_record(&self, lengths: &ReadLengths) -> Option<OverlapRecord> {
        let a_len = lengths.get(self.a)?;
        let b_len = lengths.get(self.b)?;
        let (a_hang, b_hang, flipped) = self.normalized()?;
        Some(OverlapRecord::from_hangs(
            self.a,
            self.b,
            a_hang,
            b_hang,
            flipped,
            self.erate(),
            a_len,
            b_len,
        ))
    }
}

/// Read lengths by id, standing in for the read store. Ids are
/// 1-based; unknown ids have no length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadLengths {
    lengths: Vec<u32>,
}

impl ReadLengths {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert(&mut self, id: ReadId, length: u32) {
        if id.is_none() {
            return;
        }
        if id.index() >= self.lengths.len() {
            self.lengths.resize(id.index() + 1, 0);
        }
        self.lengths[id.index()] = length;
    }

    pub fn get(&self, id: ReadId) -> Option<u32> {
        match self.lengths.get(id.index()) {
            Some(&len) if !id.is_none() && len > 0 => Some(len),
            _ => None,
        }
    }

    /// The highest id with a length.
    pub fn num_reads(&self) -> u32 {
        self.lengths
            .iter()
            .rposition(|&len| len > 0)
            .unwrap_or(0) as u32
    }

    fn parse_line(i: &[u8]) -> IResult<&[u8], (u32, u32)> {
        let (i, _) = space0(i)?;
        let (i, id) = parse_u32(i)?;
        let (i, len) = preceded(space1, parse_u32)(i)?;
        let (i, _) = space0(i)?;
        Ok((i, (id, len)))
    }

    /// Parse one `iid length` line.
    pub fn parse_entry(line: &[u8]) -> BogResult<(ReadId, u32)> {
        let line = line.trim_end_with(|c| c.is_ascii_whitespace());
        match Self::parse_line(line) {
            Ok((rest, (id, len))) if rest.is_empty() && id > 0 => Ok((ReadId(id), len)),
            Ok((rest, _)) if !rest.is_empty() => Err(BogError::invalid_line(line, "trailing characters")),
            Ok(_) => Err(BogError::invalid_line(line, "read ids start at 1")),
            Err(_) => Err(BogError::invalid_line(line, "expected 'iid length'")),
        }
    }

    /// Blank lines and `#` comments are ignored, bad lines are skipped
    /// with a warning.
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut lengths = ReadLengths::new();
        for line in lines.into_iter().filter(|l| !is_ignored(l)) {
            match Self::parse_entry(line) {
                Ok((id, len)) => lengths.insert(id, len),
                Err(err) => warn!("skipping read length: {}", err),
            }
        }
        lengths
    }

    pub fn from_reader<R: BufRead>(reader: R) -> BogResult<Self> {
        let mut lines = Vec::new();
        for line in reader.byte_lines() {
            lines.push(line?);
        }
        Ok(Self::from_lines(lines.iter().map(|l| l.as_slice())))
    }
}

fn is_ignored(line: &[u8]) -> bool {
    let line = line.trim_with(|c| c.is_ascii_whitespace());
    line.is_empty() || line.starts_with(b"#")
}

/// Turn overlap dump lines into records. Lines that fail to parse, or
/// that name a read without a length, are skipped with a warning.
pub fn parse_overlaps<'a, I>(
    lines: I,
    lengths: &'a ReadLengths,
) -> impl Iterator<Item = OverlapRecord> + 'a
where
    I: IntoIterator<Item = &'a [u8]>,
    I::IntoIter: 'a,
{
    lines
        .into_iter()
        .filter(|l| !is_ignored(l))
        .filter_map(move |line| match OvlLine::parse(line) {
            Ok(ovl) => {
                let record = ovl.to_record(lengths);
                if record.is_none() {
                    warn!("skipping overlap {} {}: unknown read length", ovl.a, ovl.b);
                }
                record
            }
            Err(err) => {
                warn!("skipping overlap: {}", err);
                None
            }
        })
}
