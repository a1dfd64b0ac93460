//! Arrival records and the sources they are read from.
//!
//! Arrivals are produced outside the simulation, one record per line in the form
//! `PLATE:ROAD:LANE`, for example `AB1CD234:C:1`. `ROAD` is one of the approach
//! labels `A` to `D` and `LANE` is the lane index `0` to `2`.

use crate::error::{SimError, SimResult};
use crate::geometry::{Approach, LaneRole};
use itertools::Itertools;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// The longest plate accepted from the feed.
const MAX_PLATE_LEN: usize = 15;

/// A vehicle arriving at the intersection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrivalRecord {
    pub plate: String,
    pub approach: Approach,
    pub role: LaneRole,
}

/// A source of raw arrival lines.
pub trait ArrivalSource {
    /// Takes up to `limit` lines that arrived since the last poll, oldest first.
    fn poll(&mut self, limit: usize) -> SimResult<Vec<String>>;
}

/// Reads arrivals appended to a file by another process.
///
/// The source remembers how far it has read. If the file shrinks it is assumed to
/// have been truncated or rotated and is read again from the start. A missing file
/// yields no arrivals.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
    offset: u64,
}

/// Receives arrivals from another thread.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Receiver<String>,
}

impl ArrivalRecord {
    /// Creates a record.
    pub fn new(plate: impl Into<String>, approach: Approach, role: LaneRole) -> Self {
        Self {
            plate: plate.into(),
            approach,
            role,
        }
    }
}

impl FromStr for ArrivalRecord {
    type Err = SimError;

    fn from_str(line: &str) -> SimResult<Self> {
        let malformed = || SimError::MalformedArrival(line.to_owned());
        let (plate, road, lane) = line
            .trim()
            .split(':')
            .collect_tuple::<(&str, &str, &str)>()
            .ok_or_else(malformed)?;
        if plate.is_empty() || plate.chars().count() > MAX_PLATE_LEN {
            return Err(malformed());
        }
        let approach = road
            .chars()
            .exactly_one()
            .ok()
            .and_then(Approach::from_label)
            .ok_or_else(malformed)?;
        let role = lane
            .parse::<usize>()
            .ok()
            .and_then(LaneRole::from_index)
            .ok_or_else(malformed)?;
        Ok(Self::new(plate, approach, role))
    }
}

impl fmt::Display for ArrivalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.plate,
            self.approach.label(),
            self.role.index()
        )
    }
}

impl FileSource {
    /// Creates a source that reads the given file from the start.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_owned(),
            offset: 0,
        }
    }

    /// The number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl ArrivalSource for FileSource {
    fn poll(&mut self, limit: usize) -> SimResult<Vec<String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };
        if file.metadata()?.len() < self.offset {
            log::debug!("{} shrank, reading from the start", self.path.display());
            self.offset = 0;
        }

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(self.offset))?;
        let mut lines = vec![];
        let mut buf = vec![];
        while lines.len() < limit {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf)?;
            // A line without a newline is still being written.
            if read == 0 || buf.last() != Some(&b'\n') {
                break;
            }
            self.offset += read as u64;
            lines.push(String::from_utf8_lossy(&buf).trim_end().to_owned());
        }
        Ok(lines)
    }
}

impl ChannelSource {
    /// Creates a connected sender and source.
    pub fn channel() -> (Sender<String>, Self) {
        let (sender, receiver) = mpsc::channel();
        (sender, Self { receiver })
    }
}

impl ArrivalSource for ChannelSource {
    fn poll(&mut self, limit: usize) -> SimResult<Vec<String>> {
        let mut lines = vec![];
        while lines.len() < limit {
            match self.receiver.try_recv() {
                Ok(line) => lines.push(line),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        Ok(lines)
    }
}
